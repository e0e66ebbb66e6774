//! golinks CLI — command-line interface for the golinks gateway.
//!
//! Reuses the same domain logic (golinks-core) and server bootstrap
//! (golinks-server) that power the REST and browser surfaces.

mod commands;

use clap::{Parser, Subcommand};

/// golinks CLI — multi-protocol RPC gateway
#[derive(Parser)]
#[command(name = "golinks", version, about = "golinks CLI — multi-protocol RPC gateway")]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(long, env = "GOLINKS_DB_PATH", default_value = "golinks.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway (HTTP and native RPC listeners)
    Serve {
        /// Host to bind both listeners to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port for the HTTP surfaces (REST and browser framing)
        #[arg(long, default_value_t = 5231)]
        http_port: u16,
        /// Port for the native RPC listener
        #[arg(long, default_value_t = 5232)]
        rpc_port: u16,
        /// Path to a static frontend directory served at /
        #[arg(long)]
        static_dir: Option<String>,
        /// Allowed CORS origin, repeatable; none (or "*") allows any
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },

    /// Mint an access token and print the secret once
    Token {
        /// Username to mint for; defaults to the host admin
        #[arg(long)]
        username: Option<String>,
        /// Token description
        #[arg(long, default_value = "CLI token")]
        description: String,
        /// Days until expiry; omit for a token that never expires
        #[arg(long)]
        expires_in_days: Option<i64>,
    },

    /// List the methods a running gateway exposes
    Methods {
        /// Native RPC address of the gateway
        #[arg(long, env = "GOLINKS_RPC_ADDR", default_value = "127.0.0.1:5232")]
        addr: String,
    },

    /// Invoke one method on a running gateway over the native protocol
    Call {
        /// Full method name, e.g. "golinks.api.v1.ShortcutService/ListShortcuts"
        method: String,
        /// Request params as a JSON string
        #[arg(long, default_value = "{}")]
        params: String,
        /// Access token for protected methods
        #[arg(long, env = "GOLINKS_TOKEN")]
        token: Option<String>,
        /// Native RPC address of the gateway
        #[arg(long, env = "GOLINKS_RPC_ADDR", default_value = "127.0.0.1:5232")]
        addr: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `serve` hands tracing setup to the server; every other command gets
    // the CLI default here.
    if !matches!(cli.command, Commands::Serve { .. }) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "golinks_core=warn,golinks_server=warn".into()),
            )
            .init();
    }

    let result = match cli.command {
        Commands::Serve {
            host,
            http_port,
            rpc_port,
            static_dir,
            allowed_origins,
        } => {
            commands::serve::run(host, http_port, rpc_port, cli.db, static_dir, allowed_origins)
                .await
        }

        Commands::Token {
            username,
            description,
            expires_in_days,
        } => {
            let state = commands::init_state(&cli.db).await;
            commands::token::run(&state, username.as_deref(), &description, expires_in_days).await
        }

        Commands::Methods { addr } => commands::methods::run(&addr).await,

        Commands::Call {
            method,
            params,
            token,
            addr,
        } => commands::call::run(&addr, &method, &params, token.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
