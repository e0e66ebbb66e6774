//! golinks Server - Multi-Protocol RPC Gateway Backend
//!
//! A standalone Rust backend server for the golinks service, exposing one
//! RPC core over three wire surfaces:
//! - native length-prefixed RPC over TCP
//! - RESTful HTTP/JSON API via axum
//! - browser-framed RPC for restricted HTTP clients
//!
//! Every surface funnels into the same method registry, so authentication
//! and logging run exactly once per call regardless of encoding. The REST
//! translator reaches the core through a loopback native connection; the
//! browser adapter calls it in-process.

pub mod gateway;
pub mod native;
pub mod rpc;
pub mod services;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use golinks_core::db::Database;
use golinks_core::state::{AppState, AppStateInner};

use self::gateway::{build_router, LocalInvoker, RemoteInvoker};
use self::native::{start_native_server, NativeClient};
use self::rpc::{AuthInterceptor, LoggerInterceptor, RpcCore};

/// Username of the bootstrap admin account ensured at startup.
pub const DEFAULT_HOST_USERNAME: &str = "admin";

/// Configuration for the golinks backend server.
pub struct ServerConfig {
    pub host: String,
    /// Port for the HTTP surfaces (REST translator and browser framing).
    pub http_port: u16,
    /// Port for the native RPC listener.
    pub rpc_port: u16,
    pub db_path: String,
    /// Optional path to static frontend files.
    /// When set, the server serves these files for all non-API routes.
    pub static_dir: Option<String>,
    /// Origins allowed by CORS. Empty (or a `*` entry) allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            http_port: 5231,
            rpc_port: 5232,
            db_path: "golinks.db".to_string(),
            static_dir: None,
            allowed_origins: Vec::new(),
        }
    }
}

/// The addresses both listeners ended up bound to. Port 0 in the config
/// picks free ports, which the handles report back.
#[derive(Debug, Clone, Copy)]
pub struct ServerHandles {
    pub http_addr: SocketAddr,
    pub rpc_addr: SocketAddr,
}

/// Create a shared `AppState` from a database path.
///
/// This is useful when you need to share the state between the server and
/// other consumers (e.g. the token-minting CLI command, tests).
pub async fn create_app_state(db_path: &str) -> Result<AppState, String> {
    let db = Database::open(db_path).map_err(|e| format!("Failed to open database: {}", e))?;

    let state: AppState = Arc::new(AppStateInner::new(db));

    // Ensure the host admin account exists
    state
        .ensure_host_user(DEFAULT_HOST_USERNAME)
        .await
        .map_err(|e| format!("Failed to bootstrap host user: {}", e))?;

    Ok(state)
}

/// Start the golinks backend server.
///
/// Returns the actual addresses the listeners are bound to.
pub async fn start_server(config: ServerConfig) -> Result<ServerHandles, String> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "golinks_server=info,tower_http=info".into()),
        )
        .init();

    tracing::info!(
        "Starting golinks gateway on {} (http port {}, rpc port {})",
        config.host,
        config.http_port,
        config.rpc_port
    );

    let state = create_app_state(&config.db_path).await?;

    start_server_with_state(config, state).await
}

/// Start both listeners with a pre-built `AppState`.
///
/// This variant is useful when you want to share the state with other
/// consumers, or bind to port 0 in tests.
pub async fn start_server_with_state(
    config: ServerConfig,
    state: AppState,
) -> Result<ServerHandles, String> {
    // Expired tokens are swept in the background so verification stays a
    // plain hash lookup.
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(3600));
        loop {
            tick.tick().await;
            match sweeper.tokens.prune_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!(count = n, "Pruned expired access tokens"),
                Err(e) => tracing::warn!("Failed to prune expired tokens: {}", e),
            }
        }
    });

    // One registry behind every surface. Interceptor order is fixed: the
    // logger records auth rejections like any other outcome.
    let mut core = RpcCore::new()
        .with_interceptor(LoggerInterceptor)
        .with_interceptor(AuthInterceptor::new(state.auth.clone()));
    services::register_all(&mut core, state)?;
    let core = Arc::new(core);

    // Native listener first; the REST translator dials it over loopback so
    // REST traffic exercises the same wire path as external native callers.
    let rpc_addr = start_native_server(
        &format!("{}:{}", config.host, config.rpc_port),
        core.clone(),
    )
    .await?;

    let loopback = NativeClient::connect(rpc_addr)
        .await
        .map_err(|e| format!("Failed to dial native listener at {}: {}", rpc_addr, e))?;

    let registry = Arc::new(services::pattern_registry()?);
    let rest = gateway::rest::router(registry, Arc::new(RemoteInvoker::new(loopback)));
    let web = gateway::web::router(Arc::new(LocalInvoker::new(core)));

    let app = build_router(
        rest,
        web,
        config.static_dir.as_deref(),
        &config.allowed_origins,
    );

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.http_port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let http_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("golinks gateway listening on {}", http_addr);

    // Spawn the server in a background task
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandles {
        http_addr,
        rpc_addr,
    })
}
