//! `golinks serve` — Start the golinks gateway.

pub async fn run(
    host: String,
    http_port: u16,
    rpc_port: u16,
    db_path: String,
    static_dir: Option<String>,
    allowed_origins: Vec<String>,
) -> Result<(), String> {
    let config = golinks_server::ServerConfig {
        host,
        http_port,
        rpc_port,
        db_path,
        static_dir,
        allowed_origins,
    };

    println!(
        "Starting golinks gateway on {} (http {}, rpc {})...",
        config.host, config.http_port, config.rpc_port
    );

    let handles = golinks_server::start_server(config).await?;
    println!("HTTP listening on http://{}", handles.http_addr);
    println!("Native RPC listening on {}", handles.rpc_addr);

    // Keep the process running until interrupted
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    println!("\nShutting down...");
    Ok(())
}
