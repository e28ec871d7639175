/**
 * Graphwire Server Entry Point
 *
 * Brings up a single-process server over the in-process store/bus with the
 * bundled dispatch engine and no application modules: the built-in
 * introspection schema, the full auth surface and the duplex transport.
 * Applications embed the library instead and pass their own modules,
 * collaborators and (in a worker pool) a cross-process store/bus.
 */

use graphwire::{create_app, HookRegistry, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = ServerConfig::from_env();
    let addr = format!("{}:{}", config.host, config.port);

    let (app, _state, handle) = create_app(config, HookRegistry::new(), Vec::new()).await?;

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    handle.shutdown().await;
    Ok(())
}
