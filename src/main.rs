//! sketchrelay - Real-time drawing relay server.

use clap::Parser;
use sketchrelay::config::Config;
use tokio::sync::watch;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sketchrelay=info")),
        )
        .init();

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║              sketchrelay - Shared Canvas Relay             ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    // Shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        println!("\n🛑 Shutdown signal received...");
        let _ = shutdown_tx.send(true);
    })
    .map_err(sketchrelay::error::ServerError::from)?;

    let addr = config.bind_addr();
    println!("🌐 Listening on http://{}", addr);
    println!("   • WS   /ws          - Validated drawing channel");
    println!("   • WS   /ws/draw     - Lenient drawing channel");
    println!("   • GET  /health      - Liveness and connection count");
    println!("   • POST /ai/cleanup  - Diagram cleanup");
    println!("   • Static files from {}", config.static_dir.display());
    println!();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(sketchrelay::server::run_server(config, shutdown_rx))?;

    println!("👋 sketchrelay has exited. Goodbye!");
    Ok(())
}
