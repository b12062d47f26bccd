use clap::Parser;
use lore_core::LoreConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "lore.toml")]
    config: String,

    /// Check the configured store and index, then exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match LoreConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let services = match lore_server::services::build_services(&config).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialise services: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match services.store.health().await {
            Ok(v) => println!("✅ Store ({}) reachable: {}", services.store.name(), v),
            Err(e) => {
                println!("❌ Store ({}) check failed: {}", services.store.name(), e);
                std::process::exit(1);
            }
        }
        println!("✅ Vector index: {}", services.index.name());
        println!("✅ Lore health check passed");
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    lore_server::http::start_http_server(services, config, tx.subscribe()).await?;

    Ok(())
}
