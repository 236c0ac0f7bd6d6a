//! Mocker - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use mocker::{MockServer, MockerConfig};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mocker",
    about = "Configurable HTTP stub server - canned responses per route for integration testing",
    version
)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8888)]
    port: u16,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let example_config = include_str!("../config/default-config.yaml");
        println!("{}", example_config);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => {
            info!(path = ?path, "Loading configuration");
            MockerConfig::from_file(path)?
        }
        None if args.validate => anyhow::bail!("--validate needs a --config file"),
        None => {
            info!("Using default configuration (welcome route only)");
            MockerConfig::default()
        }
    };

    if args.validate {
        config.validate()?;
        println!(
            "Configuration is valid ({} routes defined)",
            config.routes.len()
        );
        return Ok(());
    }

    let server = MockServer::new(config)?;
    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    server.run(listener).await?;

    Ok(())
}
