use anyhow::Result;
use clap::Parser;
use session_cart::{
    cli::{Args, CliApp},
    utils::CartConfig,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = CartConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    let level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(session) = args.session {
        config.session_file = PathBuf::from(session);
    }
    if let Some(key) = args.key {
        config.session_key = key;
    }

    tracing::debug!("🛒 Cart CLI starting...");

    let mut app = CliApp::new(&config).await?;
    app.run(args.command).await?;

    tracing::debug!("🛒 Cart CLI stopped");
    Ok(())
}
