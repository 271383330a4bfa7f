use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedbind::app::AppContext;
use feedbind::cli::{commands, Cli};
use feedbind::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(root) = &cli.output_path {
        config.output.root = root.clone();
    }

    let ctx = AppContext::new(config)?;
    let feed = commands::load_feed(&ctx, &cli.source, cli.limit).await?;

    let formats = cli.formats();
    if formats.is_empty() {
        commands::print_feed(&feed, cli.json)?;
    } else {
        commands::convert(&ctx, &feed, &formats).await?;
    }

    tracing::info!("Exiting");
    Ok(())
}
