//! Coupon predictor binary.
//!
//! Entry point for the prediction server and the offline `predict` command.

use clap::Parser;
use coupon_predictor::cli::{
    commands::Commands,
    handlers::{handle_predict, handle_server},
};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let logging = cli.command.logging();
    let level: Level = logging.get_effective_level().parse().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .parse_lossy(logging.log_filter.as_deref().unwrap_or_default()),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Coupon predictor starting up");

    match cli.command {
        Commands::Server(cmd) => handle_server(cmd).await?,
        Commands::Predict(cmd) => handle_predict(cmd)?,
    }

    Ok(())
}
