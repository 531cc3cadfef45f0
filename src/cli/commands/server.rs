use super::LoggingConfig;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ServerCommand {
    /// Host address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingConfig,
}
