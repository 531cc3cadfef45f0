use super::LoggingConfig;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct PredictCommand {
    /// Feature row as a JSON object
    #[arg(long)]
    pub row: String,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingConfig,
}
