pub mod config;
pub mod predict;
pub mod server;

pub use config::LoggingConfig;
pub use predict::PredictCommand;
pub use server::ServerCommand;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction server
    Server(ServerCommand),
    /// Predict one row without starting the server
    Predict(PredictCommand),
}

impl Commands {
    pub fn logging(&self) -> &LoggingConfig {
        match self {
            Commands::Server(cmd) => &cmd.logging,
            Commands::Predict(cmd) => &cmd.logging,
        }
    }
}
