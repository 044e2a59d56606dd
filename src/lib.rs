pub mod cli;
pub mod config;
pub mod connect;
pub mod error;
pub mod jump;
pub mod orchestrator;
pub mod resolver;
pub mod ssh_config;
pub mod utils;

pub use cli::Cli;
pub use config::ConfigStore;
pub use connect::{ConnectOptions, ConnectReport, Connector};
pub use error::{AsshError, ConfigError};
