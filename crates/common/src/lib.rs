pub mod config;
pub mod logger;
pub mod models;
pub mod parsing;

pub use config::{ConfigError, RunConfig};
