//! Shared configuration and credential types for the social pulse workspace.

mod app_config;
mod config;
mod credentials;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use credentials::{InstagramCredentials, SearchCredentials};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
