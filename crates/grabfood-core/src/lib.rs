pub mod app_config;
pub mod config;
pub mod merchant;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use merchant::{MerchantRecord, ID_COLUMN, MERCHANT_COLUMNS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
