use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::host::{ClientsError, NetworkError, NotificationError};

/// Errors surfaced by the agent's lifecycle handlers.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Asset {url} rejected with status {status}")]
    AssetRejected { url: String, status: u16 },

    #[error("Asset path cannot be resolved against the origin: {path}")]
    InvalidAsset { path: String },

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Clients error: {0}")]
    Clients(#[from] ClientsError),
}
