use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::{Request, Response};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache generation not found: {0}")]
    NotFound(String),

    #[error("Invalid cache name: {0:?}")]
    InvalidName(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Host-provided store of named cache generations.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the named generation, creating it if absent.
    async fn open(&self, name: &str) -> Result<(), CacheError>;

    /// Store a response, replacing any previous entry for the same request.
    async fn put(&self, name: &str, request: &Request, response: Response)
        -> Result<(), CacheError>;

    /// Store a batch of entries in one operation.
    async fn put_all(
        &self,
        name: &str,
        entries: Vec<(Request, Response)>,
    ) -> Result<(), CacheError> {
        for (request, response) in entries {
            self.put(name, &request, response).await?;
        }
        Ok(())
    }

    /// Look up a request in the named generation. A missing generation is a miss.
    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> Result<Option<Response>, CacheError>;

    /// Names of all stored generations.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Delete a generation. Returns false when it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;

    /// Number of entries in a generation.
    async fn entry_count(&self, name: &str) -> Result<usize, CacheError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Covers clock skew too
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}
