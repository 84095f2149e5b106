use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::storage::{CacheError, CacheStorage};
use crate::http::{Request, Response};

type Generation = BTreeMap<String, Response>;

/// In-memory cache storage.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    generations: RwLock<BTreeMap<String, Generation>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        self.generations
            .write()
            .await
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: Response,
    ) -> Result<(), CacheError> {
        self.generations
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .insert(request.cache_key(), response);
        Ok(())
    }

    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> Result<Option<Response>, CacheError> {
        let generations = self.generations.read().await;
        Ok(generations
            .get(name)
            .and_then(|generation| generation.get(&request.cache_key()))
            .cloned())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.generations.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.generations.write().await.remove(name).is_some())
    }

    async fn entry_count(&self, name: &str) -> Result<usize, CacheError> {
        self.generations
            .read()
            .await
            .get(name)
            .map(BTreeMap::len)
            .ok_or_else(|| CacheError::NotFound(name.to_string()))
    }
}
