use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::storage::{CacheError, CacheStorage, CachedData};
use crate::http::{Request, Response};

const GENERATION_EXTENSION: &str = "json";
const PARTIAL_EXTENSION: &str = "json.tmp";

/// Generation names map directly onto file names in the cache directory.
fn is_valid_name(name: &str) -> bool {
    !(name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GenerationFile {
    entries: BTreeMap<String, Response>,
}

/// Cache storage persisted as one JSON file per generation.
pub struct DiskCacheStorage {
    cache_dir: PathBuf,
    // Serialises read-modify-write cycles on generation files.
    write_lock: Mutex<()>,
}

impl DiskCacheStorage {
    pub fn new(cache_dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn generation_path(&self, name: &str) -> Result<PathBuf, CacheError> {
        if !is_valid_name(name) {
            return Err(CacheError::InvalidName(name.to_string()));
        }
        Ok(self
            .cache_dir
            .join(format!("{}.{}", name, GENERATION_EXTENSION)))
    }

    async fn load(&self, name: &str) -> Result<Option<CachedData<GenerationFile>>, CacheError> {
        let path = self.generation_path(name)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn save(&self, name: &str, generation: GenerationFile) -> Result<(), CacheError> {
        let path = self.generation_path(name)?;
        let partial = path.with_extension(PARTIAL_EXTENSION);
        let contents = serde_json::to_string(&CachedData::new(generation))?;
        // Readers never see a half-written generation.
        tokio::fs::write(&partial, contents).await?;
        tokio::fs::rename(&partial, &path).await?;
        Ok(())
    }

    async fn update(
        &self,
        name: &str,
        apply: impl FnOnce(&mut GenerationFile),
    ) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        let mut generation = self.load(name).await?.map(|c| c.data).unwrap_or_default();
        apply(&mut generation);
        self.save(name, generation).await
    }

    /// Human-readable age of a generation, based on its last write.
    pub async fn age_display(&self, name: &str) -> Result<Option<String>, CacheError> {
        Ok(self.load(name).await?.map(|cached| cached.age_display()))
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        if self.load(name).await?.is_none() {
            debug!(cache = name, "Creating cache generation");
            self.save(name, GenerationFile::default()).await?;
        }
        Ok(())
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: Response,
    ) -> Result<(), CacheError> {
        let key = request.cache_key();
        self.update(name, move |generation| {
            generation.entries.insert(key, response);
        })
        .await
    }

    async fn put_all(
        &self,
        name: &str,
        entries: Vec<(Request, Response)>,
    ) -> Result<(), CacheError> {
        self.update(name, move |generation| {
            for (request, response) in entries {
                generation.entries.insert(request.cache_key(), response);
            }
        })
        .await
    }

    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> Result<Option<Response>, CacheError> {
        Ok(self
            .load(name)
            .await?
            .and_then(|mut cached| cached.data.entries.remove(&request.cache_key())))
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(GENERATION_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_valid_name(stem) => names.push(stem.to_string()),
                Some(stem) => debug!(file = stem, "Skipping file that is not a cache generation"),
                None => {}
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let path = self.generation_path(name)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn entry_count(&self, name: &str) -> Result<usize, CacheError> {
        self.load(name)
            .await?
            .map(|cached| cached.data.entries.len())
            .ok_or_else(|| CacheError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn get(path: &str) -> Request {
        Request::get(Url::parse("http://localhost:8080").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_entries_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskCacheStorage::new(dir.path().to_path_buf()).unwrap();
        storage
            .put_all(
                "almisbahah-cache-v2",
                vec![
                    (get("/"), Response::new(200).with_body("root")),
                    (get("/manifest.json"), Response::new(200).with_body("{}")),
                ],
            )
            .await
            .unwrap();

        let reopened = DiskCacheStorage::new(dir.path().to_path_buf()).unwrap();
        let hit = reopened
            .match_request("almisbahah-cache-v2", &get("/manifest.json"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.body, b"{}");
        assert_eq!(reopened.entry_count("almisbahah-cache-v2").await.unwrap(), 2);
        assert_eq!(
            reopened.age_display("almisbahah-cache-v2").await.unwrap().as_deref(),
            Some("just now")
        );
    }

    #[tokio::test]
    async fn test_open_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskCacheStorage::new(dir.path().to_path_buf()).unwrap();
        storage.put("v1", &get("/a"), Response::new(200)).await.unwrap();
        storage.open("v1").await.unwrap();

        assert_eq!(storage.entry_count("v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskCacheStorage::new(dir.path().to_path_buf()).unwrap();
        storage.open("almisbahah-cache-v2").await.unwrap();
        storage.open("almisbahah-cache-v1").await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["almisbahah-cache-v1", "almisbahah-cache-v2"]
        );
        assert!(storage.delete("almisbahah-cache-v1").await.unwrap());
        assert!(!storage.delete("almisbahah-cache-v1").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["almisbahah-cache-v2"]);
    }

    #[tokio::test]
    async fn test_keys_skip_unaddressable_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskCacheStorage::new(dir.path().to_path_buf()).unwrap();
        storage.open("almisbahah-cache-v2").await.unwrap();
        std::fs::write(dir.path().join(".old.json"), "{}").unwrap();

        let names = storage.keys().await.unwrap();
        assert_eq!(names, vec!["almisbahah-cache-v2"]);
        for name in names {
            storage.delete(&name).await.unwrap();
        }
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_writes_leave_no_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskCacheStorage::new(dir.path().to_path_buf()).unwrap();
        storage.put("v1", &get("/a"), Response::new(200)).await.unwrap();
        storage.put("v1", &get("/b"), Response::new(200)).await.unwrap();

        let files: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["v1.json"]);
        assert_eq!(storage.entry_count("v1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_generation_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskCacheStorage::new(dir.path().to_path_buf()).unwrap();
        let miss = storage.match_request("nope", &get("/")).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskCacheStorage::new(dir.path().to_path_buf()).unwrap();
        for name in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                storage.open(name).await,
                Err(CacheError::InvalidName(_))
            ));
        }
    }
}
