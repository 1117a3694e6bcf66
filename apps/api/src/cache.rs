//! Content-addressed, time-expiring store for raw LLM replies.
//!
//! Keys are the MD5 hex digest of `resume_text + job_description`. An entry is
//! fresh while its age is strictly below the TTL (24h by default). Stale
//! entries are not swept; they are simply overwritten by the next fetch.
//!
//! Caching is best effort: storage failures are logged and never change the
//! outcome of `get_or_fetch`. Concurrent misses on the same key each fetch and
//! each write, the last write wins.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cached entry is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// A cached reply together with its write time.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// Key-value byte store addressed by cache key.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Write time of the entry, `None` when absent.
    async fn modified(&self, key: &str) -> Result<Option<DateTime<Utc>>, CacheError>;

    async fn read(&self, key: &str) -> Result<String, CacheError>;

    /// Replaces the whole entry. Creates the storage location if needed.
    async fn write(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// One `<key>.json` file per entry; the file mtime is the entry timestamp.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    dir: PathBuf,
}

impl FsCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn modified(&self, key: &str) -> Result<Option<DateTime<Utc>>, CacheError> {
        match tokio::fs::metadata(self.path_for(key)).await {
            Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, key: &str) -> Result<String, CacheError> {
        let bytes = tokio::fs::read(self.path_for(key)).await?;
        Ok(String::from_utf8(bytes)?)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        // Write beside the target then rename, so readers never see a torn file.
        let tmp = self.dir.join(format!("{key}.{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&tmp, value).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.path_for(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Deterministic cache key for a (resume, job description) pair.
pub fn cache_key(resume_text: &str, job_description: &str) -> String {
    let mut ctx = md5::Context::new();
    ctx.consume(resume_text.as_bytes());
    ctx.consume(job_description.as_bytes());
    format!("{:x}", ctx.compute())
}

#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// File-backed cache under `dir` with the given TTL in hours.
    pub fn on_disk(dir: impl Into<PathBuf>, ttl_hours: i64) -> Self {
        Self::new(Arc::new(FsCacheStore::new(dir)), Duration::hours(ttl_hours))
    }

    /// Returns the fresh entry for `key`, if any. Read failures count as a miss.
    pub async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let created_at = match self.store.modified(key).await {
            Ok(Some(ts)) => ts,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to stat cache entry {key}: {e}");
                return None;
            }
        };

        if Utc::now() - created_at >= self.ttl {
            debug!("Cache entry {key} is stale");
            return None;
        }

        match self.store.read(key).await {
            Ok(value) => Some(CacheEntry {
                key: key.to_string(),
                value,
                created_at,
            }),
            Err(e) => {
                warn!("Failed to read cache entry {key}, regenerating: {e}");
                None
            }
        }
    }

    /// Returns the cached reply for the pair when fresh. Otherwise calls `fetch`
    /// exactly once, stores its result and returns it. Fetch errors are passed
    /// through untouched and nothing is written.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        resume_text: &str,
        job_description: &str,
        fetch: F,
    ) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let key = cache_key(resume_text, job_description);

        if let Some(entry) = self.lookup(&key).await {
            debug!("Cache hit for {} (written {})", entry.key, entry.created_at);
            return Ok(entry.value);
        }

        let value = fetch().await?;

        if let Err(e) = self.store.write(&key, &value).await {
            warn!("Failed to write cache entry {key}: {e}");
        }

        Ok(value)
    }
}
