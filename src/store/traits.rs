use async_trait::async_trait;
use thiserror::Error;

/// Cache error taxonomy.
///
/// `Transport` is the only runtime failure source the coordinator will
/// degrade on; `Serialization` always surfaces (fallback must not mask
/// data-integrity problems) and `Config` is fatal at construction time.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("remote transport error: {0}")]
    Transport(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    /// Whether this error is eligible for the coordinator's fallback path.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Remote key-value tier contract.
///
/// Values cross the wire as JSON strings; (de)serialization to typed
/// values happens in the coordinator. Implementations own namespacing:
/// keys passed in are logical, keys returned from [`keys`](Self::keys)
/// are logical (prefix stripped).
///
/// Every operation may fail with [`CacheError::Transport`]; converting
/// that into a safe default is the coordinator's decision, not the
/// store's.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), CacheError>;
    async fn del(&self, key: &str) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// List logical keys matching a glob-style pattern (`*` wildcard).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// Delete keys matching `pattern`, or the whole namespace when `None`.
    /// Returns the number of keys removed.
    async fn flush(&self, pattern: Option<&str>) -> Result<u64, CacheError>;
}
