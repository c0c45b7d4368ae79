//! Redis remote tier.
//!
//! Values are stored as plain JSON strings under namespaced keys:
//!
//! ```text
//! SET brand:logo.acme '{"url":"https://...","format":"svg"}'  [EX ttl]
//! ```
//!
//! The configured prefix is applied before any key goes over the wire and
//! stripped from key listings, so callers only ever see logical keys.
//! Pattern operations use cursored `SCAN MATCH` rather than `KEYS`, which
//! blocks the server on large keyspaces.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, pipe};

use super::traits::{CacheError, RemoteStore};

pub struct RedisKv {
    connection: ConnectionManager,
    /// Key prefix for namespacing (e.g., "brand:" → "brand:logo.acme")
    prefix: String,
}

impl RedisKv {
    /// Connect without a key prefix.
    pub async fn connect(connection_string: &str) -> Result<Self, CacheError> {
        Self::with_prefix(connection_string, None).await
    }

    /// Connect with an optional key prefix.
    ///
    /// The prefix scopes all keys, enabling several logical cache users to
    /// share one Redis instance without collisions.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use hybrid_cache::store::redis::RedisKv;
    /// # async fn example() -> Result<(), hybrid_cache::CacheError> {
    /// // Keys will be prefixed: "brand:logo.acme", "brand:card.smith"
    /// let store = RedisKv::with_prefix("redis://localhost", Some("brand:")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_prefix(
        connection_string: &str,
        prefix: Option<&str>,
    ) -> Result<Self, CacheError> {
        let client = Client::open(connection_string)
            .map_err(|e| CacheError::Transport(e.to_string()))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
        })
    }

    /// Apply the prefix to a logical key.
    #[inline]
    fn prefixed_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }

    /// Strip the prefix from a wire key (for returning clean key lists).
    #[inline]
    fn strip_prefix<'a>(&self, key: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            key
        } else {
            key.strip_prefix(&self.prefix).unwrap_or(key)
        }
    }

    /// Get a clone of the connection manager (for liveness probes).
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    /// Get the configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Cursored SCAN over the namespace, returning wire (prefixed) keys.
    async fn scan_wire_keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.connection.clone();
        let wire_pattern = self.prefixed_key(pattern);

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&wire_pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Transport(e.to_string()))?;

            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl RemoteStore for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let wire_key = self.prefixed_key(key);

        let value: Option<String> = conn
            .get(&wire_key)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let wire_key = self.prefixed_key(key);

        match ttl_secs {
            Some(ttl) => {
                let _: () = conn
                    .set_ex(&wire_key, value, ttl)
                    .await
                    .map_err(|e| CacheError::Transport(e.to_string()))?;
            }
            None => {
                let _: () = conn
                    .set(&wire_key, value)
                    .await
                    .map_err(|e| CacheError::Transport(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let wire_key = self.prefixed_key(key);

        let _: () = conn
            .del(&wire_key)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection.clone();
        let wire_key = self.prefixed_key(key);

        let exists: bool = conn
            .exists(&wire_key)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        Ok(exists)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let wire_keys = self.scan_wire_keys(pattern).await?;
        Ok(wire_keys
            .iter()
            .map(|k| self.strip_prefix(k).to_string())
            .collect())
    }

    async fn flush(&self, pattern: Option<&str>) -> Result<u64, CacheError> {
        let wire_keys = self.scan_wire_keys(pattern.unwrap_or("*")).await?;
        if wire_keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection.clone();
        let mut pipeline = pipe();
        for key in &wire_keys {
            pipeline.del(key);
        }
        pipeline
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;

        Ok(wire_keys.len() as u64)
    }
}
