//! Remote key-value store backends for credential disablement records.
//!
//! The store is the only cross-instance shared resource. It is assumed to
//! offer read-after-write within a region, TTL-based expiry, and eventual
//! cross-instance visibility. It is never used for mutual exclusion.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// Persisted record for one disabled credential, keyed by the credential's
/// digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledRecord {
    /// Disablement time, epoch millis.
    pub disabled_at: i64,
    /// Free-text reason (the classified upstream failure).
    pub reason: String,
    /// Calendar month (1-12) in which the credential was disabled.
    pub month: u32,
}

/// Trait for disablement-record stores.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Load the record for a credential digest.
    async fn get(&self, key: &str) -> Result<Option<DisabledRecord>>;

    /// Store a record with an expiry.
    async fn put(&self, key: &str, record: &DisabledRecord, ttl: Duration) -> Result<()>;

    /// Delete the record for a credential digest.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Name of this store backend.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// In-memory store with TTL semantics, primarily for testing.
pub struct MemoryKvStore {
    records: RwLock<HashMap<String, (DisabledRecord, Instant)>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<DisabledRecord>> {
        let records = self.records.read().await;
        Ok(records.get(key).and_then(|(record, expires_at)| {
            if Instant::now() < *expires_at {
                Some(record.clone())
            } else {
                None
            }
        }))
    }

    async fn put(&self, key: &str, record: &DisabledRecord, ttl: Duration) -> Result<()> {
        self.records
            .write()
            .await
            .insert(key.to_string(), (record.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.records.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// REST-backed store: one JSON record per key under a base URL, with the
/// TTL passed as a query parameter on writes.
pub struct RestKvStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestKvStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn record_url(&self, key: &str) -> String {
        format!("{}/records/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl KvStore for RestKvStore {
    async fn get(&self, key: &str) -> Result<Option<DisabledRecord>> {
        let response = self
            .client
            .get(self.record_url(key))
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Store(format!(
                "get {} returned {}",
                key,
                response.status()
            )));
        }
        let record = response
            .json::<DisabledRecord>()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(Some(record))
    }

    async fn put(&self, key: &str, record: &DisabledRecord, ttl: Duration) -> Result<()> {
        let response = self
            .client
            .put(self.record_url(key))
            .query(&[("ttl", ttl.as_secs())])
            .json(record)
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Store(format!(
                "put {} returned {}",
                key,
                response.status()
            )));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.record_url(key))
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::Store(format!(
                "delete {} returned {}",
                key,
                response.status()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "rest"
    }
}
