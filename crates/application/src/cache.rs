//! Response cache shared by the caching stages.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Number, Value};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::request::Request;

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process cache of request responses keyed by request parameters.
///
/// Holds at most one entry per key. Writing a key again replaces the entry
/// and resets its expiry. Expired entries are never returned and are only
/// removed when overwritten or purged.
#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the cache key: the request type name followed by its
    /// serialized parameters.
    ///
    /// Parameters that compare equal produce the same key, so `-0.0` is
    /// written as `0.0`.
    pub fn key_for<R>(request: &R) -> Result<String, serde_json::Error>
    where
        R: Request + Serialize,
    {
        let mut parameters = serde_json::to_value(request)?;
        normalize_zero(&mut parameters);
        Ok(format!("{}:{}", R::NAME, parameters))
    }

    /// Returns the live entry for a key.
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if !entry.is_live(Instant::now()) {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Stores a value for `ttl`, replacing any entry under the same key.
    pub async fn insert<T>(&self, key: String, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        let entry = CacheEntry {
            value: Arc::new(value),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn normalize_zero(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(normalize_zero),
        Value::Object(fields) => fields.values_mut().for_each(normalize_zero),
        Value::Number(n) if n.is_f64() && n.as_f64() == Some(0.0) => {
            if let Some(zero) = Number::from_f64(0.0) {
                *n = zero;
            }
        }
        _ => {}
    }
}
