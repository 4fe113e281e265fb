// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;

use crate::Result;

/// Key/value storage consulted by cache middleware.
///
/// Keys are request URLs or resource identifiers; values are response bodies. The store owns
/// its own concurrency and eviction policy; the client shares one store between all calls.
///
/// Failures should be reported as [`Error::Cache`][crate::Error::Cache].
#[dynosaur::dynosaur(pub(crate) DynCacheStore = dyn(box) CacheStore, bridge(none))]
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Bytes) -> impl Future<Output = Result<()>> + Send;

    /// Removes the value stored under `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// A clonable, type-erased [`CacheStore`].
///
/// Every clone refers to the same underlying store.
#[derive(Clone)]
pub struct DynamicStore(Arc<DynCacheStore<'static>>);

impl DynamicStore {
    /// Erases the type of `store`.
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self(DynCacheStore::new_arc(store))
    }
}

impl Debug for DynamicStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicStore").finish()
    }
}

impl CacheStore for DynamicStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        self.0.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.0.delete(key).await
    }
}

/// An in-process [`CacheStore`] backed by moka.
///
/// Unbounded and without expiry unless created with [`with_capacity`][Self::with_capacity]
/// or [`with_time_to_live`][Self::with_time_to_live].
///
/// # Examples
///
/// ```
/// use rebound::cache::{CacheStore, MemoryStore};
/// # futures::executor::block_on(async {
///
/// let store = MemoryStore::new();
///
/// store.set("https://example.com/api/v1/users/me", "{}".into()).await?;
/// assert!(store.get("https://example.com/api/v1/users/me").await?.is_some());
/// # Ok::<(), rebound::Error>(())
/// # }).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Cache<String, Bytes>,
}

impl MemoryStore {
    /// Creates an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Creates a store holding at most `max_capacity` entries.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::build(Some(max_capacity), None)
    }

    /// Creates a store whose entries expire `time_to_live` after they were written.
    #[must_use]
    pub fn with_time_to_live(time_to_live: Duration) -> Self {
        Self::build(None, Some(time_to_live))
    }

    pub(crate) fn build(max_capacity: Option<u64>, time_to_live: Option<Duration>) -> Self {
        let mut builder = Cache::builder();

        if let Some(capacity) = max_capacity {
            builder = builder.max_capacity(capacity);
        }

        if let Some(ttl) = time_to_live {
            builder = builder.time_to_live(ttl);
        }

        Self { inner: builder.build() }
    }

    /// Returns the approximate number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.inner.get(key).await)
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        self.inner.insert(key.to_owned(), value).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(MemoryStore: Send, Sync, Clone);
        static_assertions::assert_impl_all!(DynamicStore: Send, Sync, Clone);
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();

        assert_eq!(store.get("a").await.unwrap(), None);

        store.set("a", Bytes::from_static(b"1")).await.unwrap();
        store.set("a", Bytes::from_static(b"2")).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(Bytes::from_static(b"2")));

        store.delete("a").await.unwrap();
        store.delete("missing").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = MemoryStore::with_capacity(16);
        let clone = store.clone();

        store.set("k", Bytes::from_static(b"v")).await.unwrap();

        assert_eq!(clone.get("k").await.unwrap(), Some(Bytes::from_static(b"v")));
    }

    #[tokio::test]
    async fn dynamic_store_delegates() {
        let store = MemoryStore::with_time_to_live(Duration::from_secs(60));
        let dynamic = DynamicStore::new(store.clone());

        dynamic.set("k", Bytes::from_static(b"v")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(Bytes::from_static(b"v")));

        dynamic.delete("k").await.unwrap();
        assert_eq!(dynamic.get("k").await.unwrap(), None);
    }
}
