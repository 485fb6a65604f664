//! The embedded reference backend: an in-process ordered map guarded by
//! a reader/writer lock. This is the backend every test and example in
//! this crate runs against; it stands in for the single-file embedded
//! engine described as an external collaborator in `SPEC_FULL.md` §6.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use super::{ObjectStream, OrderedStore, SCAN_CHANNEL_CAPACITY};
use crate::error::Result;
use crate::model::{Body, Object};

/// An ordered, in-memory key-value store. Cheap to clone (`Arc`-backed)
/// so it can be shared across the tokio tasks the pipeline spawns.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<RwLock<BTreeMap<String, Body>>>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderedStore for MemStore {
    async fn put(&self, objects: &[Object]) -> Result<()> {
        let mut map = self.inner.write();
        for obj in objects {
            map.insert(obj.key.clone(), obj.val.clone().unwrap_or_default());
        }
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<()> {
        let mut map = self.inner.write();
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Object> {
        let map = self.inner.read();
        Ok(Object::new(key, map.get(key).cloned()))
    }

    async fn prefix(&self, prefix: &str, max_count: usize) -> Result<ObjectStream> {
        let (tx, rx) = mpsc::channel(SCAN_CHANNEL_CAPACITY.min(max_count.max(1)));
        // Snapshot the matching range up front: the map may be mutated by
        // concurrent writers while this scan streams out, and a stream
        // over store-internal memory would outlive a single invocation
        // in violation of the object-lifecycle contract in SPEC_FULL.md §3.
        let matches: Vec<Object> = {
            let map = self.inner.read();
            map.range(prefix.to_string()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .take(max_count)
                .map(|(k, v)| Object::new(k.clone(), Some(v.clone())))
                .collect()
        };
        debug!(prefix, count = matches.len(), "mem-store: prefix scan");
        tokio::spawn(async move {
            for obj in matches {
                if tx.send(obj).await.is_err() {
                    // Consumer dropped the stream early; normal stop.
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn wipe(&self) -> Result<()> {
        self.inner.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_observes_write() {
        let store = MemStore::new();
        store.put(&[Object::new("user_1", Some(Body::new()))]).await.unwrap();
        let got = store.get("user_1").await.unwrap();
        assert!(got.val.is_some());
    }

    #[tokio::test]
    async fn get_missing_key_is_not_an_error() {
        let store = MemStore::new();
        let got = store.get("user_404").await.unwrap();
        assert!(got.val.is_none());
    }

    #[tokio::test]
    async fn prefix_scan_is_ordered_and_bounded() {
        let store = MemStore::new();
        for i in 0..10 {
            store
                .put(&[Object::new(format!("user_{i}"), Some(Body::new()))])
                .await
                .unwrap();
        }
        let mut rx = store.prefix("user_", 3).await.unwrap();
        let mut seen = Vec::new();
        while let Some(obj) = rx.recv().await {
            seen.push(obj.key);
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(seen, vec!["user_0", "user_1", "user_2"]);
    }

    #[tokio::test]
    async fn del_removes_the_key() {
        let store = MemStore::new();
        store.put(&[Object::new("user_1", Some(Body::new()))]).await.unwrap();
        store.del(&["user_1".to_string()]).await.unwrap();
        assert!(store.get("user_1").await.unwrap().val.is_none());
    }
}
