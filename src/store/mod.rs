//! The ordered key-value store contract (C2).
//!
//! Every traversal step reduces to a bounded prefix scan against an
//! `OrderedStore`. Two backends ship here: [`mem::MemStore`], the
//! embedded reference backend used by every test in this crate, and
//! [`buffered::BufferedStore`], which demonstrates the write-batching
//! concurrency contract a remote wide-column backend would need without
//! depending on any particular cloud SDK.

pub mod buffered;
pub mod mem;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::model::Object;

/// Default bounded channel capacity for a `Prefix` scan's output stream.
pub const SCAN_CHANNEL_CAPACITY: usize = 64;

/// A lazy, ordered stream of objects produced by a prefix scan. The
/// producing backend closes its sending half when the scan is exhausted
/// or its `max_count` cap is reached; a consumer that drops the receiver
/// early is treated as a normal stop, not an error.
pub type ObjectStream = mpsc::Receiver<Object>;

/// The abstract ordered key-value contract every storage backend
/// implements. See `SPEC_FULL.md` §4.1 for the full consistency contract.
#[async_trait]
pub trait OrderedStore: Send + Sync {
    /// Upserts one or more key-value entries. Writes are unordered
    /// between distinct keys.
    async fn put(&self, objects: &[Object]) -> Result<()>;

    /// Removes the given keys. The `val` field of each is ignored.
    async fn del(&self, keys: &[String]) -> Result<()>;

    /// Point lookup. A missing key is not an error: it returns an
    /// `Object` with `val: None`.
    async fn get(&self, key: &str) -> Result<Object>;

    /// A lazy, ordered (by byte-lexicographic key) stream of up to
    /// `max_count` objects whose key starts with `prefix`.
    async fn prefix(&self, prefix: &str, max_count: usize) -> Result<ObjectStream>;

    /// Makes buffered writes durable/visible. Idempotent. Backends that
    /// apply writes synchronously may implement this as a no-op.
    async fn flush(&self) -> Result<()>;

    /// Lifecycle hook run once before the store is used.
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    /// Lifecycle hook run once when the store is no longer needed.
    async fn close(&self) -> Result<()> {
        self.flush().await
    }

    /// Destructive reset. Test-only.
    async fn wipe(&self) -> Result<()>;
}
