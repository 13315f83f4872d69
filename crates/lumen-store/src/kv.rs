//! Key-value store interface
//!
//! The narrow seam between the auth core and whatever holds its state.
//! Values are opaque strings (the core stores JSON); keys are
//! namespaced by the caller (`magic:<hash>`, `ent:<user_id>`).

use async_trait::async_trait;
use chrono::Duration;

use crate::error::StoreResult;

/// Keyed store with atomic take semantics
///
/// `take` is the load-bearing operation: it must remove and return the
/// entry atomically so that two concurrent consumers of a single-use
/// key cannot both succeed. Durable backends implement it with a
/// compare-and-delete (Redis `GETDEL`, SQL `DELETE .. RETURNING`).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, optionally expiring after `ttl`
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()>;

    /// Remove a value
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Atomically remove and return a value
    ///
    /// Returns `None` when the key is absent or already consumed.
    async fn take(&self, key: &str) -> StoreResult<Option<String>>;
}
