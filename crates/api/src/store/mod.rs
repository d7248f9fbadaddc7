//! Share record storage.
//!
//! The gateway treats storage as an opaque key-value store with a TTL.
//! [`ShareStore`] is that seam; [`memory::InMemoryShareStore`] is the only
//! backend.

pub mod memory;

use async_trait::async_trait;
use pinboard_core::error::CoreError;
use pinboard_core::share::ShareRecord;
use pinboard_core::types::Timestamp;

pub use memory::InMemoryShareStore;

#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Store a new record. Fails with `Conflict` if the id is taken.
    async fn insert(&self, record: ShareRecord) -> Result<(), CoreError>;

    /// Fetch a record that has not expired as of `now`.
    async fn get(&self, id: &str, now: Timestamp) -> Option<ShareRecord>;

    /// Remove every record expired as of `now`. Returns how many were removed.
    async fn purge_expired(&self, now: Timestamp) -> usize;

    /// Number of records held, expired or not.
    async fn len(&self) -> usize;
}
