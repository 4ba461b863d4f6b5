//! Record store contract

use crate::core::feed::Subscription;
use crate::core::record::{Fields, Record};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Document store keyed by collection name and record id
///
/// Implementations stamp `createdAt` on create and `updatedAt` on update.
/// Every successful mutation republishes the collection's snapshot, so any
/// subscription sees the change without polling.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record with a generated id
    async fn create(&self, collection: &str, fields: Fields) -> Result<Record>;

    /// Write a record under a known id
    ///
    /// With `merge` the fields are merged into an existing record; without
    /// it the record is replaced. A missing record is created either way.
    async fn set(&self, collection: &str, id: Uuid, fields: Fields, merge: bool) -> Result<Record>;

    /// Get a record by id
    async fn get(&self, collection: &str, id: &Uuid) -> Result<Option<Record>>;

    /// Every record of a collection, newest first
    async fn list(&self, collection: &str) -> Result<Vec<Record>>;

    /// Merge fields into an existing record
    ///
    /// Fails when the record does not exist.
    async fn update(&self, collection: &str, id: &Uuid, fields: Fields) -> Result<Record>;

    /// Delete a record
    ///
    /// Deleting a missing record is not an error.
    async fn delete(&self, collection: &str, id: &Uuid) -> Result<()>;

    /// Delete every record of a collection and forget the collection
    ///
    /// Returns the number of records removed. Used for sub-collections whose
    /// parent record is gone.
    async fn drop_collection(&self, collection: &str) -> Result<usize>;

    /// Subscribe to the collection's snapshots ordered by `order_field` descending
    fn subscribe(&self, collection: &str, order_field: &str) -> Subscription;
}
