//! Storage abstraction for the page tree.
//!
//! [`PageStore`] is the seam to the backing relational store: table-scoped
//! CRUD per projection, sibling queries for segment scoping, atomic subtree
//! deletes, and the append-only version history. Two backends ship:
//! [`postgres::PostgresStore`] for production and [`memory::MemoryStore`]
//! for tests and embedded use.

pub mod memory;
pub mod postgres;

use std::collections::HashSet;

use arbor_core::stage::Stage;
use arbor_core::types::{DbId, Timestamp};
use async_trait::async_trait;

use crate::models::{NewVersion, PageRow, PageVersion};

/// Transport-level storage failure. Fatal: propagated untouched, never
/// retried by this crate, and never left behind as a partial cascade.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("snapshot encoding error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backing store for the two stage projections and the version history.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Reserve a fresh record id.
    async fn allocate_id(&self) -> Result<DbId, StoreError>;

    /// Fetch one row from a projection.
    async fn get(&self, stage: Stage, id: DbId) -> Result<Option<PageRow>, StoreError>;

    /// Insert or replace a row in a projection.
    async fn upsert(&self, stage: Stage, row: &PageRow) -> Result<(), StoreError>;

    /// Remove a batch of rows from one projection. Atomic with respect to
    /// observers: all of them vanish or none do. Returns the number of rows
    /// actually removed.
    async fn delete_many(&self, stage: Stage, ids: &[DbId]) -> Result<u64, StoreError>;

    /// Direct children of `parent_id` in a projection, ordered by
    /// `(sort, id)`.
    async fn children(&self, stage: Stage, parent_id: DbId) -> Result<Vec<PageRow>, StoreError>;

    /// The child of `parent_id` carrying `segment`, if any.
    async fn child_by_segment(
        &self,
        stage: Stage,
        parent_id: DbId,
        segment: &str,
    ) -> Result<Option<PageRow>, StoreError>;

    /// URL segments already taken among the children of `parent_id`,
    /// excluding the record being written.
    async fn sibling_segments(
        &self,
        stage: Stage,
        parent_id: DbId,
        exclude: DbId,
    ) -> Result<HashSet<String>, StoreError>;

    /// Append the next version entry for a record. Implementations must
    /// serialize appends per record: concurrent writers never observe a gap
    /// and never share a version number.
    async fn append_version(&self, new: &NewVersion) -> Result<PageVersion, StoreError>;

    /// Newest entry for a record.
    async fn latest_version(&self, record_id: DbId) -> Result<Option<PageVersion>, StoreError>;

    /// Newest entry created at or before `at`. Absence is `None`, never an
    /// error.
    async fn version_as_of(
        &self,
        record_id: DbId,
        at: Timestamp,
    ) -> Result<Option<PageVersion>, StoreError>;

    /// Full history for a record, newest first.
    async fn versions(&self, record_id: DbId) -> Result<Vec<PageVersion>, StoreError>;

    /// Latest snapshot of every record whose newest version names
    /// `parent_id` as its parent, whether or not the record still exists in
    /// any projection.
    async fn versions_latest_by_parent(
        &self,
        parent_id: DbId,
    ) -> Result<Vec<PageVersion>, StoreError>;

    /// As [`PageStore::versions_latest_by_parent`], but evaluated at `at`.
    async fn versions_as_of_by_parent(
        &self,
        parent_id: DbId,
        at: Timestamp,
    ) -> Result<Vec<PageVersion>, StoreError>;
}
