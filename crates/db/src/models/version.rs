//! Immutable version history models.

use arbor_core::actor::EditScope;
use arbor_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::page::PageRow;

/// Snapshot input for appending the next version entry of a record.
///
/// The store assigns the version number and timestamp; everything else is
/// the full field set at time of write plus the audit stamps.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub record_id: DbId,
    pub class_name: String,
    pub title: String,
    pub url_segment: String,
    pub parent_id: DbId,
    pub sort: i32,
    pub content: JsonValue,
    pub edit_scope: EditScope,
    /// Who made the edit; 0 = anonymous.
    pub author_id: DbId,
    /// Who triggered publication; 0 for a non-publishing write.
    pub publisher_id: DbId,
}

impl NewVersion {
    /// Snapshot a projection row's full field set.
    pub fn from_row(row: &PageRow) -> Self {
        NewVersion {
            record_id: row.id,
            class_name: row.class_name.clone(),
            title: row.title.clone(),
            url_segment: row.url_segment.clone(),
            parent_id: row.parent_id,
            sort: row.sort,
            content: row.content.clone(),
            edit_scope: row.edit_scope.clone(),
            author_id: row.author_id,
            publisher_id: row.publisher_id,
        }
    }
}

/// One immutable entry in a record's version history.
///
/// Keyed by `(record_id, version)`; version numbers increase strictly per
/// record. Entries are never rewritten or deleted, not even when the record
/// vanishes from both projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageVersion {
    pub record_id: DbId,
    pub version: i32,
    pub class_name: String,
    pub title: String,
    pub url_segment: String,
    pub parent_id: DbId,
    pub sort: i32,
    pub content: JsonValue,
    pub edit_scope: EditScope,
    pub author_id: DbId,
    pub publisher_id: DbId,
    pub created_at: Timestamp,
}

impl PageVersion {
    /// Rebuild a projection row from this snapshot. The row carries the
    /// entry's version number and timestamps; restoring through the stage
    /// manager re-stamps both.
    pub fn to_row(&self) -> PageRow {
        PageRow {
            id: self.record_id,
            class_name: self.class_name.clone(),
            title: self.title.clone(),
            url_segment: self.url_segment.clone(),
            parent_id: self.parent_id,
            sort: self.sort,
            content: self.content.clone(),
            edit_scope: self.edit_scope.clone(),
            version: self.version,
            author_id: self.author_id,
            publisher_id: self.publisher_id,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
