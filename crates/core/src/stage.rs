//! Stage projections and the per-request read context.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// One of the two live projections of the page tree.
///
/// Each projection holds at most one row per record id; absence of a row
/// means the record does not exist in that stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The draft working copy.
    Draft,
    /// The published copy. Rows appear here only as the product of a publish.
    Live,
}

impl Stage {
    /// Physical table holding this projection.
    pub fn table(&self) -> &'static str {
        match self {
            Stage::Draft => "pages",
            Stage::Live => "pages_live",
        }
    }

    /// The opposite projection.
    pub fn other(&self) -> Stage {
        match self {
            Stage::Draft => Stage::Live,
            Stage::Live => Stage::Draft,
        }
    }
}

/// Read-side context: which projection to read, and optionally a point in
/// time to answer from the version history instead.
///
/// Carried as an explicit value through every accessor, so concurrent
/// requests can read different stages without shared mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadContext {
    pub stage: Stage,
    /// When set, reads answer from the newest version entry at or before
    /// this instant rather than from a projection table.
    pub archive_at: Option<Timestamp>,
}

impl ReadContext {
    /// Read the draft projection.
    pub fn draft() -> Self {
        ReadContext {
            stage: Stage::Draft,
            archive_at: None,
        }
    }

    /// Read the published projection.
    pub fn live() -> Self {
        ReadContext {
            stage: Stage::Live,
            archive_at: None,
        }
    }

    /// Read the tree as it existed at `at`.
    pub fn archived(at: Timestamp) -> Self {
        ReadContext {
            stage: Stage::Draft,
            archive_at: Some(at),
        }
    }
}

impl Default for ReadContext {
    fn default() -> Self {
        ReadContext::draft()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_distinct_per_stage() {
        assert_eq!(Stage::Draft.table(), "pages");
        assert_eq!(Stage::Live.table(), "pages_live");
        assert_ne!(Stage::Draft.table(), Stage::Live.table());
    }

    #[test]
    fn other_round_trips() {
        assert_eq!(Stage::Draft.other(), Stage::Live);
        assert_eq!(Stage::Live.other(), Stage::Draft);
    }

    #[test]
    fn default_context_reads_draft_without_archive() {
        let ctx = ReadContext::default();
        assert_eq!(ctx.stage, Stage::Draft);
        assert!(ctx.archive_at.is_none());
    }
}
