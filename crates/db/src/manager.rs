//! Stage transitions for versioned pages.
//!
//! [`StageManager`] owns every mutation of the two projections and the
//! version history, plus the read-side lookups the host application uses.
//! Reads take an explicit [`ReadContext`]; mutations take the acting
//! identity as a value. Nothing here consults ambient global state.

use std::collections::HashSet;

use arbor_core::actor::{Actor, EditScope};
use arbor_core::error::CoreError;
use arbor_core::registry::ClassRegistry;
use arbor_core::slug::generate_segment;
use arbor_core::stage::{ReadContext, Stage};
use arbor_core::types::{DbId, ROOT_ID};
use chrono::Utc;

use crate::error::DbResult;
use crate::models::{NewVersion, Page, PageRow, PageVersion};
use crate::store::PageStore;
use crate::tree;

/// Extra lookup predicate applied in-process after the row fetch. A filter
/// that excludes every candidate yields the same `None` as "no rows".
pub type PageFilter = dyn Fn(&PageRow) -> bool + Sync;

/// Derived per-record stage flags. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageState {
    /// Exists on draft and has no published row.
    pub is_added_to_stage: bool,
    /// No draft row currently exists.
    pub is_deleted_from_stage: bool,
    /// The draft row's version is not the one reflected on live.
    pub is_modified_on_stage: bool,
}

/// Mediates the draft and live projections of the page tree.
pub struct StageManager<S> {
    store: S,
    registry: ClassRegistry,
    reserved: HashSet<String>,
}

impl<S: PageStore> StageManager<S> {
    /// A manager over `store` with the default class registry.
    pub fn new(store: S) -> Self {
        StageManager::with_registry(store, ClassRegistry::with_defaults())
    }

    /// A manager over `store` with a caller-supplied class registry. Route
    /// segments the registry reserves are withheld from segment generation.
    pub fn with_registry(store: S, registry: ClassRegistry) -> Self {
        let reserved = registry.reserved_segments();
        StageManager {
            store,
            registry,
            reserved,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Upsert a page into the draft projection and append a version entry
    /// stamped with the acting author.
    ///
    /// Assigns an identity to unsaved pages, derives and deduplicates the
    /// URL segment within the draft sibling scope, and persists a cleared
    /// parent (`None`) as "no relation". Rejects unknown class tags and
    /// parents that do not exist on draft before touching anything.
    pub async fn write(&self, page: &mut Page, actor: Option<&Actor>) -> DbResult<PageRow> {
        let class = self.registry.validate(&page.class_name)?;
        if page.id == 0 && page.edit_scope == EditScope::Inherit {
            page.edit_scope = class.default_edit_scope.clone();
        }

        let parent_id = page.parent_id.unwrap_or(ROOT_ID);
        if parent_id != ROOT_ID && self.store.get(Stage::Draft, parent_id).await?.is_none() {
            return Err(CoreError::Validation(format!(
                "parent page {parent_id} does not exist on draft"
            ))
            .into());
        }

        let existing = if page.id != 0 {
            self.store.get(Stage::Draft, page.id).await?
        } else {
            None
        };
        if page.id == 0 {
            page.id = self.store.allocate_id().await?;
        }

        let taken = self
            .store
            .sibling_segments(Stage::Draft, parent_id, page.id)
            .await?;
        let requested = if page.url_segment.is_empty() {
            page.title.clone()
        } else {
            page.url_segment.clone()
        };
        page.url_segment = generate_segment(&requested, &taken, &self.reserved);

        let now = Utc::now();
        let mut row = PageRow {
            id: page.id,
            class_name: page.class_name.clone(),
            title: page.title.clone(),
            url_segment: page.url_segment.clone(),
            parent_id,
            sort: page.sort,
            content: page.content.clone(),
            edit_scope: page.edit_scope.clone(),
            version: 0,
            author_id: actor.map(|a| a.id).unwrap_or(0),
            publisher_id: 0,
            created_at: existing.as_ref().map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
        };

        let entry = self.store.append_version(&NewVersion::from_row(&row)).await?;
        row.version = entry.version;
        self.store.upsert(Stage::Draft, &row).await?;
        page.version = row.version;

        tracing::debug!(id = row.id, version = row.version, "wrote draft page");
        Ok(row)
    }

    /// Copy a record's draft row into the live projection.
    ///
    /// Appends one version entry stamped with both the content author and
    /// the acting publisher, and moves both rows to that version number.
    /// The draft row's field values are untouched. Publishing an unchanged
    /// record is a no-op for content but still records a version.
    pub async fn publish(&self, id: DbId, actor: Option<&Actor>) -> DbResult<PageRow> {
        let draft = self
            .store
            .get(Stage::Draft, id)
            .await?
            .ok_or(CoreError::NotFound { entity: "page", id })?;

        let mut snapshot = NewVersion::from_row(&draft);
        snapshot.publisher_id = actor.map(|a| a.id).unwrap_or(0);
        let entry = self.store.append_version(&snapshot).await?;

        let mut live = draft.clone();
        live.publisher_id = snapshot.publisher_id;
        live.version = entry.version;
        live.updated_at = entry.created_at;
        self.store.upsert(Stage::Live, &live).await?;

        // The draft keeps its field values; only its version audit column
        // advances so both projections now reflect the same number.
        let mut draft = draft;
        draft.version = entry.version;
        self.store.upsert(Stage::Draft, &draft).await?;

        tracing::info!(id, version = live.version, "published page");
        Ok(live)
    }

    /// Remove a record and all its descendants from one projection.
    ///
    /// The cascade is computed from that projection's parent links and
    /// applied as a single atomic batch; the other projection and the
    /// version history are untouched. Returns the number of rows removed.
    pub async fn delete_from_stage(&self, stage: Stage, id: DbId) -> DbResult<u64> {
        let ids = tree::subtree_ids(&self.store, stage, id).await?;
        if ids.is_empty() {
            return Ok(0);
        }
        let removed = self.store.delete_many(stage, &ids).await?;
        tracing::info!(id, ?stage, removed, "deleted subtree from stage");
        Ok(removed)
    }

    /// Remove a record and its descendants from the live projection.
    pub async fn unpublish(&self, id: DbId) -> DbResult<u64> {
        self.delete_from_stage(Stage::Live, id).await
    }

    /// Recreate a record's draft row from its most recent version entry.
    pub async fn restore_to_stage(&self, id: DbId, actor: Option<&Actor>) -> DbResult<Page> {
        let latest = self
            .store
            .latest_version(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "page version", id })?;
        self.restore_version(&latest, actor).await
    }

    /// Recreate a draft row from a specific version entry.
    ///
    /// Always writes to the draft projection, whatever stage the caller was
    /// reading. The restored page keeps its original id and class tag; its
    /// segment is re-deduplicated in case a sibling claimed it meanwhile,
    /// and a fresh version entry records the restore.
    pub async fn restore_version(
        &self,
        entry: &PageVersion,
        actor: Option<&Actor>,
    ) -> DbResult<Page> {
        self.registry.validate(&entry.class_name)?;

        let mut row = entry.to_row();
        let taken = self
            .store
            .sibling_segments(Stage::Draft, row.parent_id, row.id)
            .await?;
        row.url_segment = generate_segment(&row.url_segment, &taken, &self.reserved);
        row.author_id = actor.map(|a| a.id).unwrap_or(0);
        row.publisher_id = 0;

        let existing = self.store.get(Stage::Draft, row.id).await?;
        let now = Utc::now();
        row.created_at = existing.map(|r| r.created_at).unwrap_or(now);
        row.updated_at = now;

        let fresh = self.store.append_version(&NewVersion::from_row(&row)).await?;
        row.version = fresh.version;
        self.store.upsert(Stage::Draft, &row).await?;

        tracing::info!(
            id = row.id,
            from_version = entry.version,
            version = row.version,
            "restored page to draft"
        );
        Ok(Page::from_row(row))
    }

    // ── Derived state ────────────────────────────────────────────────

    /// Compute the derived stage flags for a record.
    pub async fn stage_state(&self, id: DbId) -> DbResult<StageState> {
        let draft = self.store.get(Stage::Draft, id).await?;
        let live = self.store.get(Stage::Live, id).await?;
        Ok(StageState {
            is_added_to_stage: draft.is_some() && live.is_none(),
            is_deleted_from_stage: draft.is_none(),
            is_modified_on_stage: match (&draft, &live) {
                (Some(d), Some(l)) => d.version != l.version,
                (Some(_), None) => true,
                (None, _) => false,
            },
        })
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Fetch a record in the given context: a projection read, or a
    /// point-in-time materialisation when an archive date is set.
    pub async fn get(&self, id: DbId, ctx: &ReadContext) -> DbResult<Option<Page>> {
        if let Some(at) = ctx.archive_at {
            let entry = self.store.version_as_of(id, at).await?;
            return Ok(entry.as_ref().map(Page::from_version));
        }
        Ok(self.store.get(ctx.stage, id).await?.map(Page::from_row))
    }

    /// Resolve a `/`-separated URL path, walking segment by segment from
    /// the top level through the requested projection.
    ///
    /// Returns `None` when any segment is missing, and equally when the
    /// optional extra filter excludes the final candidate.
    pub async fn resolve_by_url(
        &self,
        path: &str,
        ctx: &ReadContext,
        extra: Option<&PageFilter>,
    ) -> DbResult<Option<Page>> {
        let mut current: Option<PageRow> = None;
        let mut parent_id = ROOT_ID;
        let mut walked = false;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            walked = true;
            match self
                .store
                .child_by_segment(ctx.stage, parent_id, segment)
                .await?
            {
                None => return Ok(None),
                Some(row) => {
                    parent_id = row.id;
                    current = Some(row);
                }
            }
        }
        if !walked {
            return Ok(None);
        }
        let row = current.expect("walked paths always carry a row");
        if let Some(filter) = extra {
            if !filter(&row) {
                return Ok(None);
            }
        }
        Ok(Some(Page::from_row(row)))
    }

    // ── Version history ──────────────────────────────────────────────

    /// The most recent version entry for a record.
    pub async fn latest_version(&self, id: DbId) -> DbResult<Option<PageVersion>> {
        Ok(self.store.latest_version(id).await?)
    }

    /// Full version history for a record, newest first.
    pub async fn versions(&self, id: DbId) -> DbResult<Vec<PageVersion>> {
        Ok(self.store.versions(id).await?)
    }
}
