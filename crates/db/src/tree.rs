//! Stage-aware tree traversal.
//!
//! Parent/child relationships are derived from the persisted `parent_id`
//! links of whichever projection a [`ReadContext`] names, with two special
//! cases: an unsaved page (`id == 0`) lists the top-level pages, and a
//! parent attached in memory via [`Page::set_parent`] wins over a re-fetch.

use std::collections::{BTreeMap, HashSet, VecDeque};

use arbor_core::stage::{ReadContext, Stage};
use arbor_core::types::{DbId, ROOT_ID};

use crate::error::DbResult;
use crate::models::{Page, PageRow};
use crate::store::PageStore;

/// Direct children of a page, as observed in the given context.
///
/// An unsaved page reads as the root: its children are the top-level rows.
pub async fn children_of<S: PageStore>(
    store: &S,
    page: &Page,
    ctx: &ReadContext,
) -> DbResult<Vec<PageRow>> {
    children_by_id(store, page.id, ctx).await
}

/// Direct children of the record with `id`, as observed in the given
/// context. With an archive date set, children come from the latest
/// version snapshots at that instant.
pub async fn children_by_id<S: PageStore>(
    store: &S,
    id: DbId,
    ctx: &ReadContext,
) -> DbResult<Vec<PageRow>> {
    if let Some(at) = ctx.archive_at {
        let mut rows: Vec<PageRow> = store
            .versions_as_of_by_parent(id, at)
            .await?
            .iter()
            .map(|v| v.to_row())
            .collect();
        rows.sort_by_key(|r| (r.sort, r.id));
        return Ok(rows);
    }
    Ok(store.children(ctx.stage, id).await?)
}

/// Union of a record's draft children, live children, and version-history
/// children that are gone from both projections, deduplicated by id.
pub async fn all_children_including_deleted<S: PageStore>(
    store: &S,
    id: DbId,
) -> DbResult<Vec<PageRow>> {
    let mut seen: BTreeMap<DbId, PageRow> = BTreeMap::new();
    for row in store.children(Stage::Draft, id).await? {
        seen.insert(row.id, row);
    }
    for row in store.children(Stage::Live, id).await? {
        seen.entry(row.id).or_insert(row);
    }
    for entry in store.versions_latest_by_parent(id).await? {
        seen.entry(entry.record_id).or_insert_with(|| entry.to_row());
    }
    let mut rows: Vec<PageRow> = seen.into_values().collect();
    rows.sort_by_key(|r| (r.sort, r.id));
    Ok(rows)
}

/// The parent of a page: the in-memory reference when one was attached,
/// otherwise a projection fetch of `parent_id`.
pub async fn parent_of<S: PageStore>(
    store: &S,
    page: &Page,
    ctx: &ReadContext,
) -> DbResult<Option<Page>> {
    if let Some(held) = page.parent() {
        return Ok(Some(held.clone()));
    }
    match page.parent_id {
        None => Ok(None),
        Some(pid) => Ok(store.get(ctx.stage, pid).await?.map(Page::from_row)),
    }
}

/// The record plus all its transitive descendants in one projection,
/// breadth-first. Cycle-safe: a corrupt parent link cannot loop.
pub async fn subtree_ids<S: PageStore>(
    store: &S,
    stage: Stage,
    id: DbId,
) -> DbResult<Vec<DbId>> {
    let mut ids = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([id]);
    while let Some(current) = queue.pop_front() {
        if current == ROOT_ID || !visited.insert(current) {
            continue;
        }
        ids.push(current);
        for child in store.children(stage, current).await? {
            queue.push_back(child.id);
        }
    }
    Ok(ids)
}
