//! Effective edit permission for tree nodes.
//!
//! A node's [`EditScope`] is evaluated where it is declared; `Inherit`
//! walks up the persisted parent links until an ancestor declares a grant.
//! The walk is cycle-guarded, and the default policy at an all-inheriting
//! root admits any authenticated actor. The result is a plain boolean;
//! disclosure policy (404 vs 403 shaping) belongs to the caller.

use std::collections::HashSet;

use arbor_core::actor::Actor;
use arbor_core::stage::ReadContext;
use arbor_core::types::{DbId, ROOT_ID};

use crate::error::DbResult;
use crate::models::Page;
use crate::store::PageStore;

/// Whether `actor` may edit the record with `id`, as observed in `ctx`.
///
/// A record absent from the projection resolves to the default policy.
pub async fn can_edit<S: PageStore>(
    store: &S,
    id: DbId,
    actor: Option<&Actor>,
    ctx: &ReadContext,
) -> DbResult<bool> {
    let mut visited: HashSet<DbId> = HashSet::new();
    let mut current = store.get(ctx.stage, id).await?;
    while let Some(row) = current {
        if !visited.insert(row.id) {
            break;
        }
        if let Some(decision) = row.edit_scope.allows(actor) {
            return Ok(decision);
        }
        if row.parent_id == ROOT_ID {
            break;
        }
        current = store.get(ctx.stage, row.parent_id).await?;
    }
    Ok(default_policy(actor))
}

/// Whether `actor` may edit a working page, saved or not.
///
/// The page's own scope is evaluated first; inheriting pages walk the
/// in-memory parent chain before falling back to the persisted links.
pub async fn can_edit_page<S: PageStore>(
    store: &S,
    page: &Page,
    actor: Option<&Actor>,
    ctx: &ReadContext,
) -> DbResult<bool> {
    let mut node = page;
    loop {
        if let Some(decision) = node.edit_scope.allows(actor) {
            return Ok(decision);
        }
        match node.parent() {
            Some(parent) => node = parent,
            None => break,
        }
    }
    match node.parent_id {
        Some(pid) if pid != ROOT_ID => can_edit(store, pid, actor, ctx).await,
        _ => Ok(default_policy(actor)),
    }
}

fn default_policy(actor: Option<&Actor>) -> bool {
    actor.is_some()
}
