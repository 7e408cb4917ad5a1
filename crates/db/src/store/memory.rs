//! In-memory [`PageStore`] backend.
//!
//! Backs the test suite and embedded use. The store-wide write lock is both
//! the per-record version serialization point and the atomicity boundary
//! for batch deletes.

use std::collections::{BTreeMap, HashSet};

use arbor_core::stage::Stage;
use arbor_core::types::{DbId, Timestamp};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::{NewVersion, PageRow, PageVersion};
use crate::store::{PageStore, StoreError};

#[derive(Default)]
struct Inner {
    next_id: DbId,
    draft: BTreeMap<DbId, PageRow>,
    live: BTreeMap<DbId, PageRow>,
    versions: BTreeMap<DbId, Vec<PageVersion>>,
}

impl Inner {
    fn table(&self, stage: Stage) -> &BTreeMap<DbId, PageRow> {
        match stage {
            Stage::Draft => &self.draft,
            Stage::Live => &self.live,
        }
    }

    fn table_mut(&mut self, stage: Stage) -> &mut BTreeMap<DbId, PageRow> {
        match stage {
            Stage::Draft => &mut self.draft,
            Stage::Live => &mut self.live,
        }
    }

    fn latest_as_of(&self, record_id: DbId, at: Timestamp) -> Option<&PageVersion> {
        self.versions
            .get(&record_id)?
            .iter()
            .rev()
            .find(|v| v.created_at <= at)
    }
}

/// In-memory page store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

fn sorted(mut rows: Vec<PageRow>) -> Vec<PageRow> {
    rows.sort_by_key(|r| (r.sort, r.id));
    rows
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn allocate_id(&self) -> Result<DbId, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        Ok(inner.next_id)
    }

    async fn get(&self, stage: Stage, id: DbId) -> Result<Option<PageRow>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.table(stage).get(&id).cloned())
    }

    async fn upsert(&self, stage: Stage, row: &PageRow) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.table_mut(stage).insert(row.id, row.clone());
        Ok(())
    }

    async fn delete_many(&self, stage: Stage, ids: &[DbId]) -> Result<u64, StoreError> {
        // One write-lock critical section: observers see the whole batch
        // removed or none of it.
        let mut inner = self.inner.write().await;
        let table = inner.table_mut(stage);
        let mut removed = 0;
        for id in ids {
            if table.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn children(&self, stage: Stage, parent_id: DbId) -> Result<Vec<PageRow>, StoreError> {
        let inner = self.inner.read().await;
        let rows = inner
            .table(stage)
            .values()
            .filter(|r| r.parent_id == parent_id)
            .cloned()
            .collect();
        Ok(sorted(rows))
    }

    async fn child_by_segment(
        &self,
        stage: Stage,
        parent_id: DbId,
        segment: &str,
    ) -> Result<Option<PageRow>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .table(stage)
            .values()
            .find(|r| r.parent_id == parent_id && r.url_segment == segment)
            .cloned())
    }

    async fn sibling_segments(
        &self,
        stage: Stage,
        parent_id: DbId,
        exclude: DbId,
    ) -> Result<HashSet<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .table(stage)
            .values()
            .filter(|r| r.parent_id == parent_id && r.id != exclude)
            .map(|r| r.url_segment.clone())
            .collect())
    }

    async fn append_version(&self, new: &NewVersion) -> Result<PageVersion, StoreError> {
        let mut inner = self.inner.write().await;
        let history = inner.versions.entry(new.record_id).or_default();
        let version = history.last().map(|v| v.version + 1).unwrap_or(1);
        let entry = PageVersion {
            record_id: new.record_id,
            version,
            class_name: new.class_name.clone(),
            title: new.title.clone(),
            url_segment: new.url_segment.clone(),
            parent_id: new.parent_id,
            sort: new.sort,
            content: new.content.clone(),
            edit_scope: new.edit_scope.clone(),
            author_id: new.author_id,
            publisher_id: new.publisher_id,
            created_at: Utc::now(),
        };
        history.push(entry.clone());
        Ok(entry)
    }

    async fn latest_version(&self, record_id: DbId) -> Result<Option<PageVersion>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .versions
            .get(&record_id)
            .and_then(|h| h.last())
            .cloned())
    }

    async fn version_as_of(
        &self,
        record_id: DbId,
        at: Timestamp,
    ) -> Result<Option<PageVersion>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.latest_as_of(record_id, at).cloned())
    }

    async fn versions(&self, record_id: DbId) -> Result<Vec<PageVersion>, StoreError> {
        let inner = self.inner.read().await;
        let mut history = inner.versions.get(&record_id).cloned().unwrap_or_default();
        history.reverse();
        Ok(history)
    }

    async fn versions_latest_by_parent(
        &self,
        parent_id: DbId,
    ) -> Result<Vec<PageVersion>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .versions
            .values()
            .filter_map(|h| h.last())
            .filter(|v| v.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn versions_as_of_by_parent(
        &self,
        parent_id: DbId,
        at: Timestamp,
    ) -> Result<Vec<PageVersion>, StoreError> {
        let inner = self.inner.read().await;
        let record_ids: Vec<DbId> = inner.versions.keys().copied().collect();
        Ok(record_ids
            .into_iter()
            .filter_map(|id| inner.latest_as_of(id, at))
            .filter(|v| v.parent_id == parent_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: DbId, parent_id: DbId, segment: &str) -> PageRow {
        let now = Utc::now();
        PageRow {
            id,
            class_name: "Page".to_string(),
            title: segment.to_string(),
            url_segment: segment.to_string(),
            parent_id,
            sort: 0,
            content: json!({}),
            edit_scope: Default::default(),
            version: 1,
            author_id: 0,
            publisher_id: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn allocated_ids_are_unique_and_increasing() {
        let store = MemoryStore::new();
        let a = store.allocate_id().await.unwrap();
        let b = store.allocate_id().await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn projections_are_independent() {
        let store = MemoryStore::new();
        store.upsert(Stage::Draft, &row(1, 0, "home")).await.unwrap();

        assert!(store.get(Stage::Draft, 1).await.unwrap().is_some());
        assert!(store.get(Stage::Live, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn version_numbers_are_serialized_under_concurrency() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let new = NewVersion::from_row(&row(1, 0, "home"));
                store.append_version(&new).await.unwrap().version
            }));
        }
        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=8).collect::<Vec<i32>>());
    }

    #[tokio::test]
    async fn delete_many_reports_rows_actually_removed() {
        let store = MemoryStore::new();
        store.upsert(Stage::Draft, &row(1, 0, "a")).await.unwrap();
        store.upsert(Stage::Draft, &row(2, 0, "b")).await.unwrap();

        let removed = store.delete_many(Stage::Draft, &[1, 2, 99]).await.unwrap();
        assert_eq!(removed, 2);
    }
}
