//! Postgres [`PageStore`] backend.
//!
//! Schema lives in `db/migrations`. Projection tables are addressed through
//! [`Stage::table`]; the version history is `page_versions`, append-only,
//! keyed by `(record_id, version)`. Version numbers are assigned with
//! `COALESCE(MAX(version), 0) + 1` inside a transaction that holds a
//! per-record advisory lock, so concurrent writers never share a number.

use std::collections::HashSet;

use arbor_core::stage::Stage;
use arbor_core::types::{DbId, Timestamp};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::models::{NewVersion, PageRow, PageVersion};
use crate::store::{PageStore, StoreError};

/// Column list shared across projection queries to avoid repetition.
const PAGE_COLUMNS: &str = "id, class_name, title, url_segment, parent_id, sort, \
    content, edit_scope, version, author_id, publisher_id, created_at, updated_at";

/// Column list shared across version-history queries.
const VERSION_COLUMNS: &str = "record_id, version, class_name, title, url_segment, \
    parent_id, sort, content, edit_scope, author_id, publisher_id, created_at";

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Raw projection row; `edit_scope` decodes from JSONB after the fetch.
#[derive(Debug, FromRow)]
struct PgPage {
    id: DbId,
    class_name: String,
    title: String,
    url_segment: String,
    parent_id: DbId,
    sort: i32,
    content: JsonValue,
    edit_scope: JsonValue,
    version: i32,
    author_id: DbId,
    publisher_id: DbId,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl TryFrom<PgPage> for PageRow {
    type Error = StoreError;

    fn try_from(raw: PgPage) -> Result<Self, StoreError> {
        Ok(PageRow {
            id: raw.id,
            class_name: raw.class_name,
            title: raw.title,
            url_segment: raw.url_segment,
            parent_id: raw.parent_id,
            sort: raw.sort,
            content: raw.content,
            edit_scope: serde_json::from_value(raw.edit_scope)?,
            version: raw.version,
            author_id: raw.author_id,
            publisher_id: raw.publisher_id,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

/// Raw version row; `edit_scope` decodes from JSONB after the fetch.
#[derive(Debug, FromRow)]
struct PgVersion {
    record_id: DbId,
    version: i32,
    class_name: String,
    title: String,
    url_segment: String,
    parent_id: DbId,
    sort: i32,
    content: JsonValue,
    edit_scope: JsonValue,
    author_id: DbId,
    publisher_id: DbId,
    created_at: Timestamp,
}

impl TryFrom<PgVersion> for PageVersion {
    type Error = StoreError;

    fn try_from(raw: PgVersion) -> Result<Self, StoreError> {
        Ok(PageVersion {
            record_id: raw.record_id,
            version: raw.version,
            class_name: raw.class_name,
            title: raw.title,
            url_segment: raw.url_segment,
            parent_id: raw.parent_id,
            sort: raw.sort,
            content: raw.content,
            edit_scope: serde_json::from_value(raw.edit_scope)?,
            author_id: raw.author_id,
            publisher_id: raw.publisher_id,
            created_at: raw.created_at,
        })
    }
}

fn rows_from(raw: Vec<PgPage>) -> Result<Vec<PageRow>, StoreError> {
    raw.into_iter().map(PageRow::try_from).collect()
}

fn versions_from(raw: Vec<PgVersion>) -> Result<Vec<PageVersion>, StoreError> {
    raw.into_iter().map(PageVersion::try_from).collect()
}

/// Postgres page store over a shared connection pool.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PageStore for PostgresStore {
    async fn allocate_id(&self) -> Result<DbId, StoreError> {
        let row: (DbId,) = sqlx::query_as("SELECT nextval('page_ids')")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn get(&self, stage: Stage, id: DbId) -> Result<Option<PageRow>, StoreError> {
        let query = format!(
            "SELECT {PAGE_COLUMNS} FROM {table} WHERE id = $1",
            table = stage.table()
        );
        let raw = sqlx::query_as::<_, PgPage>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        raw.map(PageRow::try_from).transpose()
    }

    async fn upsert(&self, stage: Stage, row: &PageRow) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO {table}
                (id, class_name, title, url_segment, parent_id, sort, content,
                 edit_scope, version, author_id, publisher_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (id) DO UPDATE SET
                class_name = EXCLUDED.class_name,
                title = EXCLUDED.title,
                url_segment = EXCLUDED.url_segment,
                parent_id = EXCLUDED.parent_id,
                sort = EXCLUDED.sort,
                content = EXCLUDED.content,
                edit_scope = EXCLUDED.edit_scope,
                version = EXCLUDED.version,
                author_id = EXCLUDED.author_id,
                publisher_id = EXCLUDED.publisher_id,
                updated_at = EXCLUDED.updated_at",
            table = stage.table()
        );
        sqlx::query(&query)
            .bind(row.id)
            .bind(&row.class_name)
            .bind(&row.title)
            .bind(&row.url_segment)
            .bind(row.parent_id)
            .bind(row.sort)
            .bind(&row.content)
            .bind(serde_json::to_value(&row.edit_scope)?)
            .bind(row.version)
            .bind(row.author_id)
            .bind(row.publisher_id)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_many(&self, stage: Stage, ids: &[DbId]) -> Result<u64, StoreError> {
        // Single statement: the whole batch vanishes atomically.
        let query = format!("DELETE FROM {table} WHERE id = ANY($1)", table = stage.table());
        let result = sqlx::query(&query).bind(ids).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn children(&self, stage: Stage, parent_id: DbId) -> Result<Vec<PageRow>, StoreError> {
        let query = format!(
            "SELECT {PAGE_COLUMNS} FROM {table} WHERE parent_id = $1 ORDER BY sort, id",
            table = stage.table()
        );
        let raw = sqlx::query_as::<_, PgPage>(&query)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;
        rows_from(raw)
    }

    async fn child_by_segment(
        &self,
        stage: Stage,
        parent_id: DbId,
        segment: &str,
    ) -> Result<Option<PageRow>, StoreError> {
        let query = format!(
            "SELECT {PAGE_COLUMNS} FROM {table} WHERE parent_id = $1 AND url_segment = $2",
            table = stage.table()
        );
        let raw = sqlx::query_as::<_, PgPage>(&query)
            .bind(parent_id)
            .bind(segment)
            .fetch_optional(&self.pool)
            .await?;
        raw.map(PageRow::try_from).transpose()
    }

    async fn sibling_segments(
        &self,
        stage: Stage,
        parent_id: DbId,
        exclude: DbId,
    ) -> Result<HashSet<String>, StoreError> {
        let query = format!(
            "SELECT url_segment FROM {table} WHERE parent_id = $1 AND id <> $2",
            table = stage.table()
        );
        let rows: Vec<(String,)> = sqlx::query_as(&query)
            .bind(parent_id)
            .bind(exclude)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn append_version(&self, new: &NewVersion) -> Result<PageVersion, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Per-record serialization point for "read max, insert next".
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(new.record_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO page_versions
                (record_id, version, class_name, title, url_segment, parent_id,
                 sort, content, edit_scope, author_id, publisher_id)
             VALUES (
                $1,
                (SELECT COALESCE(MAX(version), 0) + 1 FROM page_versions WHERE record_id = $1),
                $2, $3, $4, $5, $6, $7, $8, $9, $10
             )
             RETURNING {VERSION_COLUMNS}"
        );
        let raw = sqlx::query_as::<_, PgVersion>(&query)
            .bind(new.record_id)
            .bind(&new.class_name)
            .bind(&new.title)
            .bind(&new.url_segment)
            .bind(new.parent_id)
            .bind(new.sort)
            .bind(&new.content)
            .bind(serde_json::to_value(&new.edit_scope)?)
            .bind(new.author_id)
            .bind(new.publisher_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        raw.try_into()
    }

    async fn latest_version(&self, record_id: DbId) -> Result<Option<PageVersion>, StoreError> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM page_versions
             WHERE record_id = $1
             ORDER BY version DESC
             LIMIT 1"
        );
        let raw = sqlx::query_as::<_, PgVersion>(&query)
            .bind(record_id)
            .fetch_optional(&self.pool)
            .await?;
        raw.map(PageVersion::try_from).transpose()
    }

    async fn version_as_of(
        &self,
        record_id: DbId,
        at: Timestamp,
    ) -> Result<Option<PageVersion>, StoreError> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM page_versions
             WHERE record_id = $1 AND created_at <= $2
             ORDER BY version DESC
             LIMIT 1"
        );
        let raw = sqlx::query_as::<_, PgVersion>(&query)
            .bind(record_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;
        raw.map(PageVersion::try_from).transpose()
    }

    async fn versions(&self, record_id: DbId) -> Result<Vec<PageVersion>, StoreError> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM page_versions
             WHERE record_id = $1
             ORDER BY version DESC"
        );
        let raw = sqlx::query_as::<_, PgVersion>(&query)
            .bind(record_id)
            .fetch_all(&self.pool)
            .await?;
        versions_from(raw)
    }

    async fn versions_latest_by_parent(
        &self,
        parent_id: DbId,
    ) -> Result<Vec<PageVersion>, StoreError> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM (
                SELECT DISTINCT ON (record_id) {VERSION_COLUMNS}
                FROM page_versions
                ORDER BY record_id, version DESC
             ) latest
             WHERE parent_id = $1"
        );
        let raw = sqlx::query_as::<_, PgVersion>(&query)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;
        versions_from(raw)
    }

    async fn versions_as_of_by_parent(
        &self,
        parent_id: DbId,
        at: Timestamp,
    ) -> Result<Vec<PageVersion>, StoreError> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM (
                SELECT DISTINCT ON (record_id) {VERSION_COLUMNS}
                FROM page_versions
                WHERE created_at <= $2
                ORDER BY record_id, version DESC
             ) latest
             WHERE parent_id = $1"
        );
        let raw = sqlx::query_as::<_, PgVersion>(&query)
            .bind(parent_id)
            .bind(at)
            .fetch_all(&self.pool)
            .await?;
        versions_from(raw)
    }
}
