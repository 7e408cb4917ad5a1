//! Persistence layer for the arbor versioned page tree.
//!
//! Exposes the building blocks the host application composes:
//!
//! - [`StageManager`] — every draft/live transition and lookup.
//! - [`tree`] — stage-aware parent/child traversal.
//! - [`perms`] — effective edit permission with inheritance.
//! - [`PageStore`] — the storage seam, with [`PostgresStore`] for
//!   production and [`MemoryStore`] for tests and embedded use.

pub mod error;
pub mod manager;
pub mod models;
pub mod perms;
pub mod store;
pub mod tree;

pub use error::{DbError, DbResult};
pub use manager::{StageManager, StageState};
pub use models::{NewVersion, Page, PageRow, PageVersion};
pub use store::memory::MemoryStore;
pub use store::postgres::{create_pool, PostgresStore};
pub use store::{PageStore, StoreError};
