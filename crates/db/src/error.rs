//! Error types for the persistence layer.

use arbor_core::error::CoreError;

use crate::store::StoreError;

/// Failure of a stage, tree, or version operation.
///
/// Domain rejections (`Core`) happen before any write; storage failures
/// (`Store`) are fatal and leave no partial cascade visible.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for persistence-layer results.
pub type DbResult<T> = Result<T, DbError>;
