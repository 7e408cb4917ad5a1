use crate::types::DbId;

/// Domain-level error taxonomy.
///
/// Recoverable absence is expressed as `Option` at call sites and never as
/// an error; these variants cover rejected writes, duplicate registrations,
/// and operations aimed at records that do not exist.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}
