//! Domain types and pure logic for the arbor versioned page tree.
//!
//! Everything here is database-free: the error taxonomy, id/timestamp
//! aliases, the stage/read-context model, actors and edit scopes, the
//! URL-segment generator, and the page-class registry. The persistence
//! layer lives in `arbor-db`.

pub mod actor;
pub mod error;
pub mod registry;
pub mod slug;
pub mod stage;
pub mod types;
