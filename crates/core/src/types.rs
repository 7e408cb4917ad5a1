/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Parent id of top-level pages; no record ever carries this id itself.
pub const ROOT_ID: DbId = 0;
