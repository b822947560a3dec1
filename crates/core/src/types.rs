/// All database primary keys are PostgreSQL BIGSERIAL, except job ids
/// which are caller-supplied text (see [`JobId`]).
pub type DbId = i64;

/// Generation job identifier. Caller-supplied so that resubmitting the
/// same message is idempotent.
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
