pub mod address;
pub mod connection;
pub mod migration;
pub mod transaction;

pub use address::AddressRegistry;
pub use transaction::{IdempotencyLedger, RecordOutcome};

/// Returns true when the error is a primary-key / unique-index violation.
/// Both MySQL and SQLite report these through `DatabaseError::kind`.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

pub(crate) fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
