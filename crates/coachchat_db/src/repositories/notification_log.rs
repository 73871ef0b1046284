//! Repository for notification logs
//!
//! The `notification_logs` table is append-only: entries are written once at
//! the moment the dispatcher determines an outcome and are never modified or
//! deleted afterwards. There is intentionally no update or delete operation
//! on this trait.

use crate::error::DbError;

// Re-export NotificationLogEntry from coachchat_common for convenience
pub use coachchat_common::models::NotificationLogEntry;

/// Repository for the append-only notification log.
pub trait NotificationLogRepository {
    /// Initialize the database schema.
    ///
    /// Creates the `notification_logs` table if it doesn't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Append one log entry.
    ///
    /// # Returns
    ///
    /// The stored entry with its id set.
    fn append(
        &self,
        entry: NotificationLogEntry,
    ) -> impl std::future::Future<Output = Result<NotificationLogEntry, DbError>> + Send;

    /// Find the most recent entries for a user, newest first.
    fn find_recent_by_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<NotificationLogEntry>, DbError>> + Send;
}
