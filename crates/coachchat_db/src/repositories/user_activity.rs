//! Repository for user activity state
//!
//! The `user_activity` table holds exactly one current record per
//! `(user_id, platform)` pair: whether that user is currently viewing the
//! chat screen, and when they were last active. Records are only ever
//! overwritten, never deleted.
//!
//! The tracker that writes through this repository is the single writer per
//! user and guarantees that `last_activity` never moves backwards; the
//! repository stores what it is handed.

use crate::error::DbError;

// Re-export UserActivity from coachchat_common for convenience
pub use coachchat_common::models::UserActivity;
use coachchat_common::models::Platform;

/// Repository for per-user chat activity state.
pub trait UserActivityRepository {
    /// Initialize the database schema.
    ///
    /// Creates the `user_activity` table if it doesn't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Upsert the activity record for a `(user_id, platform)` pair.
    ///
    /// # Returns
    ///
    /// The stored record with its id set.
    fn upsert(
        &self,
        activity: UserActivity,
    ) -> impl std::future::Future<Output = Result<UserActivity, DbError>> + Send;

    /// Find the most recently active record for a user across platforms.
    fn find_by_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserActivity>, DbError>> + Send;

    /// Find the activity record for a `(user_id, platform)` pair.
    fn find_by_user_and_platform(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> impl std::future::Future<Output = Result<Option<UserActivity>, DbError>> + Send;
}
