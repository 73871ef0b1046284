//! Repository for push registration tokens
//!
//! This module provides a generic interface for storing and retrieving push
//! registration records in the `notification_tokens` table.

use crate::error::DbError;

// Re-export RegisteredDevice from coachchat_common for convenience
pub use coachchat_common::models::RegisteredDevice;
use coachchat_common::models::Platform;

/// Repository for push registration tokens.
///
/// At most one record per `(user_id, platform)` pair is active at a time.
/// An upsert deactivates the previous active record before inserting the new
/// one — superseded registrations are kept for audit, never deleted.
pub trait PushTokenRepository {
    /// Initialize the database schema.
    ///
    /// Creates the `notification_tokens` table if it doesn't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Store a push registration.
    ///
    /// Any active registration for the same `(user_id, platform)` pair is
    /// deactivated first, so the invariant of one active record per pair
    /// holds no matter how often this is called.
    ///
    /// # Returns
    ///
    /// The stored registration with its id set.
    fn upsert_token(
        &self,
        device: RegisteredDevice,
    ) -> impl std::future::Future<Output = Result<RegisteredDevice, DbError>> + Send;

    /// Find all active registrations for a user, oldest first.
    fn find_active_by_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<RegisteredDevice>, DbError>> + Send;

    /// Find the active registration for a `(user_id, platform)` pair.
    fn find_active_by_user_and_platform(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> impl std::future::Future<Output = Result<Option<RegisteredDevice>, DbError>> + Send;

    /// Deactivate all active registrations for a `(user_id, platform)` pair.
    ///
    /// # Returns
    ///
    /// `true` if at least one registration was deactivated.
    fn deactivate_tokens(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}
