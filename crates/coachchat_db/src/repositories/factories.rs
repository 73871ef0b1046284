//! Factories for creating repository instances
//!
//! Each factory builds the SQL implementation of one repository from a
//! database client, through the shared [`RepositoryFactory`] trait so
//! composition roots stay independent of the concrete types.

use crate::repositories::notification_log_sql::SqlNotificationLogRepository;
use crate::repositories::push_token_sql::SqlPushTokenRepository;
use crate::repositories::user_activity_sql::SqlUserActivityRepository;
use crate::{DbClient, RepositoryFactory};

/// Factory for creating push token repositories
#[derive(Debug, Clone, Default)]
pub struct PushTokenRepositoryFactory;

impl PushTokenRepositoryFactory {
    /// Create a new push token repository factory
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<SqlPushTokenRepository, DbClient> for PushTokenRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlPushTokenRepository {
        SqlPushTokenRepository::new(db_client)
    }
}

/// Factory for creating notification log repositories
#[derive(Debug, Clone, Default)]
pub struct NotificationLogRepositoryFactory;

impl NotificationLogRepositoryFactory {
    /// Create a new notification log repository factory
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<SqlNotificationLogRepository, DbClient> for NotificationLogRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlNotificationLogRepository {
        SqlNotificationLogRepository::new(db_client)
    }
}

/// Factory for creating user activity repositories
#[derive(Debug, Clone, Default)]
pub struct UserActivityRepositoryFactory;

impl UserActivityRepositoryFactory {
    /// Create a new user activity repository factory
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<SqlUserActivityRepository, DbClient> for UserActivityRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlUserActivityRepository {
        SqlUserActivityRepository::new(db_client)
    }
}
