//! Repository modules for database access
//!
//! This module contains repository traits and implementations for the three
//! notification tables: push tokens, notification logs, and user activity.

pub mod factories;
pub mod notification_log;
pub mod notification_log_sql;
pub mod push_token;
pub mod push_token_sql;
pub mod user_activity;
pub mod user_activity_sql;

// Re-export the repositories and factories for ease of use
pub use factories::{
    NotificationLogRepositoryFactory, PushTokenRepositoryFactory, UserActivityRepositoryFactory,
};
pub use notification_log::NotificationLogRepository;
pub use notification_log_sql::SqlNotificationLogRepository;
pub use push_token::PushTokenRepository;
pub use push_token_sql::SqlPushTokenRepository;
pub use user_activity::UserActivityRepository;
pub use user_activity_sql::SqlUserActivityRepository;
