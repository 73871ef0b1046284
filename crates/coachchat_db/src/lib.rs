//! Database integration for CoachChat
//!
//! This crate provides a database client that is designed to be database
//! agnostic, using SQLx as the underlying database library, plus the three
//! repositories backing the notification subsystem: push registration
//! tokens, the append-only notification log, and per-user chat activity.
//!
//! # Features
//!
//! - Database agnostic design (SQLite by default; PostgreSQL and MySQL via
//!   feature flags)
//! - Connection pooling
//! - Integration with the CoachChat configuration system
//!
//! # Example
//!
//! ```rust,no_run
//! use coachchat_db::{DbClient, PushTokenRepositoryFactory, RepositoryFactory};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let db_client = DbClient::from_url("sqlite:coachchat.db").await?;
//!     let tokens = PushTokenRepositoryFactory::new().create_repository(db_client);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod repositories;
pub mod repository;

// Re-export the client, factory, and repository traits for ease of use
pub use client::DbClient;
pub use error::DbError;
pub use factory::DbClientFactory;
pub use repository::RepositoryFactory;

// Re-export the repositories module components for ease of use
pub use repositories::{
    NotificationLogRepository, NotificationLogRepositoryFactory, PushTokenRepository,
    PushTokenRepositoryFactory, SqlNotificationLogRepository, SqlPushTokenRepository,
    SqlUserActivityRepository, UserActivityRepository, UserActivityRepositoryFactory,
};
