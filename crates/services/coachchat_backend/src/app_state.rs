//! Application state shared across all routes.

use coachchat_config::AppConfig;
use coachchat_db::{
    DbClient, DbError, NotificationLogRepository, NotificationLogRepositoryFactory,
    PushTokenRepository, PushTokenRepositoryFactory, RepositoryFactory,
    SqlNotificationLogRepository, SqlPushTokenRepository, SqlUserActivityRepository,
    UserActivityRepository, UserActivityRepositoryFactory,
};
use std::sync::Arc;
use tracing::info;

/// Shared state: the configuration plus the three notification repositories.
///
/// Built once at startup by the composition root and injected into every
/// handler, so tests can construct the same state over a scratch database.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub push_tokens: SqlPushTokenRepository,
    pub notification_logs: SqlNotificationLogRepository,
    pub user_activity: SqlUserActivityRepository,
}

impl AppState {
    /// Create the state from the application configuration.
    ///
    /// Connects the database client and initializes the schemas of all three
    /// tables.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, DbError> {
        let db_client = DbClient::new(&config).await?;
        Self::with_db_client(config, db_client).await
    }

    /// Create the state over an existing database client.
    pub async fn with_db_client(
        config: Arc<AppConfig>,
        db_client: DbClient,
    ) -> Result<Self, DbError> {
        let push_tokens =
            PushTokenRepositoryFactory::new().create_repository(db_client.clone());
        let notification_logs =
            NotificationLogRepositoryFactory::new().create_repository(db_client.clone());
        let user_activity =
            UserActivityRepositoryFactory::new().create_repository(db_client);

        push_tokens.init_schema().await?;
        notification_logs.init_schema().await?;
        user_activity.init_schema().await?;

        info!("Backend state initialized");
        Ok(Self {
            config,
            push_tokens,
            notification_logs,
            user_activity,
        })
    }
}
