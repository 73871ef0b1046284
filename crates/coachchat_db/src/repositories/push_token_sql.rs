//! SQL implementation of the push token repository

use crate::error::DbError;
use crate::repositories::push_token::{PushTokenRepository, RegisteredDevice};
use crate::DbClient;
use coachchat_common::models::Platform;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// SQL implementation of the push token repository
#[derive(Debug, Clone)]
pub struct SqlPushTokenRepository {
    /// The database client
    db_client: DbClient,
}

impl SqlPushTokenRepository {
    /// Create a new SQL push token repository
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn row_to_device(row: &AnyRow) -> Result<RegisteredDevice, DbError> {
    let platform: String = row
        .try_get("platform")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    let token_kind: String = row
        .try_get("token_type")
        .map_err(|e| DbError::QueryError(e.to_string()))?;

    Ok(RegisteredDevice {
        id: row.try_get("id").ok(),
        user_id: row.try_get("user_id").unwrap_or_default(),
        token: row.try_get("token").unwrap_or_default(),
        platform: platform
            .parse()
            .map_err(|e: String| DbError::DecodeError(e))?,
        token_kind: token_kind
            .parse()
            .map_err(|e: String| DbError::DecodeError(e))?,
        is_active: row.try_get("is_active").unwrap_or(false),
        created_at: None, // DateTime<Utc> doesn't implement Decode for sqlx::Any
        updated_at: None, // DateTime<Utc> doesn't implement Decode for sqlx::Any
    })
}

impl PushTokenRepository for SqlPushTokenRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing push token schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS notification_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                token TEXT NOT NULL,
                platform TEXT NOT NULL,
                token_type TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Push token schema initialized successfully");
        Ok(())
    }

    async fn upsert_token(&self, device: RegisteredDevice) -> Result<RegisteredDevice, DbError> {
        debug!(
            "Registering push token for user: {} on platform: {}",
            device.user_id, device.platform
        );

        // Supersede any currently active registration for this pair first;
        // the old row stays behind deactivated.
        let deactivate = r#"
            UPDATE notification_tokens
            SET is_active = FALSE, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $1 AND platform = $2 AND is_active = TRUE
        "#;

        sqlx::query(deactivate)
            .bind(&device.user_id)
            .bind(device.platform.to_string())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to deactivate previous push tokens: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let insert = r#"
            INSERT INTO notification_tokens (user_id, token, platform, token_type, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, user_id, token, platform, token_type, is_active
        "#;

        let row = sqlx::query(insert)
            .bind(&device.user_id)
            .bind(&device.token)
            .bind(device.platform.to_string())
            .bind(device.token_kind.to_string())
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert push token: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let inserted = row_to_device(&row)?;

        info!("Push token registered successfully");
        Ok(inserted)
    }

    async fn find_active_by_user(&self, user_id: &str) -> Result<Vec<RegisteredDevice>, DbError> {
        debug!("Finding active push tokens for user: {}", user_id);

        let query = r#"
            SELECT id, user_id, token, platform, token_type, is_active
            FROM notification_tokens
            WHERE user_id = $1 AND is_active = TRUE
            ORDER BY id
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find push tokens: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(row_to_device).collect()
    }

    async fn find_active_by_user_and_platform(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<RegisteredDevice>, DbError> {
        debug!(
            "Finding active push token for user: {} on platform: {}",
            user_id, platform
        );

        let query = r#"
            SELECT id, user_id, token, platform, token_type, is_active
            FROM notification_tokens
            WHERE user_id = $1 AND platform = $2 AND is_active = TRUE
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .bind(platform.to_string())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find push token: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        result.as_ref().map(row_to_device).transpose()
    }

    async fn deactivate_tokens(&self, user_id: &str, platform: Platform) -> Result<bool, DbError> {
        debug!(
            "Deactivating push tokens for user: {} on platform: {}",
            user_id, platform
        );

        let query = r#"
            UPDATE notification_tokens
            SET is_active = FALSE, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $1 AND platform = $2 AND is_active = TRUE
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .bind(platform.to_string())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to deactivate push tokens: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}
