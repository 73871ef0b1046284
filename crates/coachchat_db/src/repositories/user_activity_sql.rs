//! SQL implementation of the user activity repository

use crate::error::DbError;
use crate::repositories::user_activity::{UserActivity, UserActivityRepository};
use crate::DbClient;
use chrono::{DateTime, Utc};
use coachchat_common::models::Platform;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// SQL implementation of the user activity repository
#[derive(Debug, Clone)]
pub struct SqlUserActivityRepository {
    /// The database client
    db_client: DbClient,
}

impl SqlUserActivityRepository {
    /// Create a new SQL user activity repository
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

// last_activity is stored as RFC 3339 text; the sqlx Any driver cannot bind
// or decode chrono types directly.
fn row_to_activity(row: &AnyRow) -> Result<UserActivity, DbError> {
    let platform: String = row
        .try_get("platform")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    let last_activity: String = row
        .try_get("last_activity")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    let last_activity: DateTime<Utc> = DateTime::parse_from_rfc3339(&last_activity)
        .map_err(|e| DbError::DecodeError(format!("invalid last_activity timestamp: {}", e)))?
        .with_timezone(&Utc);

    Ok(UserActivity {
        id: row.try_get("id").ok(),
        user_id: row.try_get("user_id").unwrap_or_default(),
        is_in_chat: row.try_get("is_in_chat").unwrap_or(false),
        last_activity,
        platform: platform
            .parse()
            .map_err(|e: String| DbError::DecodeError(e))?,
    })
}

impl UserActivityRepository for SqlUserActivityRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing user activity schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS user_activity (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                is_in_chat BOOLEAN NOT NULL,
                last_activity TEXT NOT NULL,
                platform TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, platform)
            )
        "#;

        self.db_client.execute(query).await?;

        info!("User activity schema initialized successfully");
        Ok(())
    }

    async fn upsert(&self, activity: UserActivity) -> Result<UserActivity, DbError> {
        debug!(
            "Upserting activity for user: {} on platform: {} (in_chat: {})",
            activity.user_id, activity.platform, activity.is_in_chat
        );

        let existing = self
            .find_by_user_and_platform(&activity.user_id, activity.platform)
            .await?;

        if existing.is_some() {
            let query = r#"
                UPDATE user_activity
                SET is_in_chat = $1, last_activity = $2, updated_at = CURRENT_TIMESTAMP
                WHERE user_id = $3 AND platform = $4
                RETURNING id, user_id, is_in_chat, last_activity, platform
            "#;

            let row = sqlx::query(query)
                .bind(activity.is_in_chat)
                .bind(activity.last_activity.to_rfc3339())
                .bind(&activity.user_id)
                .bind(activity.platform.to_string())
                .fetch_one(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to update user activity: {}", e);
                    DbError::QueryError(e.to_string())
                })?;

            row_to_activity(&row)
        } else {
            let query = r#"
                INSERT INTO user_activity (user_id, is_in_chat, last_activity, platform)
                VALUES ($1, $2, $3, $4)
                RETURNING id, user_id, is_in_chat, last_activity, platform
            "#;

            let row = sqlx::query(query)
                .bind(&activity.user_id)
                .bind(activity.is_in_chat)
                .bind(activity.last_activity.to_rfc3339())
                .bind(activity.platform.to_string())
                .fetch_one(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to insert user activity: {}", e);
                    DbError::QueryError(e.to_string())
                })?;

            row_to_activity(&row)
        }
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<UserActivity>, DbError> {
        debug!("Finding activity for user: {}", user_id);

        // RFC 3339 UTC timestamps sort lexicographically in chronological
        // order, so the string comparison picks the most recent platform.
        let query = r#"
            SELECT id, user_id, is_in_chat, last_activity, platform
            FROM user_activity
            WHERE user_id = $1
            ORDER BY last_activity DESC
            LIMIT 1
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find user activity: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        result.as_ref().map(row_to_activity).transpose()
    }

    async fn find_by_user_and_platform(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<UserActivity>, DbError> {
        let query = r#"
            SELECT id, user_id, is_in_chat, last_activity, platform
            FROM user_activity
            WHERE user_id = $1 AND platform = $2
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .bind(platform.to_string())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find user activity: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        result.as_ref().map(row_to_activity).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn activity(user_id: &str, in_chat: bool, at: DateTime<Utc>) -> UserActivity {
        UserActivity {
            id: None,
            user_id: user_id.to_string(),
            is_in_chat: in_chat,
            last_activity: at,
            platform: Platform::Android,
        }
    }

    async fn test_repo() -> (SqlUserActivityRepository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/activity.db", dir.path().display());
        let client = DbClient::from_url(&url).await.unwrap();
        let repo = SqlUserActivityRepository::new(client);
        repo.init_schema().await.unwrap();
        (repo, dir)
    }

    #[tokio::test]
    async fn upsert_overwrites_the_single_record_per_pair() {
        let (repo, _dir) = test_repo().await;
        let now = Utc::now();

        repo.upsert(activity("user-1", true, now)).await.unwrap();
        repo.upsert(activity("user-1", false, now + Duration::seconds(5)))
            .await
            .unwrap();

        let stored = repo
            .find_by_user_and_platform("user-1", Platform::Android)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.is_in_chat);
        assert_eq!(stored.last_activity, now + Duration::seconds(5));
    }

    #[tokio::test]
    async fn find_by_user_picks_the_most_recent_platform() {
        let (repo, _dir) = test_repo().await;
        let now = Utc::now();

        let mut ios = activity("user-1", true, now + Duration::seconds(30));
        ios.platform = Platform::Ios;

        repo.upsert(activity("user-1", false, now)).await.unwrap();
        repo.upsert(ios).await.unwrap();

        let latest = repo.find_by_user("user-1").await.unwrap().unwrap();
        assert_eq!(latest.platform, Platform::Ios);
        assert!(latest.is_in_chat);
    }

    #[tokio::test]
    async fn missing_user_yields_none() {
        let (repo, _dir) = test_repo().await;
        assert!(repo.find_by_user("nobody").await.unwrap().is_none());
    }
}
