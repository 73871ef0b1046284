//! SQL implementation of the notification log repository

use crate::error::DbError;
use crate::repositories::notification_log::{NotificationLogEntry, NotificationLogRepository};
use crate::DbClient;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// SQL implementation of the notification log repository
#[derive(Debug, Clone)]
pub struct SqlNotificationLogRepository {
    /// The database client
    db_client: DbClient,
}

impl SqlNotificationLogRepository {
    /// Create a new SQL notification log repository
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn row_to_entry(row: &AnyRow) -> Result<NotificationLogEntry, DbError> {
    let status: String = row
        .try_get("status")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    let platform: Option<String> = row.try_get("platform").ok();

    Ok(NotificationLogEntry {
        id: row.try_get("id").ok(),
        user_id: row.try_get("user_id").unwrap_or_default(),
        kind: row.try_get("type").unwrap_or_default(),
        title: row.try_get("title").unwrap_or_default(),
        body: row.try_get("body").unwrap_or_default(),
        status: status
            .parse()
            .map_err(|e: String| DbError::DecodeError(e))?,
        platform: platform.and_then(|p| p.parse().ok()),
        error_message: row.try_get("error_message").ok(),
        sent_at: None, // DateTime<Utc> doesn't implement Decode for sqlx::Any
    })
}

impl NotificationLogRepository for SqlNotificationLogRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing notification log schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS notification_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                type TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                status TEXT NOT NULL,
                platform TEXT,
                error_message TEXT,
                sent_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Notification log schema initialized successfully");
        Ok(())
    }

    async fn append(&self, entry: NotificationLogEntry) -> Result<NotificationLogEntry, DbError> {
        debug!(
            "Appending notification log for user: {} with status: {}",
            entry.user_id, entry.status
        );

        let query = r#"
            INSERT INTO notification_logs (user_id, type, title, body, status, platform, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, type, title, body, status, platform, error_message
        "#;

        let row = sqlx::query(query)
            .bind(&entry.user_id)
            .bind(&entry.kind)
            .bind(&entry.title)
            .bind(&entry.body)
            .bind(entry.status.to_string())
            .bind(entry.platform.map(|p| p.to_string()))
            .bind(&entry.error_message)
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to append notification log: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row_to_entry(&row)
    }

    async fn find_recent_by_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<NotificationLogEntry>, DbError> {
        debug!("Finding recent notification logs for user: {}", user_id);

        let query = r#"
            SELECT id, user_id, type, title, body, status, platform, error_message
            FROM notification_logs
            WHERE user_id = $1
            ORDER BY id DESC
            LIMIT $2
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find notification logs: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(row_to_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachchat_common::models::{NotificationStatus, Platform};

    fn entry(user_id: &str, status: NotificationStatus) -> NotificationLogEntry {
        NotificationLogEntry {
            id: None,
            user_id: user_id.to_string(),
            kind: "chat_message".to_string(),
            title: "Alice".to_string(),
            body: "Hello coach".to_string(),
            status,
            platform: Some(Platform::Ios),
            error_message: None,
            sent_at: None,
        }
    }

    async fn test_repo() -> (SqlNotificationLogRepository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/logs.db", dir.path().display());
        let client = DbClient::from_url(&url).await.unwrap();
        let repo = SqlNotificationLogRepository::new(client);
        repo.init_schema().await.unwrap();
        (repo, dir)
    }

    #[tokio::test]
    async fn append_assigns_an_id_and_round_trips() {
        let (repo, _dir) = test_repo().await;

        let stored = repo
            .append(entry("user-1", NotificationStatus::Delivered))
            .await
            .unwrap();
        assert!(stored.id.is_some());
        assert_eq!(stored.status, NotificationStatus::Delivered);
        assert_eq!(stored.kind, "chat_message");
    }

    #[tokio::test]
    async fn recent_entries_come_newest_first_and_respect_the_limit() {
        let (repo, _dir) = test_repo().await;

        repo.append(entry("user-1", NotificationStatus::Suppressed))
            .await
            .unwrap();
        repo.append(entry("user-1", NotificationStatus::Delivered))
            .await
            .unwrap();
        repo.append(entry("user-2", NotificationStatus::Failed))
            .await
            .unwrap();

        let logs = repo.find_recent_by_user("user-1", 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].status, NotificationStatus::Delivered);
        assert_eq!(logs[1].status, NotificationStatus::Suppressed);

        let limited = repo.find_recent_by_user("user-1", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
