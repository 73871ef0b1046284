//! Notification outcome log.
//!
//! Thin service over the append-only `notification_logs` repository. Writes
//! are best-effort telemetry: a failed append is logged locally and never
//! surfaces to the dispatcher's event-handling path.

use coachchat_common::models::{NotificationLogEntry, NotificationStatus, Platform};
use coachchat_db::NotificationLogRepository;
use std::sync::Arc;
use tracing::warn;

/// Records every notification attempt and its outcome.
pub struct NotificationLog<R> {
    repo: Arc<R>,
    platform: Platform,
}

impl<R> NotificationLog<R>
where
    R: NotificationLogRepository + Send + Sync,
{
    /// Create a log service writing entries tagged with this platform.
    pub fn new(repo: Arc<R>, platform: Platform) -> Self {
        Self { repo, platform }
    }

    /// Append one outcome entry. Failures are swallowed after logging.
    pub async fn record(
        &self,
        user_id: &str,
        kind: &str,
        title: &str,
        body: &str,
        status: NotificationStatus,
        error_message: Option<String>,
    ) {
        let entry = NotificationLogEntry {
            id: None,
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            status,
            platform: Some(self.platform),
            error_message,
            sent_at: None,
        };

        if let Err(err) = self.repo.append(entry).await {
            warn!(
                "Failed to record notification log for user {}: {}",
                user_id, err
            );
        }
    }

    /// Most recent entries for a user, newest first. Read failures yield an
    /// empty list.
    pub async fn recent(&self, user_id: &str, limit: i64) -> Vec<NotificationLogEntry> {
        match self.repo.find_recent_by_user(user_id, limit).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "Failed to read notification logs for user {}: {}",
                    user_id, err
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryLogRepo;

    #[tokio::test]
    async fn recorded_entries_come_back_newest_first() {
        let repo = Arc::new(MemoryLogRepo::new());
        let log = NotificationLog::new(Arc::clone(&repo), Platform::Ios);

        log.record(
            "user-1",
            "chat_message",
            "Alice",
            "first",
            NotificationStatus::Suppressed,
            None,
        )
        .await;
        log.record(
            "user-1",
            "chat_message",
            "Alice",
            "second",
            NotificationStatus::Delivered,
            None,
        )
        .await;

        let recent = log.recent("user-1", 10).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].body, "second");
        assert_eq!(recent[0].platform, Some(Platform::Ios));
    }

    #[tokio::test]
    async fn limits_apply_and_unknown_users_are_empty() {
        let repo = Arc::new(MemoryLogRepo::new());
        let log = NotificationLog::new(repo, Platform::Ios);

        for body in ["a", "b", "c"] {
            log.record(
                "user-1",
                "chat_message",
                "Alice",
                body,
                NotificationStatus::Delivered,
                None,
            )
            .await;
        }

        assert_eq!(log.recent("user-1", 2).await.len(), 2);
        assert!(log.recent("nobody", 10).await.is_empty());
    }
}
