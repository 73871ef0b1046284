//! Per-user chat activity tracking.
//!
//! The tracker is the single source of truth for suppression decisions. The
//! in-memory cache is written synchronously and read synchronously on the
//! notification hot path; persistence happens fire-and-forget behind it.
//! Suppression correctness must never depend on network availability, so a
//! failed upsert downgrades to a log line and the cache keeps the new value.

use chrono::{DateTime, Utc};
use coachchat_common::models::{Platform, UserActivity};
use coachchat_db::UserActivityRepository;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
struct CachedActivity {
    in_chat: bool,
    last_activity: DateTime<Utc>,
}

/// Tracks whether each user is currently viewing the chat screen.
///
/// Callers invoke [`set_activity`](ActivityTracker::set_activity) on screen
/// mount (`true`), screen unmount (`false`), and on app-lifecycle
/// transitions (backgrounded -> `false`, active again -> `true`). Both
/// signals are authoritative; the most recent call wins.
pub struct ActivityTracker<R> {
    repo: Arc<R>,
    cache: RwLock<HashMap<String, CachedActivity>>,
}

impl<R> ActivityTracker<R>
where
    R: UserActivityRepository + Send + Sync + 'static,
{
    /// Create a tracker backed by the given repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Record whether a user is currently in the chat screen.
    ///
    /// The cache is updated before the persistence write is even issued, and
    /// the write runs detached: its failure is logged and does not revert
    /// the flag. Timestamps never move backwards for a given user.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_activity(&self, user_id: &str, platform: Platform, in_chat: bool) {
        let now = Utc::now();
        let last_activity = {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            let entry = cache.entry(user_id.to_string()).or_insert(CachedActivity {
                in_chat,
                last_activity: now,
            });
            let ts = entry.last_activity.max(now);
            *entry = CachedActivity {
                in_chat,
                last_activity: ts,
            };
            ts
        };

        debug!("Activity updated for user {}: in_chat={}", user_id, in_chat);

        let repo = Arc::clone(&self.repo);
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            let activity = UserActivity {
                id: None,
                user_id: user_id.clone(),
                is_in_chat: in_chat,
                last_activity,
                platform,
            };
            if let Err(err) = repo.upsert(activity).await {
                warn!("Failed to persist activity for user {}: {}", user_id, err);
            }
        });
    }

    /// Latest known activity flag for a user. Synchronous cache read; users
    /// never seen default to `false`.
    pub fn is_in_chat(&self, user_id: &str) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .map(|entry| entry.in_chat)
            .unwrap_or(false)
    }

    /// Timestamp of the user's most recent activity update, if any.
    pub fn last_activity(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .map(|entry| entry.last_activity)
    }
}
