//! Dev and test implementations of the platform bridges.
//!
//! The real scheduler and token source are provided by the embedding mobile
//! shell. These stand-ins exist for the dev agent and for tests, and are
//! only ever selected by the composition root when the configuration
//! explicitly asks for them.

use crate::configure::current_presentation;
use coachchat_common::models::{LocalNotification, PermissionStatus, Platform, PushToken, TokenKind};
use coachchat_common::services::{BoxFuture, BoxedError, NotificationScheduler, PushTokenSource};
use std::sync::{Mutex, PoisonError};
use tracing::info;
use uuid::Uuid;

/// A scheduled notification as recorded by [`InProcessScheduler`].
#[derive(Debug, Clone)]
pub struct ScheduledNotification {
    pub id: String,
    pub notification: LocalNotification,
}

/// In-process notification scheduler.
///
/// Records scheduled notifications instead of displaying them, and logs each
/// one so the dev agent's output shows what a device would have presented.
pub struct InProcessScheduler {
    permission: Mutex<PermissionStatus>,
    grant_on_request: bool,
    scheduled: Mutex<Vec<ScheduledNotification>>,
}

impl InProcessScheduler {
    /// A scheduler whose permission is already granted.
    pub fn granted() -> Self {
        Self::with_permission(PermissionStatus::Granted, true)
    }

    /// A scheduler starting from the given permission state; `grant_on_request`
    /// controls what the permission prompt answers.
    pub fn with_permission(permission: PermissionStatus, grant_on_request: bool) -> Self {
        Self {
            permission: Mutex::new(permission),
            grant_on_request,
            scheduled: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything scheduled so far.
    pub fn scheduled(&self) -> Vec<ScheduledNotification> {
        self.scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationScheduler for InProcessScheduler {
    type Error = BoxedError;

    fn permission_status(&self) -> BoxFuture<'_, PermissionStatus, Self::Error> {
        Box::pin(async move {
            Ok(*self
                .permission
                .lock()
                .unwrap_or_else(PoisonError::into_inner))
        })
    }

    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus, Self::Error> {
        Box::pin(async move {
            let mut permission = self
                .permission
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *permission != PermissionStatus::Granted {
                *permission = if self.grant_on_request {
                    PermissionStatus::Granted
                } else {
                    PermissionStatus::Denied
                };
            }
            Ok(*permission)
        })
    }

    fn schedule(&self, notification: LocalNotification) -> BoxFuture<'_, String, Self::Error> {
        Box::pin(async move {
            let id = Uuid::new_v4().to_string();
            let presentation = current_presentation().unwrap_or_default();
            info!(
                "Local notification [{}]: {} — {} (sound: {})",
                id,
                notification.title,
                notification.body,
                notification.sound && presentation.play_sound
            );
            self.scheduled
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(ScheduledNotification {
                    id: id.clone(),
                    notification,
                });
            Ok(id)
        })
    }

    fn cancel(&self, notification_id: &str) -> BoxFuture<'_, (), Self::Error> {
        let notification_id = notification_id.to_string();
        Box::pin(async move {
            self.scheduled
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|n| n.id != notification_id);
            Ok(())
        })
    }

    fn cancel_all(&self) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async move {
            self.scheduled
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            Ok(())
        })
    }
}

/// Token source yielding `mock-token-…` values.
///
/// Only useful together with `notifications.allow_mock_tokens`; the registry
/// rejects mock tokens otherwise.
pub struct MockTokenSource {
    platform: Platform,
    physical: bool,
}

impl MockTokenSource {
    /// A mock source reporting a physical device on the given platform.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            physical: true,
        }
    }

    /// A mock source reporting a simulator; registration must reject it.
    pub fn simulator(platform: Platform) -> Self {
        Self {
            platform,
            physical: false,
        }
    }
}

impl PushTokenSource for MockTokenSource {
    type Error = BoxedError;

    fn is_physical_device(&self) -> bool {
        self.physical
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn fetch_token(&self) -> BoxFuture<'_, PushToken, Self::Error> {
        Box::pin(async move {
            Ok(PushToken {
                value: format!("mock-token-{}", Uuid::new_v4()),
                kind: TokenKind::Mock,
            })
        })
    }
}
