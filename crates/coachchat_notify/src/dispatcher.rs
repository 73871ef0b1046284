//! Notification dispatcher.
//!
//! The orchestration core: for every incoming chat event it decides between
//! suppressing, relying on the remote push path, or scheduling a local
//! notification, and records the outcome. Nothing in
//! [`handle_incoming_message`](NotificationDispatcher::handle_incoming_message)
//! may escape its boundary — an exception thrown into the transport listener
//! would desynchronize the listener state.

use crate::activity::ActivityTracker;
use crate::error::RegistrationError;
use crate::log::NotificationLog;
use crate::registry::TokenRegistry;
use coachchat_common::models::{
    ChatMessage, ChatUser, LocalNotification, NotificationStatus, PermissionStatus,
};
use coachchat_common::services::{BoxedError, NotificationScheduler, RemotePushGateway};
use coachchat_db::{NotificationLogRepository, PushTokenRepository, UserActivityRepository};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Semantic type tag attached to chat notifications and their log entries.
pub const NOTIFICATION_KIND_CHAT: &str = "chat_message";

/// Maximum number of message characters shown in a notification body.
const BODY_PREVIEW_MAX_CHARS: usize = 100;

/// Push registration lifecycle for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Uninitialized,
    PermissionPending,
    Registered,
    Denied,
}

/// Terminal state of one incoming message event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Recipient was viewing the chat; no visible alert.
    Suppressed,
    /// A local notification was scheduled.
    LocalNotified,
    /// The remote push path acknowledged delivery.
    RemoteDelivered,
    /// Permission was denied or scheduling failed.
    Failed,
}

/// Decides, for every incoming chat event, whether to suppress or surface a
/// notification, and drives the token registry and notification log.
pub struct NotificationDispatcher<RA, RT, RL> {
    /// The authenticated user running this client instance; always the
    /// notification recipient.
    user: ChatUser,
    activity: Arc<ActivityTracker<RA>>,
    registry: Arc<TokenRegistry<RT>>,
    log: Arc<NotificationLog<RL>>,
    scheduler: Arc<dyn NotificationScheduler<Error = BoxedError>>,
    gateway: Option<Arc<dyn RemotePushGateway<Error = BoxedError>>>,
    registration: RwLock<RegistrationState>,
}

impl<RA, RT, RL> NotificationDispatcher<RA, RT, RL>
where
    RA: UserActivityRepository + Send + Sync + 'static,
    RT: PushTokenRepository + Send + Sync,
    RL: NotificationLogRepository + Send + Sync,
{
    /// Create a dispatcher for the given recipient.
    pub fn new(
        user: ChatUser,
        activity: Arc<ActivityTracker<RA>>,
        registry: Arc<TokenRegistry<RT>>,
        log: Arc<NotificationLog<RL>>,
        scheduler: Arc<dyn NotificationScheduler<Error = BoxedError>>,
        gateway: Option<Arc<dyn RemotePushGateway<Error = BoxedError>>>,
    ) -> Self {
        Self {
            user,
            activity,
            registry,
            log,
            scheduler,
            gateway,
            registration: RwLock::new(RegistrationState::Uninitialized),
        }
    }

    /// Current push registration state for this user.
    pub fn registration_state(&self) -> RegistrationState {
        *self
            .registration
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_registration_state(&self, state: RegistrationState) {
        *self
            .registration
            .write()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Run the push registration flow for the current user.
    ///
    /// `Uninitialized -> PermissionPending -> Registered | Denied`. A
    /// transient network failure stays in `PermissionPending` so a later
    /// retry can complete the flow.
    pub async fn initialize(&self) {
        self.set_registration_state(RegistrationState::PermissionPending);

        match self.registry.register_current_device(&self.user.id).await {
            Ok(device) => {
                info!(
                    "Push registration complete for user {} ({})",
                    self.user.id, device.token_kind
                );
                self.set_registration_state(RegistrationState::Registered);
            }
            Err(RegistrationError::PermissionDenied) => {
                warn!("Push registration denied for user {}", self.user.id);
                self.set_registration_state(RegistrationState::Denied);
            }
            Err(RegistrationError::UnsupportedEnvironment(reason)) => {
                debug!(
                    "Skipping push registration for user {}: {}",
                    self.user.id, reason
                );
                self.set_registration_state(RegistrationState::Denied);
            }
            Err(RegistrationError::NetworkError(reason)) => {
                warn!(
                    "Push registration for user {} failed transiently: {}",
                    self.user.id, reason
                );
            }
        }
    }

    /// Handle one incoming message event.
    ///
    /// Never panics and never propagates an error; every path ends in a
    /// [`DispatchOutcome`] with exactly one matching log entry (suppression
    /// and local scheduling) or a confirmed remote acknowledgment.
    ///
    /// If the activity flag flips to `true` between the suppression check
    /// and the scheduling call, the notification is still shown once —
    /// suppression is a UX nicety, and a spurious alert beats a silently
    /// dropped one.
    pub async fn handle_incoming_message(
        &self,
        message: &ChatMessage,
        sender: &ChatUser,
    ) -> DispatchOutcome {
        let recipient = &self.user;
        let title = sender.name.clone();
        let body = preview_body(&message.text);

        if self.activity.is_in_chat(&recipient.id) {
            debug!(
                "Suppressing notification for user {}: currently in chat",
                recipient.id
            );
            self.log
                .record(
                    &recipient.id,
                    NOTIFICATION_KIND_CHAT,
                    &title,
                    &body,
                    NotificationStatus::Suppressed,
                    None,
                )
                .await;
            return DispatchOutcome::Suppressed;
        }

        if !self.ensure_permission().await {
            self.log
                .record(
                    &recipient.id,
                    NOTIFICATION_KIND_CHAT,
                    &title,
                    &body,
                    NotificationStatus::Failed,
                    Some("notification permission denied".to_string()),
                )
                .await;
            return DispatchOutcome::Failed;
        }

        let mut data = HashMap::new();
        data.insert("channelId".to_string(), message.channel_id.clone());
        data.insert("messageId".to_string(), message.id.clone());
        data.insert("senderId".to_string(), sender.id.clone());
        data.insert("type".to_string(), NOTIFICATION_KIND_CHAT.to_string());

        let notification = LocalNotification {
            title: title.clone(),
            body: body.clone(),
            data,
            sound: true,
        };

        // Prefer the remote push path when it is configured and this user has
        // an active registered device: the push service shows the
        // system-level alert, and a local duplicate would double-notify.
        // `sent` is only logged on a confirmed acknowledgment; without one we
        // fall through to the local path and log at the actual scheduling.
        if let Some(gateway) = &self.gateway {
            match self.registry.get_active_tokens(&recipient.id).await {
                Ok(devices) if !devices.is_empty() => {
                    match gateway.dispatch(&recipient.id, &notification).await {
                        Ok(ack_id) => {
                            info!(
                                "Remote push dispatched for user {} (ack {})",
                                recipient.id, ack_id
                            );
                            self.log
                                .record(
                                    &recipient.id,
                                    NOTIFICATION_KIND_CHAT,
                                    &title,
                                    &body,
                                    NotificationStatus::Sent,
                                    None,
                                )
                                .await;
                            return DispatchOutcome::RemoteDelivered;
                        }
                        Err(err) => {
                            warn!(
                                "Remote push dispatch failed for user {}, falling back to local: {}",
                                recipient.id, err
                            );
                        }
                    }
                }
                Ok(_) => {
                    debug!(
                        "No registered device for user {}, using local notification",
                        recipient.id
                    );
                }
                Err(err) => {
                    warn!(
                        "Could not read registered devices for user {}, using local notification: {}",
                        recipient.id, err
                    );
                }
            }
        }

        match self.scheduler.schedule(notification).await {
            Ok(notification_id) => {
                debug!(
                    "Local notification {} scheduled for user {}",
                    notification_id, recipient.id
                );
                self.log
                    .record(
                        &recipient.id,
                        NOTIFICATION_KIND_CHAT,
                        &title,
                        &body,
                        NotificationStatus::Delivered,
                        None,
                    )
                    .await;
                DispatchOutcome::LocalNotified
            }
            Err(err) => {
                warn!(
                    "Local notification scheduling failed for user {}: {}",
                    recipient.id, err
                );
                self.log
                    .record(
                        &recipient.id,
                        NOTIFICATION_KIND_CHAT,
                        &title,
                        &body,
                        NotificationStatus::Failed,
                        Some(err.to_string()),
                    )
                    .await;
                DispatchOutcome::Failed
            }
        }
    }

    /// Check permission, issuing at most one request if it is not yet
    /// granted. Scheduler failures count as not granted.
    async fn ensure_permission(&self) -> bool {
        match self.scheduler.permission_status().await {
            Ok(PermissionStatus::Granted) => true,
            Ok(_) => match self.scheduler.request_permission().await {
                Ok(PermissionStatus::Granted) => true,
                Ok(_) => false,
                Err(err) => {
                    warn!("Permission request failed: {}", err);
                    false
                }
            },
            Err(err) => {
                warn!("Permission status check failed: {}", err);
                false
            }
        }
    }
}

/// Truncate a message body to at most 100 characters, appending an ellipsis
/// marker when the original was longer. Counts characters, not bytes.
pub fn preview_body(text: &str) -> String {
    if text.chars().count() <= BODY_PREVIEW_MAX_CHARS {
        text.to_string()
    } else {
        let mut preview: String = text.chars().take(BODY_PREVIEW_MAX_CHARS).collect();
        preview.push_str("...");
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_pass_through() {
        assert_eq!(preview_body("Hello coach"), "Hello coach");
    }

    #[test]
    fn exactly_one_hundred_characters_is_not_truncated() {
        let text = "a".repeat(100);
        assert_eq!(preview_body(&text), text);
    }

    #[test]
    fn long_bodies_truncate_to_one_hundred_plus_ellipsis() {
        let text = "x".repeat(150);
        let preview = preview_body(&text);
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(150);
        let preview = preview_body(&text);
        assert_eq!(preview.chars().count(), 103);
    }
}
