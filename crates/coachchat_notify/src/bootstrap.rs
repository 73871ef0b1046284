//! Background session bootstrapper.
//!
//! Keeps a transport session and listener registration alive while no chat
//! screen is mounted, so incoming-message events still reach the dispatcher
//! and push-equivalent local notifications keep working while the app is
//! backgrounded but the process alive.

use crate::dispatcher::NotificationDispatcher;
use coachchat_common::models::ChatUser;
use coachchat_common::services::ChannelEvent;
use coachchat_db::{NotificationLogRepository, PushTokenRepository, UserActivityRepository};
use coachchat_stream::{ChannelSessionManager, StreamError};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct BootstrapState {
    user_id: Option<String>,
    forwarder: Option<JoinHandle<()>>,
}

/// Maintains a chat session purely for notification delivery.
pub struct BackgroundNotificationService<RA, RT, RL> {
    session: Arc<ChannelSessionManager>,
    dispatcher: Arc<NotificationDispatcher<RA, RT, RL>>,
    state: Mutex<BootstrapState>,
}

impl<RA, RT, RL> BackgroundNotificationService<RA, RT, RL>
where
    RA: UserActivityRepository + Send + Sync + 'static,
    RT: PushTokenRepository + Send + Sync + 'static,
    RL: NotificationLogRepository + Send + Sync + 'static,
{
    /// Create a bootstrapper over the given session manager and dispatcher.
    pub fn new(
        session: Arc<ChannelSessionManager>,
        dispatcher: Arc<NotificationDispatcher<RA, RT, RL>>,
    ) -> Self {
        Self {
            session,
            dispatcher,
            state: Mutex::new(BootstrapState {
                user_id: None,
                forwarder: None,
            }),
        }
    }

    /// Establish the session and listener registration for a user.
    ///
    /// Idempotent: re-initializing for the same user id is a no-op. For a
    /// different user the previous forwarding task is dropped and the
    /// session manager disconnects the old transport connection before
    /// connecting the new one.
    pub async fn initialize(
        &self,
        user: &ChatUser,
        partner: &ChatUser,
    ) -> Result<(), StreamError> {
        let mut state = self.state.lock().await;

        if state.user_id.as_deref() == Some(user.id.as_str()) {
            debug!(
                "Background notification service already initialized for user {}",
                user.id
            );
            return Ok(());
        }

        if let Some(forwarder) = state.forwarder.take() {
            forwarder.abort();
        }
        state.user_id = None;

        self.session.initialize(user).await?;
        let channel_id = self.session.resolve_channel_for(user, partner).await?;

        let rx = self.session.subscribe();
        let dispatcher = Arc::clone(&self.dispatcher);
        state.forwarder = Some(tokio::spawn(Self::forward_events(rx, dispatcher)));
        state.user_id = Some(user.id.clone());

        info!(
            "Background notification service ready for user {} on channel {}",
            user.id, channel_id
        );
        Ok(())
    }

    async fn forward_events(
        mut rx: broadcast::Receiver<ChannelEvent>,
        dispatcher: Arc<NotificationDispatcher<RA, RT, RL>>,
    ) {
        loop {
            match rx.recv().await {
                Ok(ChannelEvent::MessageNew(message)) => {
                    let sender = message.sender.clone();
                    dispatcher.handle_incoming_message(&message, &sender).await;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Background notification forwarder lagged, {} events dropped",
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Whether the service holds an initialized, connected session.
    pub async fn is_ready(&self) -> bool {
        self.state.lock().await.user_id.is_some() && self.session.is_connected().await
    }

    /// Tear the service down: the forwarding task stops immediately, then
    /// the session disconnects.
    pub async fn shutdown(&self) -> Result<(), StreamError> {
        let mut state = self.state.lock().await;
        if let Some(forwarder) = state.forwarder.take() {
            forwarder.abort();
        }
        state.user_id = None;
        self.session.disconnect().await
    }
}
