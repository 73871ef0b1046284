//! Channel session manager.
//!
//! Owns the connection to the chat transport for exactly one authenticated
//! user at a time, resolves the canonical channel for a (student, coach)
//! pair, and re-exposes transport events as a typed stream that keeps
//! flowing whether or not any chat UI is mounted.

use crate::channel::ChannelPair;
use crate::error::StreamError;
use crate::events::ChannelProjection;
use crate::token::StreamTokenClient;
use coachchat_common::models::{ChatMessage, ChatUser};
use coachchat_common::services::{BoxedError, ChannelEvent, ChatTransport};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Buffer capacity of the session's re-broadcast event stream.
const SESSION_EVENT_CAPACITY: usize = 256;

/// How many messages to load into the projection when a channel is resolved.
const DEFAULT_HISTORY_LIMIT: usize = 50;

struct ActiveSession {
    user: ChatUser,
    channel_id: Option<String>,
    projection: Arc<RwLock<ChannelProjection>>,
    listener: Option<JoinHandle<()>>,
}

/// Manages the lifecycle of one user's chat session.
///
/// Exactly one transport connection exists per authenticated user;
/// initializing for a different user disconnects the previous session first.
pub struct ChannelSessionManager {
    transport: Arc<dyn ChatTransport<Error = BoxedError>>,
    token_client: StreamTokenClient,
    events_tx: broadcast::Sender<ChannelEvent>,
    state: Mutex<Option<ActiveSession>>,
}

impl ChannelSessionManager {
    /// Create a session manager over the given transport and token client.
    pub fn new(
        transport: Arc<dyn ChatTransport<Error = BoxedError>>,
        token_client: StreamTokenClient,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            transport,
            token_client,
            events_tx,
            state: Mutex::new(None),
        }
    }

    /// Authenticate and connect the given user.
    ///
    /// A server-issued token is obtained through the token exchange; the
    /// client never mints its own credentials. Re-initializing for the same
    /// user is a no-op; a different user tears the previous session down
    /// first so duplicate connections cannot leak.
    pub async fn initialize(&self, user: &ChatUser) -> Result<(), StreamError> {
        let mut state = self.state.lock().await;

        if let Some(session) = state.as_ref() {
            if session.user.id == user.id {
                debug!("Session already initialized for user: {}", user.id);
                return Ok(());
            }
            info!(
                "Re-initializing session: disconnecting user {} before connecting {}",
                session.user.id, user.id
            );
            Self::teardown(&self.transport, state.take()).await?;
        }

        let token = self.token_client.exchange(user).await?;

        self.transport
            .connect_user(user, &token)
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        *state = Some(ActiveSession {
            user: user.clone(),
            channel_id: None,
            projection: Arc::new(RwLock::new(ChannelProjection::default())),
            listener: None,
        });

        info!("Chat session connected for user: {}", user.id);
        Ok(())
    }

    /// Resolve the canonical channel for a (student, coach) pair and bind the
    /// event listeners.
    ///
    /// Channel creation is idempotent on the transport side, so two devices
    /// racing on the same pair converge on one channel. All five transport
    /// events flow into the local projection and onto the session's typed
    /// stream from here on.
    pub async fn resolve_channel(
        &self,
        student_id: &str,
        coach_id: &str,
    ) -> Result<String, StreamError> {
        let pair = ChannelPair {
            student_id: student_id.to_string(),
            coach_id: coach_id.to_string(),
        };
        let channel_id = pair.channel_id();

        let mut state = self.state.lock().await;
        let session = state.as_mut().ok_or(StreamError::NotConnected)?;

        self.transport
            .get_or_create_channel(&channel_id, &pair.members())
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        let history = self
            .transport
            .get_messages(&channel_id, DEFAULT_HISTORY_LIMIT)
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        session.projection.write().await.replace_messages(history);

        let rx = self
            .transport
            .subscribe(&channel_id)
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        // Rebinding replaces the previous listener task.
        if let Some(listener) = session.listener.take() {
            listener.abort();
        }
        session.listener = Some(self.spawn_listener(rx, Arc::clone(&session.projection)));
        session.channel_id = Some(channel_id.clone());

        info!("Chat channel resolved: {}", channel_id);
        Ok(channel_id)
    }

    /// Resolve the channel from the local user and their partner, assigning
    /// student/coach by role.
    pub async fn resolve_channel_for(
        &self,
        user: &ChatUser,
        partner: &ChatUser,
    ) -> Result<String, StreamError> {
        let pair = ChannelPair::from_participants(user, partner)?;
        self.resolve_channel(&pair.student_id, &pair.coach_id).await
    }

    fn spawn_listener(
        &self,
        mut rx: broadcast::Receiver<ChannelEvent>,
        projection: Arc<RwLock<ChannelProjection>>,
    ) -> JoinHandle<()> {
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        projection.write().await.apply(&event);
                        let _ = events_tx.send(event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Channel listener lagged, {} events dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Send a message on a channel as the connected user.
    ///
    /// Transport failures propagate to the caller so the UI can offer a
    /// retry.
    pub async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> Result<ChatMessage, StreamError> {
        self.transport
            .send_message(channel_id, text)
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))
    }

    /// Fetch the most recent messages of a channel, newest first.
    pub async fn get_messages(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StreamError> {
        self.transport
            .get_messages(channel_id, limit)
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))
    }

    /// Subscribe to the session's typed event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events_tx.subscribe()
    }

    /// Snapshot of the current channel projection, if a channel is bound.
    pub async fn channel_state(&self) -> Option<ChannelProjection> {
        let state = self.state.lock().await;
        match state.as_ref() {
            Some(session) => Some(session.projection.read().await.clone()),
            None => None,
        }
    }

    /// The currently connected user, if any.
    pub async fn current_user(&self) -> Option<ChatUser> {
        self.state.lock().await.as_ref().map(|s| s.user.clone())
    }

    /// Whether a session is currently connected.
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// The bound channel id, if a channel has been resolved.
    pub async fn channel_id(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .as_ref()
            .and_then(|s| s.channel_id.clone())
    }

    /// Disconnect the current session.
    ///
    /// The listener task is aborted before the transport connection is
    /// released, so no callback can fire against a torn-down client.
    /// In-flight persistence writes elsewhere are not cancelled.
    pub async fn disconnect(&self) -> Result<(), StreamError> {
        let mut state = self.state.lock().await;
        Self::teardown(&self.transport, state.take()).await
    }

    async fn teardown(
        transport: &Arc<dyn ChatTransport<Error = BoxedError>>,
        session: Option<ActiveSession>,
    ) -> Result<(), StreamError> {
        let Some(session) = session else {
            return Ok(());
        };
        if let Some(listener) = session.listener {
            listener.abort();
        }
        transport
            .disconnect_user()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        info!("Chat session disconnected for user: {}", session.user.id);
        Ok(())
    }
}
