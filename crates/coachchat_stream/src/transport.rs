//! In-process loopback transport.
//!
//! [`InMemoryHub`] stands in for the chat provider: it owns the channels,
//! their message history, and a broadcast sender per channel. Each client
//! connects through its own [`InMemoryTransport`], so a test (or the dev
//! agent) can run both sides of a conversation against one hub.
//!
//! The real provider connection lives behind the same [`ChatTransport`]
//! trait and is supplied by the embedding application; the wire protocol
//! itself is out of scope here.

use crate::error::StreamError;
use chrono::Utc;
use coachchat_common::models::{ChatMessage, ChatUser};
use coachchat_common::services::{BoxFuture, BoxedError, ChannelEvent, ChatTransport};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Buffer capacity of each channel's event stream. Slow subscribers see
/// `RecvError::Lagged` once this many events pile up.
const EVENT_CHANNEL_CAPACITY: usize = 256;

struct HubChannel {
    members: Vec<String>,
    messages: Vec<ChatMessage>,
    events: broadcast::Sender<ChannelEvent>,
}

/// Shared state of the loopback provider.
pub struct InMemoryHub {
    channels: RwLock<HashMap<String, HubChannel>>,
    connected: RwLock<HashSet<String>>,
}

impl InMemoryHub {
    /// Create a new hub.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            channels: RwLock::new(HashMap::new()),
            connected: RwLock::new(HashSet::new()),
        })
    }

    /// Ids of currently connected users.
    pub async fn connected_users(&self) -> Vec<String> {
        self.connected.read().await.iter().cloned().collect()
    }

    /// Member ids of a channel, if it exists.
    pub async fn channel_members(&self, channel_id: &str) -> Option<Vec<String>> {
        self.channels
            .read()
            .await
            .get(channel_id)
            .map(|c| c.members.clone())
    }

    /// Inject an event into a channel's stream.
    ///
    /// Lets tests simulate provider-side events (edits, deletions, typing)
    /// that the loopback send path does not produce on its own.
    pub async fn broadcast_event(
        &self,
        channel_id: &str,
        event: ChannelEvent,
    ) -> Result<(), StreamError> {
        let channels = self.channels.read().await;
        let channel = channels
            .get(channel_id)
            .ok_or_else(|| StreamError::Channel(format!("unknown channel: {}", channel_id)))?;
        let _ = channel.events.send(event);
        Ok(())
    }
}

/// One client's connection to the loopback hub.
pub struct InMemoryTransport {
    hub: Arc<InMemoryHub>,
    current_user: RwLock<Option<ChatUser>>,
}

impl InMemoryTransport {
    /// Create a transport bound to the given hub.
    pub fn new(hub: Arc<InMemoryHub>) -> Self {
        Self {
            hub,
            current_user: RwLock::new(None),
        }
    }

    async fn require_user(&self) -> Result<ChatUser, BoxedError> {
        self.current_user
            .read()
            .await
            .clone()
            .ok_or_else(|| BoxedError(Box::new(StreamError::NotConnected)))
    }
}

impl ChatTransport for InMemoryTransport {
    type Error = BoxedError;

    fn connect_user(&self, user: &ChatUser, _token: &str) -> BoxFuture<'_, (), Self::Error> {
        let user = user.clone();
        Box::pin(async move {
            self.hub.connected.write().await.insert(user.id.clone());
            debug!("Loopback transport connected user: {}", user.id);
            *self.current_user.write().await = Some(user);
            Ok(())
        })
    }

    fn disconnect_user(&self) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async move {
            if let Some(user) = self.current_user.write().await.take() {
                self.hub.connected.write().await.remove(&user.id);
                debug!("Loopback transport disconnected user: {}", user.id);
            }
            Ok(())
        })
    }

    fn get_or_create_channel(
        &self,
        channel_id: &str,
        members: &[String],
    ) -> BoxFuture<'_, (), Self::Error> {
        let channel_id = channel_id.to_string();
        let members = members.to_vec();
        Box::pin(async move {
            self.require_user().await?;
            let mut channels = self.hub.channels.write().await;
            // Idempotent: racing creators converge on the existing channel.
            channels.entry(channel_id).or_insert_with(|| {
                let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
                HubChannel {
                    members,
                    messages: Vec::new(),
                    events,
                }
            });
            Ok(())
        })
    }

    fn send_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> BoxFuture<'_, ChatMessage, Self::Error> {
        let channel_id = channel_id.to_string();
        let text = text.to_string();
        Box::pin(async move {
            let sender = self.require_user().await?;
            let mut channels = self.hub.channels.write().await;
            let channel = channels.get_mut(&channel_id).ok_or_else(|| {
                BoxedError(Box::new(StreamError::Channel(format!(
                    "unknown channel: {}",
                    channel_id
                ))))
            })?;

            let message = ChatMessage {
                id: Uuid::new_v4().to_string(),
                channel_id: channel_id.clone(),
                text,
                sender,
                created_at: Utc::now(),
            };
            channel.messages.push(message.clone());
            let _ = channel.events.send(ChannelEvent::MessageNew(message.clone()));
            Ok(message)
        })
    }

    fn get_messages(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> BoxFuture<'_, Vec<ChatMessage>, Self::Error> {
        let channel_id = channel_id.to_string();
        Box::pin(async move {
            let channels = self.hub.channels.read().await;
            let channel = channels.get(&channel_id).ok_or_else(|| {
                BoxedError(Box::new(StreamError::Channel(format!(
                    "unknown channel: {}",
                    channel_id
                ))))
            })?;
            Ok(channel
                .messages
                .iter()
                .rev()
                .take(limit)
                .cloned()
                .collect())
        })
    }

    fn subscribe(
        &self,
        channel_id: &str,
    ) -> BoxFuture<'_, broadcast::Receiver<ChannelEvent>, Self::Error> {
        let channel_id = channel_id.to_string();
        Box::pin(async move {
            let channels = self.hub.channels.read().await;
            let channel = channels.get(&channel_id).ok_or_else(|| {
                BoxedError(Box::new(StreamError::Channel(format!(
                    "unknown channel: {}",
                    channel_id
                ))))
            })?;
            Ok(channel.events.subscribe())
        })
    }
}
