//! Service abstractions for external services.
//!
//! This module provides trait definitions for the externally owned pieces of
//! the notification pipeline: the chat transport, the OS notification
//! scheduler, the push token bridge, and the optional remote push gateway.
//! These traits allow for dependency injection and easier testing by
//! decoupling the application logic from specific implementations.

use crate::models::{
    ChatMessage, ChatUser, LocalNotification, PermissionStatus, Platform, PushToken,
};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for
/// `Box<dyn std::error::Error + Send + Sync>`
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

impl BoxedError {
    /// Box an arbitrary error message.
    pub fn msg<T: fmt::Display>(message: T) -> Self {
        BoxedError(message.to_string().into())
    }
}

/// A transport-level event on a chat channel.
///
/// The provider's polymorphic event payloads are narrowed to this closed set;
/// anything else the transport emits is dropped at the adapter boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ChannelEvent {
    #[serde(rename = "message.new")]
    MessageNew(ChatMessage),
    #[serde(rename = "message.updated")]
    MessageUpdated(ChatMessage),
    #[serde(rename = "message.deleted")]
    MessageDeleted(ChatMessage),
    #[serde(rename = "typing.start")]
    TypingStart(ChatUser),
    #[serde(rename = "typing.stop")]
    TypingStop(ChatUser),
}

/// A trait for the external chat transport.
///
/// The wire protocol is owned by the provider and treated as a black box;
/// this trait is the seam the session manager drives. Channel creation must
/// be idempotent on the provider side: two devices racing to create the same
/// channel id must converge on one channel.
pub trait ChatTransport: Send + Sync {
    /// Error type returned by transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Authenticate and connect a user with a server-issued token.
    fn connect_user(&self, user: &ChatUser, token: &str) -> BoxFuture<'_, (), Self::Error>;

    /// Disconnect the currently connected user.
    fn disconnect_user(&self) -> BoxFuture<'_, (), Self::Error>;

    /// Get or create the channel with the given canonical id.
    fn get_or_create_channel(
        &self,
        channel_id: &str,
        members: &[String],
    ) -> BoxFuture<'_, (), Self::Error>;

    /// Send a message as the connected user.
    fn send_message(&self, channel_id: &str, text: &str)
        -> BoxFuture<'_, ChatMessage, Self::Error>;

    /// Fetch the most recent messages of a channel, newest first.
    fn get_messages(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> BoxFuture<'_, Vec<ChatMessage>, Self::Error>;

    /// Subscribe to the typed event stream of a channel.
    fn subscribe(
        &self,
        channel_id: &str,
    ) -> BoxFuture<'_, broadcast::Receiver<ChannelEvent>, Self::Error>;
}

/// A trait for the OS-level local notification surface.
///
/// Covers both the permission prompt and the actual scheduling of
/// device-displayed alerts.
pub trait NotificationScheduler: Send + Sync {
    /// Error type returned by scheduler operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current permission state without prompting.
    fn permission_status(&self) -> BoxFuture<'_, PermissionStatus, Self::Error>;

    /// Prompt the user for notification permission.
    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus, Self::Error>;

    /// Schedule a local notification for immediate display (zero trigger
    /// delay). Returns the scheduled notification id.
    fn schedule(&self, notification: LocalNotification) -> BoxFuture<'_, String, Self::Error>;

    /// Cancel a previously scheduled notification.
    fn cancel(&self, notification_id: &str) -> BoxFuture<'_, (), Self::Error>;

    /// Cancel all scheduled notifications.
    fn cancel_all(&self) -> BoxFuture<'_, (), Self::Error>;
}

/// A trait for the platform bridge that yields push tokens.
pub trait PushTokenSource: Send + Sync {
    /// Error type returned by token fetch operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether this is genuine hardware. Simulators and emulators cannot
    /// receive push notifications; the registry rejects them.
    fn is_physical_device(&self) -> bool;

    /// The platform this device reports.
    fn platform(&self) -> Platform;

    /// Fetch the current push token.
    fn fetch_token(&self) -> BoxFuture<'_, PushToken, Self::Error>;
}

/// A trait for the remote push dispatch path.
///
/// Returns a provider acknowledgment id on success; the dispatcher only logs
/// `sent` when that acknowledgment arrives.
pub trait RemotePushGateway: Send + Sync {
    /// Error type returned by dispatch operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Dispatch a notification to all of the user's registered devices.
    fn dispatch(
        &self,
        user_id: &str,
        notification: &LocalNotification,
    ) -> BoxFuture<'_, String, Self::Error>;
}

/// A factory for creating service instances.
///
/// Implemented by the composition root; components receive the services they
/// need instead of reaching for module-level singletons.
pub trait ServiceFactory: Send + Sync {
    /// Get the chat transport instance.
    fn chat_transport(&self) -> Option<Arc<dyn ChatTransport<Error = BoxedError>>>;

    /// Get the notification scheduler instance.
    fn notification_scheduler(&self) -> Option<Arc<dyn NotificationScheduler<Error = BoxedError>>>;

    /// Get the push token source instance.
    fn push_token_source(&self) -> Option<Arc<dyn PushTokenSource<Error = BoxedError>>>;

    /// Get the remote push gateway instance, if one is configured.
    fn push_gateway(&self) -> Option<Arc<dyn RemotePushGateway<Error = BoxedError>>>;
}
