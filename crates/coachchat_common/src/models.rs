//! Shared domain models.
//!
//! These types mirror the persisted tables and the chat provider's wire
//! shapes, so enum representations are lowercase strings throughout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub use coachchat_config::TokenKind;

/// Role of a participant in a coaching conversation.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Coach,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Coach => write!(f, "coach"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(UserRole::Student),
            "coach" => Ok(UserRole::Coach),
            other => Err(format!("unknown user role: {}", other)),
        }
    }
}

/// Device platform, as stored in the `platform` columns.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Web,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
            Platform::Web => write!(f, "web"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "web" => Ok(Platform::Web),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Outcome of a notification attempt, as stored in `notification_logs.status`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Sent,
    Delivered,
    Failed,
    Suppressed,
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationStatus::Sent => write!(f, "sent"),
            NotificationStatus::Delivered => write!(f, "delivered"),
            NotificationStatus::Failed => write!(f, "failed"),
            NotificationStatus::Suppressed => write!(f, "suppressed"),
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(NotificationStatus::Sent),
            "delivered" => Ok(NotificationStatus::Delivered),
            "failed" => Ok(NotificationStatus::Failed),
            "suppressed" => Ok(NotificationStatus::Suppressed),
            other => Err(format!("unknown notification status: {}", other)),
        }
    }
}

/// Current state of the OS-level notification permission.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Undetermined,
    Granted,
    Denied,
}

/// A chat participant.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: UserRole,
}

/// A message inside a transport channel.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub channel_id: String,
    pub text: String,
    pub sender: ChatUser,
    pub created_at: DateTime<Utc>,
}

/// One push registration record, keyed logically on `(user_id, platform)`.
/// At most one record per pair is active; superseded records are deactivated,
/// never deleted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RegisteredDevice {
    pub id: Option<i64>,
    pub user_id: String,
    pub token: String,
    pub platform: Platform,
    pub token_kind: TokenKind,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Append-only record of one notification attempt and its outcome.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NotificationLogEntry {
    pub id: Option<i64>,
    pub user_id: String,
    /// Category tag, e.g. `chat_message`.
    pub kind: String,
    pub title: String,
    pub body: String,
    pub status: NotificationStatus,
    pub platform: Option<Platform>,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Whether a user is currently viewing the chat screen. One current record
/// per `(user_id, platform)`; `last_activity` never moves backwards for a
/// given writer.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UserActivity {
    pub id: Option<i64>,
    pub user_id: String,
    pub is_in_chat: bool,
    pub last_activity: DateTime<Utc>,
    pub platform: Platform,
}

/// A device-displayed alert scheduled directly by the client.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    /// Routing metadata (channel id, message id, sender id, semantic type) so
    /// a tap can resolve back to the right conversation without re-querying
    /// the backend.
    #[serde(default)]
    pub data: HashMap<String, String>,
    #[serde(default)]
    pub sound: bool,
}

/// A push token as obtained from the platform bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushToken {
    pub value: String,
    pub kind: TokenKind,
}
