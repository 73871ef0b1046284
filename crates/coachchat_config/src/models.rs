use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:coachchat.db, loaded via COACHCHAT_DATABASE__URL
}

/// Push token capability. Exactly one registry implementation serves all of
/// these; which kind a client registers is selected here, not by code paths.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Expo,
    Fcm,
    Apns,
    Mock,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Expo => "expo",
            TokenKind::Fcm => "fcm",
            TokenKind::Apns => "apns",
            TokenKind::Mock => "mock",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expo" => Ok(TokenKind::Expo),
            "fcm" => Ok(TokenKind::Fcm),
            "apns" => Ok(TokenKind::Apns),
            "mock" => Ok(TokenKind::Mock),
            other => Err(format!("unknown token kind: {}", other)),
        }
    }
}

// --- Chat Transport Config ---
// Holds non-secret chat provider config. The API secret is only needed by the
// backend service for token minting and is loaded via the secret_from_env
// marker (STREAM_API_SECRET).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StreamConfig {
    /// Public API key of the chat provider.
    pub api_key: String,
    /// Base URL of the token-exchange service (the companion backend).
    pub api_url: String,
    /// Server-side signing secret for minted user tokens.
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Lifetime of minted user tokens in seconds. Defaults to one hour.
    #[serde(default)]
    pub token_ttl_secs: Option<i64>,
    /// Timeout for the token-exchange call in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Run against the in-process loopback transport instead of a live
    /// provider connection. Dev/test harnesses only.
    #[serde(default)]
    pub dev_loopback: bool,
}

// --- Notifications Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotificationsConfig {
    /// Which push token kind this installation registers.
    pub token_kind: TokenKind,
    /// Accept mock push tokens. Test-only; a mock token registered in
    /// production would silently break remote delivery.
    #[serde(default)]
    pub allow_mock_tokens: bool,
    /// Remote push dispatch endpoint. When unset, incoming messages fall back
    /// to locally scheduled notifications.
    #[serde(default)]
    pub push_gateway_url: Option<String>,
    /// Timeout for gateway dispatch calls in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

// --- Agent Config (dev harness identities) ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// "student" or "coach"; parsed by the agent at startup.
    pub role: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentConfig {
    pub user: AgentProfile,
    pub partner: AgentProfile,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_stream: bool,
    #[serde(default)]
    pub use_notifications: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub stream: Option<StreamConfig>,
    #[serde(default)]
    pub notifications: Option<NotificationsConfig>,
    #[serde(default)]
    pub agent: Option<AgentConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_kind_round_trips_through_display() {
        for kind in [TokenKind::Expo, TokenKind::Fcm, TokenKind::Apns, TokenKind::Mock] {
            assert_eq!(kind.to_string().parse::<TokenKind>().unwrap(), kind);
        }
    }

    #[test]
    fn config_sections_are_optional() {
        let json = r#"{ "server": { "host": "127.0.0.1", "port": 8080 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!(config.database.is_none());
        assert!(config.stream.is_none());
        assert!(config.notifications.is_none());
        assert!(!config.use_stream);
    }

    #[test]
    fn mock_tokens_default_to_disallowed() {
        let json = r#"{ "token_kind": "expo" }"#;
        let config: NotificationsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.token_kind, TokenKind::Expo);
        assert!(!config.allow_mock_tokens);
    }
}
