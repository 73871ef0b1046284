//! Client for the server-side token exchange.
//!
//! The chat provider requires a per-user token that must be minted
//! server-side; the client never holds the signing secret. This client calls
//! the companion backend once per session initialization.

use crate::error::StreamError;
use coachchat_common::http::client::create_client;
use coachchat_common::models::ChatUser;
use coachchat_config::StreamConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default deadline for the token-exchange call. The upstream call has no
/// timeout of its own, so an unbounded request would hang session
/// initialization indefinitely.
const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    user_id: &'a str,
    user_name: &'a str,
    user_email: Option<&'a str>,
    user_role: String,
}

#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

/// Client for `POST {api_url}/api/stream-token`.
#[derive(Debug, Clone)]
pub struct StreamTokenClient {
    base_url: String,
    client: reqwest::Client,
}

impl StreamTokenClient {
    /// Create a new token client from the stream configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StreamConfig) -> Result<Self, StreamError> {
        let timeout = config
            .request_timeout_secs
            .unwrap_or(DEFAULT_TOKEN_TIMEOUT_SECS);
        let client =
            create_client(timeout, true).map_err(|e| StreamError::ConfigError(e.to_string()))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Exchange a user identity for a transport token.
    ///
    /// # Errors
    ///
    /// Non-2xx responses are surfaced as [`StreamError::TokenExchange`] with
    /// the status and response body; a missed deadline becomes
    /// [`StreamError::TokenExchangeTimeout`].
    pub async fn exchange(&self, user: &ChatUser) -> Result<String, StreamError> {
        let url = format!("{}/api/stream-token", self.base_url);
        debug!("Requesting stream token for user: {}", user.name);

        let request = TokenRequest {
            user_id: &user.id,
            user_name: &user.name,
            user_email: user.email.as_deref(),
            user_role: user.role.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StreamError::TokenExchangeTimeout(e.to_string())
                } else {
                    StreamError::TokenExchange(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::TokenExchange(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StreamError::TokenExchange(format!("invalid response body: {}", e)))?;

        info!("Stream token obtained for user: {}", user.name);
        Ok(token.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachchat_common::models::UserRole;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> StreamConfig {
        StreamConfig {
            api_key: "key".into(),
            api_url: server.uri(),
            api_secret: None,
            token_ttl_secs: None,
            request_timeout_secs: Some(2),
            dev_loopback: false,
        }
    }

    fn student() -> ChatUser {
        ChatUser {
            id: "student-1".into(),
            name: "Alice".into(),
            email: Some("alice@example.com".into()),
            role: UserRole::Student,
        }
    }

    #[tokio::test]
    async fn exchange_returns_the_minted_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/stream-token"))
            .and(body_partial_json(serde_json::json!({
                "userId": "student-1",
                "userRole": "student",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "jwt-token"
            })))
            .mount(&server)
            .await;

        let client = StreamTokenClient::new(&config_for(&server)).unwrap();
        let token = client.exchange(&student()).await.unwrap();
        assert_eq!(token, "jwt-token");
    }

    #[tokio::test]
    async fn exchange_surfaces_error_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/stream-token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("signing secret missing"))
            .mount(&server)
            .await;

        let client = StreamTokenClient::new(&config_for(&server)).unwrap();
        let err = client.exchange(&student()).await.unwrap_err();
        match err {
            StreamError::TokenExchange(message) => {
                assert!(message.contains("500"));
                assert!(message.contains("signing secret missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
