//! HTTP handlers for the companion service.

use crate::app_state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{Duration, Utc};
use coachchat_common::models::{
    NotificationLogEntry, NotificationStatus, Platform, RegisteredDevice, TokenKind,
};
use coachchat_common::CoachChatError;
use coachchat_db::{NotificationLogRepository, PushTokenRepository, UserActivityRepository};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Default lifetime of minted user tokens.
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

// --- Stream token exchange ---

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StreamTokenClaims {
    pub user_id: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StreamTokenRequest {
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_email: Option<String>,
    pub user_role: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StreamTokenResponse {
    pub token: String,
}

/// Mint a chat transport token for a user.
///
/// Tokens are signed server-side with the provider API secret; clients never
/// hold the secret. Called once per client session initialization.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/stream-token",
    request_body = StreamTokenRequest,
    responses(
        (status = 200, description = "Token minted", body = StreamTokenResponse),
        (status = 500, description = "Internal Server Error"),
        (status = 503, description = "Chat transport disabled")
    ),
    tag = "Stream"
))]
pub async fn stream_token_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StreamTokenRequest>,
) -> Result<Json<StreamTokenResponse>, (StatusCode, String)> {
    let Some(stream_conf) = state.config.stream.as_ref() else {
        let err_msg = "Stream configuration section missing in server config.".to_string();
        error!("{}", err_msg);
        return Err((StatusCode::INTERNAL_SERVER_ERROR, err_msg));
    };

    if !state.config.use_stream {
        let err_msg = "Chat transport is disabled by configuration.".to_string();
        error!("{}", err_msg);
        return Err((StatusCode::SERVICE_UNAVAILABLE, err_msg));
    }

    let Some(api_secret) = stream_conf.api_secret.as_ref() else {
        let err_msg = "Stream API secret is not configured.".to_string();
        error!("{}", err_msg);
        return Err((StatusCode::INTERNAL_SERVER_ERROR, err_msg));
    };

    debug!(
        "Minting stream token for user {} ({} / {})",
        payload.user_id, payload.user_name, payload.user_role
    );

    let ttl = stream_conf.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
    let now = Utc::now();
    let claims = StreamTokenClaims {
        user_id: payload.user_id.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(ttl)).timestamp() as usize,
    };

    match encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(api_secret.as_ref()),
    ) {
        Ok(token) => Ok(Json(StreamTokenResponse { token })),
        Err(e) => {
            error!("Error minting stream token: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to mint token".to_string(),
            ))
        }
    }
}

// --- Push token registration ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterTokenRequest {
    pub user_id: String,
    pub token: String,
    pub platform: String,
    pub token_type: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterTokenResponse {
    pub success: bool,
    pub user_id: String,
    pub platform: String,
}

/// Register a push token for a user.
///
/// Upserts on `(user_id, platform)`; repeated registration replaces the
/// active token. Errors are surfaced as a plain text body.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/notifications/register",
    request_body = RegisterTokenRequest,
    responses(
        (status = 200, description = "Token registered", body = RegisterTokenResponse),
        (status = 400, description = "Bad Request"),
        (status = 422, description = "Mock tokens not accepted"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Notifications"
))]
pub async fn register_token_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterTokenRequest>,
) -> Result<Json<RegisterTokenResponse>, (StatusCode, String)> {
    let platform: Platform = payload
        .platform
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;
    let token_kind: TokenKind = payload
        .token_type
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;

    let allow_mock = state
        .config
        .notifications
        .as_ref()
        .map(|n| n.allow_mock_tokens)
        .unwrap_or(false);
    if token_kind == TokenKind::Mock && !allow_mock {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "mock push tokens are not accepted by this server".to_string(),
        ));
    }

    let device = RegisteredDevice {
        id: None,
        user_id: payload.user_id.clone(),
        token: payload.token,
        platform,
        token_kind,
        is_active: true,
        created_at: None,
        updated_at: None,
    };

    match state.push_tokens.upsert_token(device).await {
        Ok(stored) => {
            info!(
                "Registered push token for user {} on {}",
                stored.user_id, stored.platform
            );
            Ok(Json(RegisterTokenResponse {
                success: true,
                user_id: stored.user_id,
                platform: stored.platform.to_string(),
            }))
        }
        Err(e) => {
            error!("Failed to register push token: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

// --- Webhook test endpoint ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TestWebhookRequest {
    pub user_id: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TestWebhookResponse {
    pub outcome: NotificationStatus,
    pub suppressed: bool,
}

/// Simulate an inbound message for manual verification.
///
/// Consults the recipient's persisted activity row, records the would-be
/// outcome in the notification log, and reports it. No real notification is
/// dispatched from here.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/notifications/test-webhook",
    request_body = TestWebhookRequest,
    responses(
        (status = 200, description = "Simulated outcome", body = TestWebhookResponse),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Notifications"
))]
pub async fn test_webhook_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TestWebhookRequest>,
) -> Result<Json<TestWebhookResponse>, CoachChatError> {
    let activity = state
        .user_activity
        .find_by_user(&payload.user_id)
        .await
        .map_err(|e| CoachChatError::DatabaseError(e.to_string()))?;

    let suppressed = activity.as_ref().map(|a| a.is_in_chat).unwrap_or(false);
    let outcome = if suppressed {
        NotificationStatus::Suppressed
    } else {
        NotificationStatus::Delivered
    };

    let entry = NotificationLogEntry {
        id: None,
        user_id: payload.user_id.clone(),
        kind: "test_webhook".to_string(),
        title: payload.sender_name.unwrap_or_else(|| "Test sender".to_string()),
        body: payload
            .text
            .unwrap_or_else(|| "Test webhook message".to_string()),
        status: outcome,
        platform: activity.map(|a| a.platform),
        error_message: None,
        sent_at: None,
    };

    if let Err(e) = state.notification_logs.append(entry).await {
        error!("Failed to record test webhook outcome: {}", e);
    }

    Ok(Json(TestWebhookResponse { outcome, suppressed }))
}

/// Liveness probe.
pub async fn health_handler() -> &'static str {
    "OK"
}
