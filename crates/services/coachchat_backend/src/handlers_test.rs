#[cfg(test)]
mod tests {
    use crate::app_state::AppState;
    use crate::handlers::{
        register_token_handler, stream_token_handler, test_webhook_handler, RegisterTokenRequest,
        StreamTokenClaims, StreamTokenRequest, TestWebhookRequest,
    };
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use chrono::Utc;
    use coachchat_common::models::{NotificationStatus, Platform, UserActivity};
    use coachchat_config::{
        AppConfig, DatabaseConfig, NotificationsConfig, ServerConfig, StreamConfig, TokenKind,
    };
    use coachchat_db::{NotificationLogRepository, PushTokenRepository, UserActivityRepository};
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use std::sync::Arc;

    fn test_config(db_url: String) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
            use_stream: true,
            use_notifications: true,
            database: Some(DatabaseConfig { url: db_url }),
            stream: Some(StreamConfig {
                api_key: "key".into(),
                api_url: "http://127.0.0.1:0".into(),
                api_secret: Some("signing-secret".into()),
                token_ttl_secs: Some(600),
                request_timeout_secs: None,
                dev_loopback: false,
            }),
            notifications: Some(NotificationsConfig {
                token_kind: TokenKind::Expo,
                allow_mock_tokens: false,
                push_gateway_url: None,
                request_timeout_secs: None,
            }),
            agent: None,
        }
    }

    async fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/backend.db", dir.path().display());
        let config = Arc::new(test_config(url));
        let state = AppState::new(config).await.unwrap();
        (Arc::new(state), dir)
    }

    #[tokio::test]
    async fn minted_tokens_decode_with_the_configured_secret() {
        let (state, _dir) = test_state().await;

        let response = stream_token_handler(
            State(state),
            Json(StreamTokenRequest {
                user_id: "student-1".into(),
                user_name: "Alice".into(),
                user_email: None,
                user_role: "student".into(),
            }),
        )
        .await
        .unwrap();

        let decoded = decode::<StreamTokenClaims>(
            &response.token,
            &DecodingKey::from_secret(b"signing-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.user_id, "student-1");
        assert!(decoded.claims.exp > decoded.claims.iat);
    }

    #[tokio::test]
    async fn register_is_idempotent_per_user_and_platform() {
        let (state, _dir) = test_state().await;

        for _ in 0..2 {
            register_token_handler(
                State(state.clone()),
                Json(RegisterTokenRequest {
                    user_id: "coach-1".into(),
                    token: "expo-token".into(),
                    platform: "android".into(),
                    token_type: "expo".into(),
                }),
            )
            .await
            .unwrap();
        }

        let active = state.push_tokens.find_active_by_user("coach-1").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].token, "expo-token");
    }

    #[tokio::test]
    async fn unknown_platform_is_a_bad_request() {
        let (state, _dir) = test_state().await;

        let err = register_token_handler(
            State(state),
            Json(RegisterTokenRequest {
                user_id: "coach-1".into(),
                token: "tok".into(),
                platform: "blackberry".into(),
                token_type: "expo".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mock_tokens_are_rejected_unless_allowed() {
        let (state, _dir) = test_state().await;

        let err = register_token_handler(
            State(state.clone()),
            Json(RegisterTokenRequest {
                user_id: "coach-1".into(),
                token: "mock-token-1".into(),
                platform: "ios".into(),
                token_type: "mock".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state
            .push_tokens
            .find_active_by_user("coach-1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn webhook_reports_suppression_from_the_persisted_activity_row() {
        let (state, _dir) = test_state().await;

        state
            .user_activity
            .upsert(UserActivity {
                id: None,
                user_id: "coach-1".into(),
                is_in_chat: true,
                last_activity: Utc::now(),
                platform: Platform::Android,
            })
            .await
            .unwrap();

        let response = test_webhook_handler(
            State(state.clone()),
            Json(TestWebhookRequest {
                user_id: "coach-1".into(),
                sender_name: Some("Alice".into()),
                text: Some("Hello coach".into()),
            }),
        )
        .await
        .unwrap();

        assert!(response.suppressed);
        assert_eq!(response.outcome, NotificationStatus::Suppressed);

        let logs = state
            .notification_logs
            .find_recent_by_user("coach-1", 10)
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, NotificationStatus::Suppressed);
        assert_eq!(logs[0].kind, "test_webhook");
    }

    #[tokio::test]
    async fn webhook_defaults_to_delivered_for_unknown_users() {
        let (state, _dir) = test_state().await;

        let response = test_webhook_handler(
            State(state),
            Json(TestWebhookRequest {
                user_id: "stranger".into(),
                sender_name: None,
                text: None,
            }),
        )
        .await
        .unwrap();

        assert!(!response.suppressed);
        assert_eq!(response.outcome, NotificationStatus::Delivered);
    }
}
