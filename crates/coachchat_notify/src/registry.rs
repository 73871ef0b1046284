//! Push token registry.
//!
//! One registry serves every token capability (`expo`, `fcm`, `apns`,
//! `mock`); which kind a device registers is decided by configuration, not
//! by parallel code paths. Mock tokens are accepted only when the explicit
//! dev flag is set — registering a fake token in production would silently
//! break remote delivery.

use crate::error::RegistrationError;
use coachchat_common::models::{PermissionStatus, Platform, RegisteredDevice, TokenKind};
use coachchat_common::services::{BoxedError, NotificationScheduler, PushTokenSource};
use coachchat_db::PushTokenRepository;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registers and looks up push tokens for the current device.
pub struct TokenRegistry<R> {
    repo: Arc<R>,
    token_source: Arc<dyn PushTokenSource<Error = BoxedError>>,
    scheduler: Arc<dyn NotificationScheduler<Error = BoxedError>>,
    allow_mock_tokens: bool,
}

impl<R> TokenRegistry<R>
where
    R: PushTokenRepository + Send + Sync,
{
    /// Create a registry over the given repository and platform bridges.
    pub fn new(
        repo: Arc<R>,
        token_source: Arc<dyn PushTokenSource<Error = BoxedError>>,
        scheduler: Arc<dyn NotificationScheduler<Error = BoxedError>>,
        allow_mock_tokens: bool,
    ) -> Self {
        Self {
            repo,
            token_source,
            scheduler,
            allow_mock_tokens,
        }
    }

    /// Run the full registration flow for the current device.
    ///
    /// Order matters: the environment gate comes first (simulators are
    /// rejected before any prompt), then the permission check with a single
    /// request if not yet granted, then the token fetch and upsert.
    pub async fn register_current_device(
        &self,
        user_id: &str,
    ) -> Result<RegisteredDevice, RegistrationError> {
        if !self.token_source.is_physical_device() {
            return Err(RegistrationError::UnsupportedEnvironment(
                "push registration requires a physical device".to_string(),
            ));
        }

        let mut status = self
            .scheduler
            .permission_status()
            .await
            .map_err(|e| RegistrationError::NetworkError(e.to_string()))?;

        if status != PermissionStatus::Granted {
            status = self
                .scheduler
                .request_permission()
                .await
                .map_err(|e| RegistrationError::NetworkError(e.to_string()))?;
        }

        if status != PermissionStatus::Granted {
            warn!("Notification permission denied for user: {}", user_id);
            return Err(RegistrationError::PermissionDenied);
        }

        let token = self
            .token_source
            .fetch_token()
            .await
            .map_err(|e| RegistrationError::NetworkError(e.to_string()))?;

        debug!("Push token obtained for user {} ({})", user_id, token.kind);

        self.register_token(user_id, &token.value, self.token_source.platform(), token.kind)
            .await
    }

    /// Register a token directly.
    ///
    /// Idempotent: repeated registration for the same `(user, platform)`
    /// replaces the prior active token, never accumulating duplicates.
    pub async fn register_token(
        &self,
        user_id: &str,
        token: &str,
        platform: Platform,
        token_kind: TokenKind,
    ) -> Result<RegisteredDevice, RegistrationError> {
        if token_kind == TokenKind::Mock && !self.allow_mock_tokens {
            return Err(RegistrationError::UnsupportedEnvironment(
                "mock push tokens are disabled; set notifications.allow_mock_tokens for dev builds"
                    .to_string(),
            ));
        }

        let device = RegisteredDevice {
            id: None,
            user_id: user_id.to_string(),
            token: token.to_string(),
            platform,
            token_kind,
            is_active: true,
            created_at: None,
            updated_at: None,
        };

        let stored = self
            .repo
            .upsert_token(device)
            .await
            .map_err(|e| RegistrationError::NetworkError(e.to_string()))?;

        info!(
            "Push token registered for user {} on platform {}",
            user_id, platform
        );
        Ok(stored)
    }

    /// All active registered devices for a user.
    pub async fn get_active_tokens(
        &self,
        user_id: &str,
    ) -> Result<Vec<RegisteredDevice>, RegistrationError> {
        self.repo
            .find_active_by_user(user_id)
            .await
            .map_err(|e| RegistrationError::NetworkError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::{InProcessScheduler, MockTokenSource};
    use crate::testutil::MemoryTokenRepo;

    fn registry_with(
        repo: Arc<MemoryTokenRepo>,
        source: MockTokenSource,
        scheduler: InProcessScheduler,
        allow_mock: bool,
    ) -> TokenRegistry<MemoryTokenRepo> {
        TokenRegistry::new(repo, Arc::new(source), Arc::new(scheduler), allow_mock)
    }

    #[tokio::test]
    async fn repeated_registration_leaves_one_active_device() {
        let repo = Arc::new(MemoryTokenRepo::new());
        let registry = registry_with(
            Arc::clone(&repo),
            MockTokenSource::new(Platform::Ios),
            InProcessScheduler::granted(),
            true,
        );

        registry
            .register_token("user-1", "tok", Platform::Ios, TokenKind::Expo)
            .await
            .unwrap();
        registry
            .register_token("user-1", "tok", Platform::Ios, TokenKind::Expo)
            .await
            .unwrap();

        assert_eq!(repo.active_count("user-1"), 1);
    }

    #[tokio::test]
    async fn simulators_are_rejected_and_nothing_is_written() {
        let repo = Arc::new(MemoryTokenRepo::new());
        let registry = registry_with(
            Arc::clone(&repo),
            MockTokenSource::simulator(Platform::Ios),
            InProcessScheduler::granted(),
            true,
        );

        let err = registry.register_current_device("user-1").await.unwrap_err();
        assert!(matches!(err, RegistrationError::UnsupportedEnvironment(_)));
        assert_eq!(repo.active_count("user-1"), 0);
    }

    #[tokio::test]
    async fn mock_tokens_require_the_dev_flag() {
        let repo = Arc::new(MemoryTokenRepo::new());
        let registry = registry_with(
            Arc::clone(&repo),
            MockTokenSource::new(Platform::Ios),
            InProcessScheduler::granted(),
            false,
        );

        let err = registry
            .register_token("user-1", "mock-token-abc", Platform::Ios, TokenKind::Mock)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::UnsupportedEnvironment(_)));
        assert_eq!(repo.active_count("user-1"), 0);
    }

    #[tokio::test]
    async fn refused_permission_surfaces_as_permission_denied() {
        let registry = registry_with(
            Arc::new(MemoryTokenRepo::new()),
            MockTokenSource::new(Platform::Ios),
            InProcessScheduler::with_permission(PermissionStatus::Undetermined, false),
            true,
        );

        let err = registry.register_current_device("user-1").await.unwrap_err();
        assert!(matches!(err, RegistrationError::PermissionDenied));
    }

    #[tokio::test]
    async fn unreachable_persistence_is_a_network_error() {
        let registry = registry_with(
            Arc::new(MemoryTokenRepo::failing()),
            MockTokenSource::new(Platform::Ios),
            InProcessScheduler::granted(),
            true,
        );

        let err = registry.register_current_device("user-1").await.unwrap_err();
        assert!(matches!(err, RegistrationError::NetworkError(_)));
    }
}
