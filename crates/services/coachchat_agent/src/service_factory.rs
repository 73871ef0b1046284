//! Service factory implementation.
//!
//! Builds the platform-bridge services from configuration. Every service is
//! optional: the factory hands out only what the config explicitly enables,
//! and the dev-only implementations (loopback transport, in-process
//! scheduler, mock token source) are never selected implicitly.

use coachchat_common::models::{LocalNotification, Platform};
use coachchat_common::{is_notifications_enabled, is_stream_enabled};
use coachchat_common::services::{
    BoxFuture, BoxedError, ChatTransport, NotificationScheduler, PushTokenSource,
    RemotePushGateway, ServiceFactory,
};
use coachchat_config::AppConfig;
use coachchat_notify::dev::{InProcessScheduler, MockTokenSource};
use coachchat_notify::HttpPushGateway;
use coachchat_stream::{InMemoryHub, InMemoryTransport};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Adapter that narrows the gateway's typed error to [`BoxedError`] for the
/// trait object handed to the dispatcher.
struct BoxedPushGateway {
    inner: HttpPushGateway,
}

impl RemotePushGateway for BoxedPushGateway {
    type Error = BoxedError;

    fn dispatch(
        &self,
        user_id: &str,
        notification: &LocalNotification,
    ) -> BoxFuture<'_, String, Self::Error> {
        let user_id = user_id.to_string();
        let notification = notification.clone();
        Box::pin(async move {
            self.inner
                .dispatch(&user_id, &notification)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}

/// Service factory for the agent process.
pub struct CoachChatServiceFactory {
    chat_transport: Option<Arc<dyn ChatTransport<Error = BoxedError>>>,
    notification_scheduler: Option<Arc<dyn NotificationScheduler<Error = BoxedError>>>,
    push_token_source: Option<Arc<dyn PushTokenSource<Error = BoxedError>>>,
    push_gateway: Option<Arc<dyn RemotePushGateway<Error = BoxedError>>>,
}

impl CoachChatServiceFactory {
    /// Create a new service factory from the application configuration.
    pub fn new(config: Arc<AppConfig>) -> Self {
        let mut factory = Self {
            chat_transport: None,
            notification_scheduler: None,
            push_token_source: None,
            push_gateway: None,
        };

        if is_stream_enabled(&config) {
            let stream_conf = config.stream.as_ref().unwrap();
            if stream_conf.dev_loopback {
                info!("ℹ️ Initializing loopback chat transport (dev harness)...");
                let hub = InMemoryHub::new();
                factory.chat_transport = Some(Arc::new(InMemoryTransport::new(hub)));
                info!("✅ Loopback chat transport initialized.");
            } else {
                warn!(
                    "Chat transport enabled but no provider connection is compiled in; \
                     the embedding shell must supply one"
                );
            }
        }

        if is_notifications_enabled(&config) {
            let notify_conf = config.notifications.as_ref().unwrap();

            info!("ℹ️ Initializing in-process notification scheduler...");
            factory.notification_scheduler = Some(Arc::new(InProcessScheduler::granted()));
            info!("✅ Notification scheduler initialized.");

            if notify_conf.allow_mock_tokens {
                info!("ℹ️ Mock push tokens enabled (dev harness).");
                factory.push_token_source =
                    Some(Arc::new(MockTokenSource::new(Platform::Android)));
            }

            if let Some(url) = notify_conf.push_gateway_url.as_ref() {
                match HttpPushGateway::new(url.clone(), notify_conf.request_timeout_secs) {
                    Ok(gateway) => {
                        factory.push_gateway =
                            Some(Arc::new(BoxedPushGateway { inner: gateway }));
                        info!("✅ Remote push gateway initialized at {}.", url);
                    }
                    Err(e) => {
                        error!("🚨 Failed to initialize push gateway: {}. Remote path disabled.", e);
                    }
                }
            }
        }

        factory
    }
}

impl ServiceFactory for CoachChatServiceFactory {
    fn chat_transport(&self) -> Option<Arc<dyn ChatTransport<Error = BoxedError>>> {
        self.chat_transport.clone()
    }

    fn notification_scheduler(&self) -> Option<Arc<dyn NotificationScheduler<Error = BoxedError>>> {
        self.notification_scheduler.clone()
    }

    fn push_token_source(&self) -> Option<Arc<dyn PushTokenSource<Error = BoxedError>>> {
        self.push_token_source.clone()
    }

    fn push_gateway(&self) -> Option<Arc<dyn RemotePushGateway<Error = BoxedError>>> {
        self.push_gateway.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachchat_config::{NotificationsConfig, ServerConfig, StreamConfig, TokenKind};

    fn base_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
            use_stream: true,
            use_notifications: true,
            database: None,
            stream: Some(StreamConfig {
                api_key: "key".into(),
                api_url: "http://127.0.0.1:0".into(),
                api_secret: None,
                token_ttl_secs: None,
                request_timeout_secs: None,
                dev_loopback: true,
            }),
            notifications: Some(NotificationsConfig {
                token_kind: TokenKind::Mock,
                allow_mock_tokens: true,
                push_gateway_url: None,
                request_timeout_secs: None,
            }),
            agent: None,
        }
    }

    #[test]
    fn dev_config_yields_loopback_services() {
        let factory = CoachChatServiceFactory::new(Arc::new(base_config()));
        assert!(factory.chat_transport().is_some());
        assert!(factory.notification_scheduler().is_some());
        assert!(factory.push_token_source().is_some());
        assert!(factory.push_gateway().is_none());
    }

    #[test]
    fn mock_token_source_requires_the_flag() {
        let mut config = base_config();
        config.notifications.as_mut().unwrap().allow_mock_tokens = false;
        let factory = CoachChatServiceFactory::new(Arc::new(config));
        assert!(factory.push_token_source().is_none());
    }

    #[test]
    fn disabled_flags_disable_the_services() {
        let mut config = base_config();
        config.use_stream = false;
        config.use_notifications = false;
        let factory = CoachChatServiceFactory::new(Arc::new(config));
        assert!(factory.chat_transport().is_none());
        assert!(factory.notification_scheduler().is_none());
    }
}
