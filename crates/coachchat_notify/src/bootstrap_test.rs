#[cfg(test)]
mod tests {
    use crate::activity::ActivityTracker;
    use crate::bootstrap::BackgroundNotificationService;
    use crate::dev::{InProcessScheduler, MockTokenSource};
    use crate::dispatcher::NotificationDispatcher;
    use crate::log::NotificationLog;
    use crate::registry::TokenRegistry;
    use crate::testutil::{MemoryActivityRepo, MemoryLogRepo, MemoryTokenRepo};
    use coachchat_common::models::{ChatUser, NotificationStatus, Platform, UserRole};
    use coachchat_common::services::{BoxedError, NotificationScheduler};
    use coachchat_config::StreamConfig;
    use coachchat_stream::{ChannelSessionManager, InMemoryHub, InMemoryTransport, StreamTokenClient};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn alice() -> ChatUser {
        ChatUser {
            id: "student-1".into(),
            name: "Alice".into(),
            email: None,
            role: UserRole::Student,
        }
    }

    fn bob() -> ChatUser {
        ChatUser {
            id: "coach-1".into(),
            name: "Bob".into(),
            email: None,
            role: UserRole::Coach,
        }
    }

    async fn token_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/stream-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "test-token"
            })))
            .mount(&server)
            .await;
        server
    }

    fn session_for(server: &MockServer, hub: Arc<InMemoryHub>) -> Arc<ChannelSessionManager> {
        let config = StreamConfig {
            api_key: "key".into(),
            api_url: server.uri(),
            api_secret: None,
            token_ttl_secs: None,
            request_timeout_secs: Some(2),
            dev_loopback: true,
        };
        Arc::new(ChannelSessionManager::new(
            Arc::new(InMemoryTransport::new(hub)),
            StreamTokenClient::new(&config).unwrap(),
        ))
    }

    struct CoachSide {
        tracker: Arc<ActivityTracker<MemoryActivityRepo>>,
        log_repo: Arc<MemoryLogRepo>,
        scheduler: Arc<InProcessScheduler>,
        service:
            BackgroundNotificationService<MemoryActivityRepo, MemoryTokenRepo, MemoryLogRepo>,
        hub: Arc<InMemoryHub>,
    }

    async fn coach_side(server: &MockServer) -> CoachSide {
        let hub = InMemoryHub::new();
        let tracker = Arc::new(ActivityTracker::new(Arc::new(MemoryActivityRepo::new())));
        let log_repo = Arc::new(MemoryLogRepo::new());
        let scheduler = Arc::new(InProcessScheduler::granted());
        let registry = Arc::new(TokenRegistry::new(
            Arc::new(MemoryTokenRepo::new()),
            Arc::new(MockTokenSource::new(Platform::Android)),
            scheduler.clone() as Arc<dyn NotificationScheduler<Error = BoxedError>>,
            true,
        ));
        let log = Arc::new(NotificationLog::new(Arc::clone(&log_repo), Platform::Android));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            bob(),
            Arc::clone(&tracker),
            registry,
            log,
            scheduler.clone() as Arc<dyn NotificationScheduler<Error = BoxedError>>,
            None,
        ));
        let service =
            BackgroundNotificationService::new(session_for(server, hub.clone()), dispatcher);
        CoachSide {
            tracker,
            log_repo,
            scheduler,
            service,
            hub,
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn away_recipient_gets_one_notification_from_senders_name() {
        let server = token_server().await;
        let coach = coach_side(&server).await;
        coach.service.initialize(&bob(), &alice()).await.unwrap();

        // Alice connects to the same hub from her own client and sends.
        let alice_session = session_for(&server, coach.hub.clone());
        alice_session.initialize(&alice()).await.unwrap();
        let channel_id = alice_session
            .resolve_channel_for(&alice(), &bob())
            .await
            .unwrap();
        alice_session
            .send_message(&channel_id, "Hello coach")
            .await
            .unwrap();

        wait_until(|| !coach.scheduler.scheduled().is_empty()).await;

        let scheduled = coach.scheduler.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].notification.title, "Alice");
        assert_eq!(scheduled[0].notification.body, "Hello coach");

        wait_until(|| !coach.log_repo.entries_for("coach-1").is_empty()).await;
        let entries = coach.log_repo.entries_for("coach-1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, NotificationStatus::Delivered);
    }

    #[tokio::test]
    async fn recipient_in_chat_sees_no_notification_and_one_suppressed_entry() {
        let server = token_server().await;
        let coach = coach_side(&server).await;
        coach.service.initialize(&bob(), &alice()).await.unwrap();
        coach.tracker.set_activity("coach-1", Platform::Android, true);

        let alice_session = session_for(&server, coach.hub.clone());
        alice_session.initialize(&alice()).await.unwrap();
        let channel_id = alice_session
            .resolve_channel_for(&alice(), &bob())
            .await
            .unwrap();
        alice_session
            .send_message(&channel_id, "Hello coach")
            .await
            .unwrap();

        wait_until(|| !coach.log_repo.entries_for("coach-1").is_empty()).await;

        let entries = coach.log_repo.entries_for("coach-1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, NotificationStatus::Suppressed);
        assert!(coach.scheduler.scheduled().is_empty());
    }

    #[tokio::test]
    async fn initialize_is_idempotent_per_user() {
        let server = token_server().await;
        let coach = coach_side(&server).await;

        coach.service.initialize(&bob(), &alice()).await.unwrap();
        coach.service.initialize(&bob(), &alice()).await.unwrap();

        assert!(coach.service.is_ready().await);
        assert_eq!(coach.hub.connected_users().await, vec!["coach-1".to_string()]);
    }

    #[tokio::test]
    async fn shutdown_stops_message_forwarding() {
        let server = token_server().await;
        let coach = coach_side(&server).await;
        coach.service.initialize(&bob(), &alice()).await.unwrap();

        let alice_session = session_for(&server, coach.hub.clone());
        alice_session.initialize(&alice()).await.unwrap();
        let channel_id = alice_session
            .resolve_channel_for(&alice(), &bob())
            .await
            .unwrap();

        coach.service.shutdown().await.unwrap();
        assert!(!coach.service.is_ready().await);

        alice_session
            .send_message(&channel_id, "Anyone there?")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(coach.scheduler.scheduled().is_empty());
        assert!(coach.log_repo.entries_for("coach-1").is_empty());
    }
}
