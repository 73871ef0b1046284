//! Dev harness binary: runs the full client-side notification pipeline
//! (session, listeners, dispatcher, persistence) without a mobile shell.
//! Point `stream.api_url` at a running coachchat-backend, enable
//! `stream.dev_loopback` and `notifications.allow_mock_tokens`, and send
//! through the loopback hub or the backend's test webhook.

use coachchat_agent::CoachChatServiceFactory;
use coachchat_common::models::ChatUser;
use coachchat_common::services::ServiceFactory;
use coachchat_config::{load_config, AgentProfile};
use coachchat_db::{
    DbClient, NotificationLogRepository, NotificationLogRepositoryFactory, PushTokenRepository,
    PushTokenRepositoryFactory, RepositoryFactory, UserActivityRepository,
    UserActivityRepositoryFactory,
};
use coachchat_notify::{
    configure, ActivityTracker, BackgroundNotificationService, ForegroundPresentation,
    NotificationDispatcher, NotificationLog, TokenRegistry,
};
use coachchat_stream::{ChannelSessionManager, StreamTokenClient};
use std::sync::Arc;
use tracing::info;

fn chat_user(profile: &AgentProfile) -> ChatUser {
    ChatUser {
        id: profile.id.clone(),
        name: profile.name.clone(),
        email: profile.email.clone(),
        role: profile
            .role
            .parse()
            .expect("agent profile role must be 'student' or 'coach'"),
    }
}

#[tokio::main]
async fn main() {
    let config = Arc::new(load_config().expect("Failed to load config"));
    coachchat_common::logging::init();

    let agent_conf = config
        .agent
        .clone()
        .expect("agent configuration section is required");
    let user = chat_user(&agent_conf.user);
    let partner = chat_user(&agent_conf.partner);

    let factory = CoachChatServiceFactory::new(config.clone());
    let transport = factory
        .chat_transport()
        .expect("no chat transport configured; enable stream.dev_loopback for the dev harness");
    let scheduler = factory
        .notification_scheduler()
        .expect("notifications must be enabled for the agent");
    let token_source = factory
        .push_token_source()
        .expect("the dev harness requires notifications.allow_mock_tokens");
    let platform = token_source.platform();

    let db_client = DbClient::new(&config)
        .await
        .expect("Failed to connect to the database");
    let token_repo = Arc::new(PushTokenRepositoryFactory::new().create_repository(db_client.clone()));
    let log_repo =
        Arc::new(NotificationLogRepositoryFactory::new().create_repository(db_client.clone()));
    let activity_repo =
        Arc::new(UserActivityRepositoryFactory::new().create_repository(db_client));
    token_repo
        .init_schema()
        .await
        .expect("Failed to initialize push token schema");
    log_repo
        .init_schema()
        .await
        .expect("Failed to initialize notification log schema");
    activity_repo
        .init_schema()
        .await
        .expect("Failed to initialize user activity schema");

    let allow_mock = config
        .notifications
        .as_ref()
        .map(|n| n.allow_mock_tokens)
        .unwrap_or(false);

    let tracker = Arc::new(ActivityTracker::new(activity_repo));
    let registry = Arc::new(TokenRegistry::new(
        token_repo,
        token_source,
        scheduler.clone(),
        allow_mock,
    ));
    let log = Arc::new(NotificationLog::new(log_repo, platform));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        user.clone(),
        Arc::clone(&tracker),
        registry,
        log,
        scheduler,
        factory.push_gateway(),
    ));
    dispatcher.initialize().await;

    let stream_conf = config
        .stream
        .as_ref()
        .expect("stream configuration section is required");
    let token_client =
        StreamTokenClient::new(stream_conf).expect("Failed to build the token client");
    let session = Arc::new(ChannelSessionManager::new(transport, token_client));
    let service = BackgroundNotificationService::new(session, dispatcher);

    let _presentation = configure(ForegroundPresentation::default());

    service
        .initialize(&user, &partner)
        .await
        .expect("Failed to initialize the background notification session");
    info!(
        "Agent ready: {} ({}) paired with {} — ctrl-c to exit",
        user.name, user.role, partner.name
    );

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");

    if let Err(e) = service.shutdown().await {
        tracing::warn!("Shutdown error: {}", e);
    }
    info!("Agent stopped");
}
