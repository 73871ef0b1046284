//! Notification delivery and suppression core for CoachChat
//!
//! For every incoming chat event this crate decides whether to register a
//! device, persist a log entry, or display a human-visible alert — without
//! racing the user's navigation state. The pieces:
//!
//! - [`ActivityTracker`] — per-user "currently viewing chat" flag; cached
//!   in memory for the hot path, persisted best-effort behind it.
//! - [`TokenRegistry`] — one push registration per `(user, platform)`, all
//!   token capabilities behind one configuration-selected enum.
//! - [`NotificationLog`] — append-only outcome telemetry.
//! - [`NotificationDispatcher`] — the suppress / local / remote decision
//!   core.
//! - [`BackgroundNotificationService`] — keeps events flowing to the
//!   dispatcher while no chat UI is mounted.
//! - [`configure`] — explicit, disposable foreground-presentation setup.

pub mod activity;
pub mod bootstrap;
mod bootstrap_test;
pub mod configure;
pub mod dev;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod log;
pub mod registry;
#[cfg(test)]
pub(crate) mod testutil;

pub use activity::ActivityTracker;
pub use bootstrap::BackgroundNotificationService;
pub use configure::{configure, current_presentation, ForegroundPresentation, PresentationGuard};
pub use dispatcher::{
    preview_body, DispatchOutcome, NotificationDispatcher, RegistrationState,
    NOTIFICATION_KIND_CHAT,
};
pub use error::RegistrationError;
pub use gateway::{GatewayError, HttpPushGateway};
pub use log::NotificationLog;
pub use registry::TokenRegistry;
