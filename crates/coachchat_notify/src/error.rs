//! Error types for the notification core

use thiserror::Error;

/// Errors that can occur while registering a device for push notifications.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The user declined notification access. Non-fatal: delivery attempts
    /// are suppressed until permission is re-requested.
    #[error("notification permission denied")]
    PermissionDenied,

    /// Registration was attempted from a simulator, emulator, or another
    /// environment that cannot receive push notifications. Skipped silently
    /// by callers; no record is written.
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// Token fetch or persistence was unreachable. Transient: callers should
    /// retry with backoff rather than fail the whole initialization.
    #[error("network error during registration: {0}")]
    NetworkError(String),
}
