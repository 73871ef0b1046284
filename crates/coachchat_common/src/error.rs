use std::fmt;
use thiserror::Error;

/// The base error type for all CoachChat errors.
///
/// This enum provides a common set of error variants that can be used across
/// all crates. Each crate can extend this by implementing
/// `From<SpecificError> for CoachChatError`.
#[derive(Error, Debug)]
pub enum CoachChatError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The user declined notification access. Non-fatal; delivery attempts
    /// are suppressed until permission is re-requested.
    #[error("Notification permission denied: {0}")]
    PermissionDenied(String),

    /// Registration attempted from a simulator/emulator or another
    /// environment without push support.
    #[error("Unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// Transient network failure; retriable.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Channel resolve/send failure on the chat transport.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Local-notification scheduling failed.
    #[error("Scheduling error: {0}")]
    SchedulingError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for CoachChatError {
    fn status_code(&self) -> u16 {
        match self {
            CoachChatError::HttpError(_) => 500,
            CoachChatError::ParseError(_) => 400,
            CoachChatError::ConfigError(_) => 500,
            CoachChatError::AuthError(_) => 401,
            CoachChatError::ValidationError(_) => 400,
            CoachChatError::DatabaseError(_) => 500,
            CoachChatError::PermissionDenied(_) => 403,
            CoachChatError::UnsupportedEnvironment(_) => 422,
            CoachChatError::NetworkError(_) => 502,
            CoachChatError::TransportError(_) => 502,
            CoachChatError::SchedulingError(_) => 500,
            CoachChatError::NotFoundError(_) => 404,
            CoachChatError::TimeoutError(_) => 504,
            CoachChatError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, CoachChatError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, CoachChatError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, CoachChatError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| CoachChatError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, CoachChatError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| CoachChatError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<reqwest::Error> for CoachChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CoachChatError::TimeoutError(err.to_string())
        } else {
            CoachChatError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CoachChatError {
    fn from(err: serde_json::Error) -> Self {
        CoachChatError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for CoachChatError {
    fn from(err: std::io::Error) -> Self {
        CoachChatError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> CoachChatError {
    CoachChatError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> CoachChatError {
    CoachChatError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> CoachChatError {
    CoachChatError::NotFoundError(message.to_string())
}

pub fn transport_error<T: fmt::Display>(message: T) -> CoachChatError {
    CoachChatError::TransportError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> CoachChatError {
    CoachChatError::InternalError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_cover_the_notification_taxonomy() {
        assert_eq!(CoachChatError::PermissionDenied("no".into()).status_code(), 403);
        assert_eq!(
            CoachChatError::UnsupportedEnvironment("simulator".into()).status_code(),
            422
        );
        assert_eq!(CoachChatError::NetworkError("down".into()).status_code(), 502);
        assert_eq!(CoachChatError::TransportError("send".into()).status_code(), 502);
    }

    #[test]
    fn context_wraps_the_source_error() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = result.context("reading tokens").unwrap_err();
        assert!(err.to_string().contains("reading tokens"));
        assert!(err.to_string().contains("boom"));
    }
}
