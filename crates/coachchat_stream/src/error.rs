//! Error types for the chat transport integration

use thiserror::Error;

/// Errors that can occur when working with the chat transport
#[derive(Debug, Error)]
pub enum StreamError {
    /// Missing or invalid transport configuration
    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    /// The token-exchange endpoint rejected the request or was unreachable
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// The token-exchange call exceeded its deadline
    #[error("Token exchange timed out: {0}")]
    TokenExchangeTimeout(String),

    /// Error from the underlying transport connection
    #[error("Transport error: {0}")]
    Transport(String),

    /// Operation requires a connected session
    #[error("No active chat session")]
    NotConnected,

    /// Channel resolution failed
    #[error("Channel error: {0}")]
    Channel(String),
}
