//! Chat transport integration for CoachChat
//!
//! The transport protocol itself is owned by the external chat provider and
//! stays behind the [`ChatTransport`](coachchat_common::services::ChatTransport)
//! trait. This crate supplies everything around it: the server-side token
//! exchange, canonical channel id derivation, the local event projection,
//! the session manager, and an in-process loopback transport for tests and
//! dev harnesses.

pub mod channel;
pub mod error;
pub mod events;
pub mod session;
pub mod token;
pub mod transport;

pub use channel::{canonical_channel_id, ChannelPair, CHANNEL_ID_MAX_LEN};
pub use error::StreamError;
pub use events::ChannelProjection;
pub use session::ChannelSessionManager;
pub use token::StreamTokenClient;
pub use transport::{InMemoryHub, InMemoryTransport};
