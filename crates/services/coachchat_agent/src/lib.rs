//! Headless CoachChat client agent.
//!
//! The composition root for the client-side services: configuration in,
//! wired service objects out. The binary in `main.rs` runs the background
//! notification session until interrupted.

pub mod service_factory;

pub use service_factory::CoachChatServiceFactory;
