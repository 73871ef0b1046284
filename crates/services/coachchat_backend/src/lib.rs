//! Companion HTTP service for CoachChat.
//!
//! Implements the three endpoints the mobile client depends on: the
//! per-user chat token exchange, push token registration, and a webhook
//! test endpoint for manual verification of the suppression logic.

pub mod app_state;
pub mod handlers;
mod handlers_test;
pub mod routes;

pub use app_state::AppState;
pub use routes::routes;
