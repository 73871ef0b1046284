//! Explicit notification-handler configuration.
//!
//! The foreground presentation policy (whether an alert is shown, a sound
//! played, and the badge updated while the app is frontmost) is installed by
//! an explicit [`configure`] call during startup instead of as an import-time
//! side effect. The returned guard uninstalls the policy on drop, so tests
//! can tear it down deterministically.

use once_cell::sync::Lazy;
use std::sync::{PoisonError, RwLock};

/// How notifications present while the app is in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForegroundPresentation {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

impl Default for ForegroundPresentation {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: true,
        }
    }
}

static PRESENTATION: Lazy<RwLock<Option<ForegroundPresentation>>> =
    Lazy::new(|| RwLock::new(None));

/// Install the foreground presentation policy. Call once during startup.
///
/// A later call replaces the policy; dropping the returned guard uninstalls
/// whatever is currently active.
#[must_use = "dropping the guard immediately uninstalls the policy"]
pub fn configure(policy: ForegroundPresentation) -> PresentationGuard {
    *PRESENTATION.write().unwrap_or_else(PoisonError::into_inner) = Some(policy);
    PresentationGuard { _private: () }
}

/// The currently installed policy, if [`configure`] has been called.
pub fn current_presentation() -> Option<ForegroundPresentation> {
    *PRESENTATION.read().unwrap_or_else(PoisonError::into_inner)
}

/// Uninstalls the presentation policy when dropped.
pub struct PresentationGuard {
    _private: (),
}

impl Drop for PresentationGuard {
    fn drop(&mut self) {
        *PRESENTATION.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
