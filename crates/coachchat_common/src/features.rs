//! Runtime feature flag handling.
//!
//! Optional integrations are controlled in two steps: a `use_*` flag and the
//! presence of the matching configuration section. Both must be set for the
//! feature to be active — a flag without a section is treated as disabled
//! rather than an error, so a partially filled config file still boots.

use coachchat_config::AppConfig;
use std::sync::Arc;

/// Check if a feature is enabled at runtime based on configuration.
///
/// # Arguments
///
/// * `use_feature` - The configuration flag that enables the feature
/// * `feature_config` - The configuration section for the feature
pub fn is_feature_enabled<T>(
    _config: &Arc<AppConfig>,
    use_feature: bool,
    feature_config: Option<&T>,
) -> bool {
    use_feature && feature_config.is_some()
}

/// Check if the chat transport integration is enabled at runtime.
pub fn is_stream_enabled(config: &Arc<AppConfig>) -> bool {
    is_feature_enabled(config, config.use_stream, config.stream.as_ref())
}

/// Check if the notification subsystem is enabled at runtime.
pub fn is_notifications_enabled(config: &Arc<AppConfig>) -> bool {
    is_feature_enabled(
        config,
        config.use_notifications,
        config.notifications.as_ref(),
    )
}
