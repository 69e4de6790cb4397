use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - At least one device, no duplicate device ids
/// - Non-zero concurrency, worker count, deadline and history capacity
/// - Recognizer URL (when configured) is http(s)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return invalid("server.port cannot be 0");
    }

    // Devices
    let ids = &config.devices.device_ids;
    if ids.is_empty() {
        return invalid("devices.device_ids must list at least one device");
    }
    let unique: HashSet<_> = ids.iter().collect();
    if unique.len() != ids.len() {
        return invalid("devices.device_ids contains duplicates");
    }

    if config.admission.max_concurrent == 0 {
        return invalid("admission.max_concurrent cannot be 0");
    }
    if config.orchestrator.workers_per_device == 0 {
        return invalid("orchestrator.workers_per_device cannot be 0");
    }
    if config.orchestrator.request_deadline_ms == 0 {
        return invalid("orchestrator.request_deadline_ms cannot be 0");
    }
    if config.tracker.history_capacity == 0 {
        return invalid("tracker.history_capacity cannot be 0");
    }
    if config.loader.fetch_timeout_secs == 0 {
        return invalid("loader.fetch_timeout_secs cannot be 0");
    }

    if let Some(recognizer) = &config.recognizer {
        if !(recognizer.url.starts_with("http://") || recognizer.url.starts_with("https://")) {
            return invalid("recognizer.url must start with http:// or https://");
        }
    }

    Ok(())
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message.to_string()))
}
