// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-zero queue capacities, sane cadences, and a
//! usable webhook base URL. Collects all errors instead of failing fast.

use crate::diagnostic::ConfigError;
use crate::model::VoxioConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors.
pub fn validate_config(config: &VoxioConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base = config.telephony.webhook_base_url.trim();
    if base.is_empty() {
        errors.push(ConfigError::Validation {
            message: "telephony.webhook_base_url must not be empty".to_string(),
        });
    } else if !base.starts_with("http://") && !base.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!(
                "telephony.webhook_base_url `{base}` must start with http:// or https://"
            ),
        });
    }

    if config.telephony.connect_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "telephony.connect_timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.bridge.inbound_queue_frames == 0 {
        errors.push(ConfigError::Validation {
            message: "bridge.inbound_queue_frames must be greater than zero".to_string(),
        });
    }

    if config.bridge.outbound_queue_frames == 0 {
        errors.push(ConfigError::Validation {
            message: "bridge.outbound_queue_frames must be greater than zero".to_string(),
        });
    }

    if !(100..=60_000).contains(&config.bridge.transcript_sync_interval_ms) {
        errors.push(ConfigError::Validation {
            message: format!(
                "bridge.transcript_sync_interval_ms must be within 100..=60000, got {}",
                config.bridge.transcript_sync_interval_ms
            ),
        });
    }

    if !(1..=100).contains(&config.bridge.playback_interval_ms) {
        errors.push(ConfigError::Validation {
            message: format!(
                "bridge.playback_interval_ms must be within 1..=100, got {}",
                config.bridge.playback_interval_ms
            ),
        });
    }

    if config.registry.session_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "registry.session_ttl_secs must be greater than zero".to_string(),
        });
    }

    if config.registry.cleanup_grace_secs > config.registry.session_ttl_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "registry.cleanup_grace_secs ({}) must not exceed session_ttl_secs ({})",
                config.registry.cleanup_grace_secs, config.registry.session_ttl_secs
            ),
        });
    }

    if config.workflow.activity_max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "workflow.activity_max_attempts must be at least 1".to_string(),
        });
    }

    if config.workflow.backoff_initial_ms > config.workflow.backoff_max_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "workflow.backoff_initial_ms ({}) must not exceed backoff_max_ms ({})",
                config.workflow.backoff_initial_ms, config.workflow.backoff_max_ms
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = VoxioConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_webhook_base_fails() {
        let mut config = VoxioConfig::default();
        config.telephony.webhook_base_url = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::Validation { message } if message.contains("webhook_base_url")
        )));
    }

    #[test]
    fn non_http_webhook_base_fails() {
        let mut config = VoxioConfig::default();
        config.telephony.webhook_base_url = "ftp://calls.example.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_queue_capacity_fails() {
        let mut config = VoxioConfig::default();
        config.bridge.outbound_queue_frames = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::Validation { message } if message.contains("outbound_queue_frames")
        )));
    }

    #[test]
    fn sync_interval_bounds_enforced() {
        for interval in [0u64, 99, 60_001] {
            let mut config = VoxioConfig::default();
            config.bridge.transcript_sync_interval_ms = interval;
            assert!(
                validate_config(&config).is_err(),
                "{interval} should be rejected"
            );
        }
    }

    #[test]
    fn grace_longer_than_ttl_fails() {
        let mut config = VoxioConfig::default();
        config.registry.session_ttl_secs = 60;
        config.registry.cleanup_grace_secs = 120;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn backoff_ordering_enforced() {
        let mut config = VoxioConfig::default();
        config.workflow.backoff_initial_ms = 10_000;
        config.workflow.backoff_max_ms = 1_000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn multiple_errors_collected() {
        let mut config = VoxioConfig::default();
        config.bridge.inbound_queue_frames = 0;
        config.bridge.outbound_queue_frames = 0;
        config.workflow.activity_max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
