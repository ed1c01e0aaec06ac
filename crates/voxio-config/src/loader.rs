// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./voxio.toml` > `~/.config/voxio/voxio.toml` >
//! `/etc/voxio/voxio.toml` with environment variable overrides via the
//! `VOXIO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::VoxioConfig;

/// Load configuration from the standard XDG hierarchy with env var
/// overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/voxio/voxio.toml` (system-wide)
/// 3. `~/.config/voxio/voxio.toml` (user XDG config)
/// 4. `./voxio.toml` (local directory)
/// 5. `VOXIO_*` environment variables
pub fn load_config() -> Result<VoxioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VoxioConfig::default()))
        .merge(Toml::file("/etc/voxio/voxio.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("voxio/voxio.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("voxio.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from TOML content only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<VoxioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VoxioConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VoxioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VoxioConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `VOXIO_BRIDGE_PLAYBACK_INTERVAL_MS`
/// must map to `bridge.playback_interval_ms`, not `bridge.playback.…`.
fn env_provider() -> Env {
    Env::prefixed("VOXIO_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("telephony_", "telephony.", 1)
            .replacen("ai_", "ai.", 1)
            .replacen("bridge_", "bridge.", 1)
            .replacen("registry_", "registry.", 1)
            .replacen("workflow_", "workflow.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, VoxioConfig::default());
    }

    #[test]
    fn toml_sections_override_defaults() {
        let config = load_config_from_str(
            r#"
[telephony]
webhook_base_url = "https://calls.example.com"
connect_timeout_secs = 15

[registry]
session_ttl_secs = 600
"#,
        )
        .unwrap();
        assert_eq!(config.telephony.webhook_base_url, "https://calls.example.com");
        assert_eq!(config.telephony.connect_timeout_secs, 15);
        assert_eq!(config.registry.session_ttl_secs, 600);
        // Untouched sections keep defaults.
        assert_eq!(config.bridge.playback_interval_ms, 20);
    }

    #[test]
    fn unknown_section_key_fails_extraction() {
        let result = load_config_from_str(
            r#"
[workflow]
activity_max_atempts = 4
"#,
        );
        assert!(result.is_err());
    }
}
