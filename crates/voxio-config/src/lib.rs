// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Voxio call system.
//!
//! Layered loading (defaults, system TOML, XDG TOML, local TOML, `VOXIO_`
//! env vars) via Figment, with collected semantic validation and miette
//! diagnostics for deserialization failures.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, figment_to_config_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AiConfig, BridgeConfig, RegistryConfig, TelephonyConfig, VoxioConfig, WorkflowConfig,
};
pub use validation::validate_config;

/// Load and validate configuration in one step.
///
/// Deserialization failures and semantic validation failures both surface
/// as [`ConfigError`] diagnostics.
pub fn load_validated_config() -> Result<VoxioConfig, Vec<ConfigError>> {
    let config = loader::load_config().map_err(figment_to_config_errors)?;
    validation::validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_defaults_pass_validation() {
        let config = load_config_from_str("").unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn loaded_out_of_range_value_fails_validation() {
        let config = load_config_from_str(
            r#"
[bridge]
playback_interval_ms = 500
"#,
        )
        .unwrap();
        assert!(validate_config(&config).is_err());
    }
}
