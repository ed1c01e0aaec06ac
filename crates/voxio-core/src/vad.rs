// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice activity detection configuration.
//!
//! A closed, validated structure replaces the loose key/value VAD maps the
//! AI provider accepts: sensitivities are a two-value enum and the timing
//! fields are range-checked once at the system boundary. Nothing
//! unvalidated reaches the bridge.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::VoxioError;

/// Inclusive range accepted for `prefix_padding_ms`.
pub const PREFIX_PADDING_RANGE_MS: std::ops::RangeInclusive<u32> = 20..=500;

/// Inclusive range accepted for `silence_duration_ms`.
pub const SILENCE_DURATION_RANGE_MS: std::ops::RangeInclusive<u32> = 100..=2000;

/// How eagerly speech start/end is declared.
///
/// Parses exactly `high` or `low` (case-insensitive); any other string is
/// rejected at deserialization, never coerced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum VadSensitivity {
    High,
    Low,
}

/// Voice activity detection tuning for one call.
///
/// Defaults are the values tuned for phone audio: a sensitive speech start
/// (respond quickly) with a tolerant speech end (do not cut callers off
/// mid-sentence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct VadConfig {
    /// Disables automatic activity detection entirely.
    pub disabled: bool,
    pub start_sensitivity: VadSensitivity,
    pub end_sensitivity: VadSensitivity,
    /// Audio retained before the detected start of speech.
    pub prefix_padding_ms: u32,
    /// Silence length that declares end of speech.
    pub silence_duration_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            start_sensitivity: VadSensitivity::High,
            end_sensitivity: VadSensitivity::Low,
            prefix_padding_ms: 200,
            silence_duration_ms: 500,
        }
    }
}

impl VadConfig {
    /// Checks the timing fields against their documented ranges.
    pub fn validate(&self) -> Result<(), VoxioError> {
        if !PREFIX_PADDING_RANGE_MS.contains(&self.prefix_padding_ms) {
            return Err(VoxioError::Configuration(format!(
                "vad.prefix_padding_ms must be within {}..={} ms, got {}",
                PREFIX_PADDING_RANGE_MS.start(),
                PREFIX_PADDING_RANGE_MS.end(),
                self.prefix_padding_ms
            )));
        }
        if !SILENCE_DURATION_RANGE_MS.contains(&self.silence_duration_ms) {
            return Err(VoxioError::Configuration(format!(
                "vad.silence_duration_ms must be within {}..={} ms, got {}",
                SILENCE_DURATION_RANGE_MS.start(),
                SILENCE_DURATION_RANGE_MS.end(),
                self.silence_duration_ms
            )));
        }
        Ok(())
    }
}
