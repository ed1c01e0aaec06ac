// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Voxio call system.
//!
//! Raw provider errors are classified into this taxonomy at the adapter
//! boundary; the orchestrator only ever observes classified outcomes.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Voxio adapter traits and core
/// operations.
#[derive(Debug, Error)]
pub enum VoxioError {
    /// Invalid request or configuration (bad phone format, out-of-range VAD
    /// values). Rejected before any side effect, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Rate limiting or timeouts from the telephony/AI providers. Retried
    /// with bounded backoff inside the activity layer.
    #[error("transient provider error: {message}")]
    TransientProvider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pre-warmed session missing or not ready on transport connect.
    /// Triggers synchronous fallback creation, not fatal.
    #[error("session attach failed: {0}")]
    SessionAttach(String),

    /// The transport closed or errored mid-call.
    #[error("transport disconnected: {reason}")]
    TransportDisconnect { reason: String },

    /// An activity exceeded its bound after retries.
    #[error("activity `{activity}` timed out after {duration:?}")]
    ActivityTimeout { activity: String, duration: Duration },

    /// Session registry errors (lost record, backend failure).
    #[error("registry error: {0}")]
    Registry(String),

    /// AI session errors that are not transient (protocol violation,
    /// rejected configuration, closed session).
    #[error("AI session error: {message}")]
    Ai {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VoxioError {
    /// Convenience constructor for transient provider failures.
    pub fn transient(message: impl Into<String>) -> Self {
        VoxioError::TransientProvider {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the activity layer may retry the failed operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, VoxioError::TransientProvider { .. })
    }
}
