// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the Voxio call system.
//!
//! Per-call tunables (greeting, VAD, max duration) live on `CallRequest` in
//! `voxio-core`; this model holds process-level settings: provider webhook
//! endpoints, bridge queue sizing and cadences, registry TTLs, and the
//! activity retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use voxio_core::types::{CallId, WebhookUrls};

/// Root configuration, deserialized from `voxio.toml` plus `VOXIO_` env
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct VoxioConfig {
    pub telephony: TelephonyConfig,
    pub ai: AiConfig,
    pub bridge: BridgeConfig,
    pub registry: RegistryConfig,
    pub workflow: WorkflowConfig,
}

/// Telephony provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TelephonyConfig {
    /// Base URL the provider calls back on (media stream and status
    /// webhooks are derived from it).
    pub webhook_base_url: String,
    /// How long to wait for the call to connect before giving up as
    /// no-answer.
    pub connect_timeout_secs: u64,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            webhook_base_url: "http://localhost:8080".to_string(),
            connect_timeout_secs: 30,
        }
    }
}

impl TelephonyConfig {
    /// Derives the per-call webhook endpoints from the base URL.
    ///
    /// The media stream URL swaps the scheme to the matching WebSocket
    /// scheme; status callbacks stay on HTTP.
    pub fn webhook_urls(&self, call_id: &CallId) -> WebhookUrls {
        let base = self.webhook_base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{base}")
        };
        WebhookUrls {
            media_ws_url: format!("{ws_base}/media/{call_id}"),
            status_callback_url: format!("{base}/status/{call_id}"),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// AI session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AiConfig {
    /// Whether to pre-warm the AI session while the phone rings.
    pub prewarm: bool,
    /// How long an unclaimed pre-warmed session is kept before release.
    pub prewarm_reclaim_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            prewarm: true,
            prewarm_reclaim_secs: 60,
        }
    }
}

impl AiConfig {
    pub fn prewarm_reclaim(&self) -> Duration {
        Duration::from_secs(self.prewarm_reclaim_secs)
    }
}

/// Audio bridge queue sizing and cadences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BridgeConfig {
    /// Capacity of the inbound (caller-to-AI) frame queue.
    pub inbound_queue_frames: usize,
    /// Capacity of the outbound (AI-to-caller) frame queue.
    pub outbound_queue_frames: usize,
    /// Interval between transcript batch deliveries to the orchestrator.
    pub transcript_sync_interval_ms: u64,
    /// Cadence of the outbound playback pump.
    pub playback_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            inbound_queue_frames: 100,
            outbound_queue_frames: 100,
            transcript_sync_interval_ms: 2_000,
            playback_interval_ms: 20,
        }
    }
}

impl BridgeConfig {
    pub fn transcript_sync_interval(&self) -> Duration {
        Duration::from_millis(self.transcript_sync_interval_ms)
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms)
    }
}

/// Session registry TTLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RegistryConfig {
    /// TTL on live session records, preventing orphans.
    pub session_ttl_secs: u64,
    /// Grace TTL applied at cleanup instead of immediate deletion, so
    /// in-flight transport messages can still resolve the record.
    pub cleanup_grace_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 7_200,
            cleanup_grace_secs: 300,
        }
    }
}

impl RegistryConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn cleanup_grace(&self) -> Duration {
        Duration::from_secs(self.cleanup_grace_secs)
    }
}

/// Activity execution policy for the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WorkflowConfig {
    /// Per-attempt timeout for activities.
    pub activity_timeout_secs: u64,
    /// Total attempts per activity (first try plus retries).
    pub activity_max_attempts: u32,
    /// First retry backoff; doubles per attempt.
    pub backoff_initial_ms: u64,
    /// Backoff ceiling.
    pub backoff_max_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            activity_timeout_secs: 30,
            activity_max_attempts: 3,
            backoff_initial_ms: 500,
            backoff_max_ms: 8_000,
        }
    }
}

impl WorkflowConfig {
    pub fn activity_timeout(&self) -> Duration {
        Duration::from_secs(self.activity_timeout_secs)
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}
