// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Voxio workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::VoxioError;
use crate::vad::VadConfig;

/// Greeting used when a call request does not provide one.
pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

/// System prompt the AI session falls back to when the request has none.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful voice assistant. Be concise and natural.";

/// Maximum call duration applied when the request does not set one.
pub const DEFAULT_MAX_DURATION_SECONDS: u64 = 1800;

/// Unique identifier for one call (also the orchestrator instance id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

impl CallId {
    /// Generates a fresh random call id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for one active transport connection, distinct from the call id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(pub String);

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a call.
///
/// Transitions are monotonic: `Initiated -> Ringing -> InProgress` with
/// terminal exits; terminal states have no outgoing transitions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Initiated,
    Ringing,
    InProgress,
    Completed,
    Failed,
    NoAnswer,
    Busy,
    Canceled,
}

impl CallStatus {
    /// Returns true if no further transitions are allowed from this status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CallStatus::Completed
                | CallStatus::Failed
                | CallStatus::NoAnswer
                | CallStatus::Busy
                | CallStatus::Canceled
        )
    }

    /// Maps a provider-reported status string to a [`CallStatus`].
    ///
    /// Returns `None` for strings the provider taxonomy does not cover;
    /// callers log and ignore those rather than failing the call.
    pub fn from_provider(status: &str) -> Option<Self> {
        match status {
            "initiated" => Some(CallStatus::Initiated),
            "ringing" => Some(CallStatus::Ringing),
            "answered" | "in-progress" => Some(CallStatus::InProgress),
            "completed" => Some(CallStatus::Completed),
            "busy" => Some(CallStatus::Busy),
            "no-answer" => Some(CallStatus::NoAnswer),
            "failed" => Some(CallStatus::Failed),
            "canceled" => Some(CallStatus::Canceled),
            _ => None,
        }
    }
}

/// Who produced a transcript fragment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// A single fragment of conversation transcript.
///
/// Fragments are append-only; `seq` increases monotonically per direction
/// and batching never reorders fragments within a direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub direction: Speaker,
    pub text: String,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
}

/// Why a bridge session stopped streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    Normal,
    Error,
}

/// Input for starting a call. Immutable once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallRequest {
    /// Phone number to call, E.164 format.
    pub phone_number: String,
    /// Initial greeting the AI opens the call with.
    #[serde(default = "default_greeting")]
    pub greeting: String,
    /// Custom system prompt for AI behavior.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum call duration in seconds.
    #[serde(default = "default_max_duration")]
    pub max_duration_seconds: u64,
    /// Voice activity detection tuning; defaults applied when absent.
    #[serde(default)]
    pub vad: VadConfig,
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_max_duration() -> u64 {
    DEFAULT_MAX_DURATION_SECONDS
}

impl CallRequest {
    /// Creates a request with defaults for everything but the phone number.
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            greeting: default_greeting(),
            system_prompt: None,
            max_duration_seconds: default_max_duration(),
            vad: VadConfig::default(),
        }
    }

    /// Validates the request before any side effect happens.
    ///
    /// Rejects malformed phone numbers, a zero max duration, and VAD timing
    /// values outside their documented ranges. Never coerces invalid values.
    pub fn validate(&self) -> Result<(), VoxioError> {
        if !is_e164(&self.phone_number) {
            return Err(VoxioError::Configuration(format!(
                "phone_number `{}` is not a valid E.164 number",
                self.phone_number
            )));
        }
        if self.max_duration_seconds == 0 {
            return Err(VoxioError::Configuration(
                "max_duration_seconds must be greater than zero".to_string(),
            ));
        }
        self.vad.validate()?;
        Ok(())
    }

    /// The system prompt the AI session should run with.
    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

/// Checks E.164 shape: `+` followed by 7 to 15 digits, no leading zero.
fn is_e164(number: &str) -> bool {
    let Some(digits) = number.strip_prefix('+') else {
        return false;
    };
    (7..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0')
}

/// Configuration handed to the AI session on open (pre-warm or attach).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSessionConfig {
    pub greeting: String,
    pub system_prompt: String,
    pub vad: VadConfig,
}

impl AiSessionConfig {
    /// Builds the AI session config for a validated call request.
    pub fn from_request(request: &CallRequest) -> Self {
        Self {
            greeting: request.greeting.clone(),
            system_prompt: request.effective_system_prompt().to_string(),
            vad: request.vad.clone(),
        }
    }
}

/// One event emitted by an AI streaming session.
#[derive(Debug, Clone, PartialEq)]
pub enum AiEvent {
    /// PCM16 audio chunk at the session output rate (24 kHz).
    Audio(Vec<i16>),
    /// Incremental transcription of the caller's speech.
    UserTranscript(String),
    /// Incremental transcription of the agent's speech.
    AgentTranscript(String),
    /// The user started speaking over an in-flight agent utterance.
    Interrupted,
    /// The session closed upstream; no further events will arrive.
    Closed,
}

/// One event from the telephony media transport.
///
/// Valid order is `Start`, zero or more `Media`, then `Stop`; anything else
/// is rejected by the bridge manager without crashing the process.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Start { stream_id: StreamId, call_id: CallId },
    /// Codec-native (mu-law 8 kHz) audio payload, framed by the transport.
    Media { payload: Vec<u8> },
    Stop,
}

/// Coarse-grained signal sent from the data path to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum CallSignal {
    /// Media streaming started (at most once per call has effect).
    StreamingStarted { stream_id: StreamId },
    /// A periodic batch of transcript fragments is available.
    TranscriptsAvailable(Vec<TranscriptFragment>),
    /// The telephony provider reported a call status change.
    CallStatusChanged { provider_status: String },
    /// Media streaming ended (once per call).
    StreamingEnded { reason: EndReason },
}

/// Answer to the `get_call_config` query, consumed by the front door
/// before the transport exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallConfigSnapshot {
    pub call_id: CallId,
    pub greeting: String,
    pub system_prompt: String,
    pub vad: VadConfig,
}

/// Answer to the `get_status` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: CallStatus,
    pub transcript_count: u64,
}

/// Final outcome persisted when a call reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    pub call_id: CallId,
    pub status: CallStatus,
    pub phone_number: String,
    pub provider_call_id: Option<String>,
    pub stream_id: Option<StreamId>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u64>,
    pub transcript_count: u64,
}

/// Webhook endpoints the telephony provider calls back on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookUrls {
    /// WebSocket URL the provider streams call media to.
    pub media_ws_url: String,
    /// URL receiving call status callbacks.
    pub status_callback_url: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Telephony,
    Ai,
    Persistence,
    Registry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_status_terminal_partition() {
        let non_terminal = [
            CallStatus::Initiated,
            CallStatus::Ringing,
            CallStatus::InProgress,
        ];
        let terminal = [
            CallStatus::Completed,
            CallStatus::Failed,
            CallStatus::NoAnswer,
            CallStatus::Busy,
            CallStatus::Canceled,
        ];
        for status in non_terminal {
            assert!(!status.is_terminal(), "{status} should not be terminal");
        }
        for status in terminal {
            assert!(status.is_terminal(), "{status} should be terminal");
        }
    }

    #[test]
    fn call_status_serializes_snake_case() {
        let json = serde_json::to_string(&CallStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let json = serde_json::to_string(&CallStatus::NoAnswer).unwrap();
        assert_eq!(json, "\"no_answer\"");
    }

    #[test]
    fn provider_status_mapping() {
        assert_eq!(
            CallStatus::from_provider("answered"),
            Some(CallStatus::InProgress)
        );
        assert_eq!(
            CallStatus::from_provider("in-progress"),
            Some(CallStatus::InProgress)
        );
        assert_eq!(
            CallStatus::from_provider("no-answer"),
            Some(CallStatus::NoAnswer)
        );
        assert_eq!(CallStatus::from_provider("queued"), None);
    }

    #[test]
    fn call_request_defaults_applied() {
        let json = r#"{"phone_number": "+15551234567"}"#;
        let request: CallRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.greeting, DEFAULT_GREETING);
        assert_eq!(request.max_duration_seconds, 1800);
        assert!(request.system_prompt.is_none());
        assert!(!request.vad.disabled);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn call_request_rejects_bad_phone_numbers() {
        for number in ["5551234567", "+0123456789", "+1555abc4567", "+12", ""] {
            let request = CallRequest::new(number);
            assert!(
                request.validate().is_err(),
                "`{number}` should fail validation"
            );
        }
    }

    #[test]
    fn call_request_accepts_e164() {
        for number in ["+15551234567", "+442071838750", "+919876543210"] {
            assert!(CallRequest::new(number).validate().is_ok());
        }
    }

    #[test]
    fn call_request_rejects_zero_duration() {
        let mut request = CallRequest::new("+15551234567");
        request.max_duration_seconds = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn effective_system_prompt_falls_back_to_default() {
        let mut request = CallRequest::new("+15551234567");
        assert_eq!(request.effective_system_prompt(), DEFAULT_SYSTEM_PROMPT);
        request.system_prompt = Some("Be terse.".to_string());
        assert_eq!(request.effective_system_prompt(), "Be terse.");
    }

    #[test]
    fn speaker_round_trips_lowercase() {
        use std::str::FromStr;
        assert_eq!(Speaker::User.to_string(), "user");
        assert_eq!(Speaker::from_str("agent").unwrap(), Speaker::Agent);
    }

    #[test]
    fn call_request_denies_unknown_fields() {
        let json = r#"{"phone_number": "+15551234567", "grating": "oops"}"#;
        assert!(serde_json::from_str::<CallRequest>(json).is_err());
    }
}
