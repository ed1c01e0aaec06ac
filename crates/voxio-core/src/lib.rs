// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Voxio call system.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Voxio workspace: the call request and
//! VAD configuration models, the call status state space, the signal
//! contract between the audio bridge and the orchestrator, and the adapter
//! traits behind which the telephony provider, the AI streaming provider,
//! and durable storage live.

pub mod error;
pub mod traits;
pub mod types;
pub mod vad;

// Re-export key items at crate root for ergonomic imports.
pub use error::VoxioError;
pub use types::{
    AdapterType, AiEvent, AiSessionConfig, CallConfigSnapshot, CallId, CallRequest,
    CallResult, CallSignal, CallStatus, EndReason, HealthStatus, Speaker, StatusSnapshot,
    StreamId, TranscriptFragment, TransportEvent, WebhookUrls,
};
pub use vad::{VadConfig, VadSensitivity};

// Re-export all adapter traits at crate root.
pub use traits::{
    Adapter, AiSession, AiSessionAdapter, PersistenceAdapter, SessionPrewarmer, SignalSink,
    TelephonyAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Telephony,
            AdapterType::Ai,
            AdapterType::Persistence,
            AdapterType::Registry,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn call_and_stream_ids_are_distinct_types() {
        let call = CallId::generate();
        let call2 = CallId::generate();
        assert_ne!(call, call2, "generated call ids must be unique");

        let stream = StreamId("MZ0123".into());
        assert_eq!(stream.to_string(), "MZ0123");
    }

    #[test]
    fn all_adapter_traits_are_exported() {
        // Object-safety check: every seam must be usable as a trait object.
        fn _assert_adapter(_: &dyn Adapter) {}
        fn _assert_telephony(_: &dyn TelephonyAdapter) {}
        fn _assert_ai_adapter(_: &dyn AiSessionAdapter) {}
        fn _assert_ai_session(_: &dyn AiSession) {}
        fn _assert_persistence(_: &dyn PersistenceAdapter) {}
        fn _assert_signal_sink(_: &dyn SignalSink) {}
        fn _assert_prewarmer(_: &dyn SessionPrewarmer) {}
    }
}
