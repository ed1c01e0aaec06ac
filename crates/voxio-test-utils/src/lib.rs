// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Voxio integration tests.
//!
//! Mock implementations of every adapter seam (telephony, AI session,
//! persistence, transport sink, signal sink) plus [`CallHarness`], which
//! wires them together with the real registry, bridge manager, and
//! workflow for end-to-end tests without external providers.

pub mod harness;
pub mod mock_ai;
pub mod mock_persistence;
pub mod mock_telephony;
pub mod mock_transport;

pub use harness::{CallHarness, CallHarnessBuilder};
pub use mock_ai::{MockAiAdapter, MockAiSession};
pub use mock_persistence::MockPersistence;
pub use mock_telephony::{MockTelephony, PlacementOutcome};
pub use mock_transport::{MockTransport, RecordingSignalSink};

#[cfg(test)]
mod tests {
    use super::*;
    use voxio_core::traits::Adapter;
    use voxio_core::types::HealthStatus;

    #[tokio::test]
    async fn all_mock_adapters_report_healthy() {
        let harness = CallHarness::with_defaults();
        let adapters: Vec<&dyn Adapter> = vec![
            harness.telephony.as_ref(),
            harness.ai.as_ref(),
            harness.persistence.as_ref(),
            harness.registry.as_ref(),
        ];
        for adapter in adapters {
            assert_eq!(
                adapter.health_check().await.unwrap(),
                HealthStatus::Healthy,
                "{} should be healthy",
                adapter.name()
            );
        }
    }

    #[tokio::test]
    async fn harness_builder_applies_scripts() {
        use voxio_core::traits::AiSessionAdapter;
        use voxio_core::types::AiSessionConfig;
        use voxio_core::vad::VadConfig;

        let harness = CallHarness::builder()
            .with_placement_script(vec![PlacementOutcome::TransientFailure])
            .with_failed_ai_opens(1)
            .build();

        let config = AiSessionConfig {
            greeting: "Hello!".to_string(),
            system_prompt: "test".to_string(),
            vad: VadConfig::default(),
        };
        let result = harness.ai.open(config.clone()).await;
        assert!(result.is_err(), "first AI open should fail");
        let result = harness.ai.open(config).await;
        assert!(result.is_ok(), "second AI open should succeed");
    }
}
