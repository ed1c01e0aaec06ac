// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end call testing.
//!
//! `CallHarness` assembles the full stack with mock providers: registry,
//! bridge manager, and workflow dependencies. Tests start a call, connect
//! a mock transport, script AI events, and assert on what the mocks
//! recorded.

use std::sync::Arc;

use voxio_bridge::{AudioBridgeSession, BridgeManager};
use voxio_config::VoxioConfig;
use voxio_core::VoxioError;
use voxio_core::types::{CallRequest, CallStatus, StreamId};
use voxio_registry::MemoryRegistry;
use voxio_workflow::{CallHandle, CallWorkflow, WorkflowDeps};

use crate::mock_ai::MockAiAdapter;
use crate::mock_persistence::MockPersistence;
use crate::mock_telephony::{MockTelephony, PlacementOutcome};
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct CallHarnessBuilder {
    config: VoxioConfig,
    placement_script: Vec<PlacementOutcome>,
    failed_ai_opens: usize,
}

impl CallHarnessBuilder {
    fn new() -> Self {
        Self {
            config: VoxioConfig::default(),
            placement_script: Vec::new(),
            failed_ai_opens: 0,
        }
    }

    /// Overrides the process configuration.
    pub fn with_config(mut self, config: VoxioConfig) -> Self {
        self.config = config;
        self
    }

    /// Scripts the telephony placement outcomes, one per attempt.
    pub fn with_placement_script(mut self, script: Vec<PlacementOutcome>) -> Self {
        self.placement_script = script;
        self
    }

    /// Makes the first `count` AI session opens fail.
    pub fn with_failed_ai_opens(mut self, count: usize) -> Self {
        self.failed_ai_opens = count;
        self
    }

    pub fn build(self) -> CallHarness {
        let telephony = Arc::new(MockTelephony::with_script(self.placement_script));
        let ai = Arc::new(MockAiAdapter::new());
        if self.failed_ai_opens > 0 {
            ai.fail_next_opens(self.failed_ai_opens);
        }
        let persistence = Arc::new(MockPersistence::new());
        let registry = Arc::new(MemoryRegistry::new());
        let manager = Arc::new(BridgeManager::new(
            ai.clone(),
            registry.clone(),
            &self.config,
        ));

        CallHarness {
            config: self.config,
            telephony,
            ai,
            persistence,
            registry,
            manager,
        }
    }
}

/// Fully wired test environment with mock external collaborators.
pub struct CallHarness {
    pub config: VoxioConfig,
    pub telephony: Arc<MockTelephony>,
    pub ai: Arc<MockAiAdapter>,
    pub persistence: Arc<MockPersistence>,
    pub registry: Arc<MemoryRegistry>,
    pub manager: Arc<BridgeManager>,
}

impl CallHarness {
    pub fn builder() -> CallHarnessBuilder {
        CallHarnessBuilder::new()
    }

    /// A harness with default configuration and always-succeeding mocks.
    pub fn with_defaults() -> Self {
        Self::builder().build()
    }

    /// The workflow dependency bundle backed by this harness's mocks.
    pub fn deps(&self) -> WorkflowDeps {
        WorkflowDeps {
            telephony: self.telephony.clone(),
            prewarmer: self.manager.clone(),
            persistence: self.persistence.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
        }
    }

    /// Starts a call workflow against the mock stack.
    pub fn start_call(&self, request: CallRequest) -> Result<CallHandle, VoxioError> {
        CallWorkflow::start(request, self.deps())
    }

    /// Simulates the transport `start` event for a running call: attaches
    /// a mock transport and wires bridge signals to the workflow handle.
    pub async fn connect_transport(
        &self,
        handle: &CallHandle,
        stream_id: &str,
    ) -> Result<(Arc<AudioBridgeSession>, Arc<MockTransport>), VoxioError> {
        let transport = Arc::new(MockTransport::new());
        let session = self
            .manager
            .create_or_attach(
                StreamId(stream_id.to_string()),
                handle.call_id().clone(),
                handle.ai_session_config(),
                transport.clone(),
                Arc::new(handle.clone()),
            )
            .await?;
        Ok((session, transport))
    }

    /// Waits until the workflow reports `status`, panicking if it never
    /// arrives.
    ///
    /// Alternates scheduler yields with short sleeps so paused-clock tests
    /// auto-advance through retry backoffs without jumping all the way to
    /// long-range timers (up to ~10 simulated seconds in total).
    pub async fn wait_for_status(&self, handle: &CallHandle, status: CallStatus) {
        for _ in 0..1_000 {
            for _ in 0..50 {
                if handle.get_status().status == status {
                    return;
                }
                tokio::task::yield_now().await;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!(
            "workflow never reached {status}; stuck at {}",
            handle.get_status().status
        );
    }
}
