// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock telephony adapter for deterministic testing.
//!
//! Placement outcomes are scripted per attempt; every dial and hangup is
//! recorded so tests can assert exactly how often the provider was hit.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use voxio_core::VoxioError;
use voxio_core::traits::{Adapter, TelephonyAdapter};
use voxio_core::types::{AdapterType, HealthStatus, WebhookUrls};

/// Outcome of one scripted placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// The dial succeeds and a provider call id is returned.
    Succeed,
    /// The provider reports a transient failure (retryable).
    TransientFailure,
    /// The provider reports a permanent failure (not retryable).
    PermanentFailure,
}

/// A mock telephony provider with scripted placement outcomes.
///
/// Outcomes are popped from a FIFO script; when the script is empty every
/// attempt succeeds.
pub struct MockTelephony {
    script: Mutex<VecDeque<PlacementOutcome>>,
    placements: Mutex<Vec<String>>,
    hangups: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

impl MockTelephony {
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(script: Vec<PlacementOutcome>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(script)),
            placements: Mutex::new(Vec::new()),
            hangups: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Phone numbers actually dialed (successful placements only).
    pub fn placements(&self) -> Vec<String> {
        self.placements.lock().expect("placements lock").clone()
    }

    pub fn placement_count(&self) -> usize {
        self.placements.lock().expect("placements lock").len()
    }

    /// Provider call ids that were hung up.
    pub fn hangups(&self) -> Vec<String> {
        self.hangups.lock().expect("hangups lock").clone()
    }
}

impl Default for MockTelephony {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockTelephony {
    fn name(&self) -> &str {
        "mock-telephony"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Telephony
    }

    async fn health_check(&self) -> Result<HealthStatus, VoxioError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VoxioError> {
        Ok(())
    }
}

#[async_trait]
impl TelephonyAdapter for MockTelephony {
    async fn place_call(
        &self,
        phone_number: &str,
        _webhooks: &WebhookUrls,
    ) -> Result<String, VoxioError> {
        let outcome = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(PlacementOutcome::Succeed);

        match outcome {
            PlacementOutcome::Succeed => {
                self.placements
                    .lock()
                    .expect("placements lock")
                    .push(phone_number.to_string());
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                Ok(format!("CA-mock-{id}"))
            }
            PlacementOutcome::TransientFailure => {
                Err(VoxioError::transient("provider rate limited"))
            }
            PlacementOutcome::PermanentFailure => Err(VoxioError::Configuration(
                "destination rejected by provider".into(),
            )),
        }
    }

    async fn hangup(&self, provider_call_id: &str) -> Result<(), VoxioError> {
        self.hangups
            .lock()
            .expect("hangups lock")
            .push(provider_call_id.to_string());
        Ok(())
    }
}
