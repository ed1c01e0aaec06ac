// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock persistence adapter recording everything the orchestrator saves.

use std::sync::Mutex;

use async_trait::async_trait;
use voxio_core::VoxioError;
use voxio_core::traits::{Adapter, PersistenceAdapter};
use voxio_core::types::{AdapterType, CallId, CallResult, HealthStatus, TranscriptFragment};

/// In-memory [`PersistenceAdapter`] capturing calls for assertions.
pub struct MockPersistence {
    created: Mutex<Vec<(CallId, String)>>,
    batches: Mutex<Vec<(CallId, Vec<TranscriptFragment>)>>,
    results: Mutex<Vec<CallResult>>,
}

impl MockPersistence {
    pub fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn created_calls(&self) -> Vec<(CallId, String)> {
        self.created.lock().expect("created lock").clone()
    }

    /// Transcript batches in persistence order.
    pub fn batches(&self) -> Vec<(CallId, Vec<TranscriptFragment>)> {
        self.batches.lock().expect("batches lock").clone()
    }

    /// All persisted fragments for one call, flattened in arrival order.
    pub fn fragments_for(&self, call_id: &CallId) -> Vec<TranscriptFragment> {
        self.batches
            .lock()
            .expect("batches lock")
            .iter()
            .filter(|(id, _)| id == call_id)
            .flat_map(|(_, fragments)| fragments.clone())
            .collect()
    }

    pub fn results(&self) -> Vec<CallResult> {
        self.results.lock().expect("results lock").clone()
    }
}

impl Default for MockPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockPersistence {
    fn name(&self) -> &str {
        "mock-persistence"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Persistence
    }

    async fn health_check(&self) -> Result<HealthStatus, VoxioError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VoxioError> {
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for MockPersistence {
    async fn create_call_record(
        &self,
        call_id: &CallId,
        phone_number: &str,
    ) -> Result<(), VoxioError> {
        self.created
            .lock()
            .expect("created lock")
            .push((call_id.clone(), phone_number.to_string()));
        Ok(())
    }

    async fn save_transcript_batch(
        &self,
        call_id: &CallId,
        fragments: &[TranscriptFragment],
    ) -> Result<(), VoxioError> {
        self.batches
            .lock()
            .expect("batches lock")
            .push((call_id.clone(), fragments.to_vec()));
        Ok(())
    }

    async fn persist_call_result(&self, result: &CallResult) -> Result<(), VoxioError> {
        self.results.lock().expect("results lock").push(result.clone());
        Ok(())
    }
}
