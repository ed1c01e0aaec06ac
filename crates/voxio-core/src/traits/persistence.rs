// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence adapter trait for durable call records and transcripts.
//!
//! The storage schema lives outside this workspace; the orchestrator only
//! needs these three idempotent operations.

use async_trait::async_trait;

use crate::error::VoxioError;
use crate::traits::adapter::Adapter;
use crate::types::{CallId, CallResult, TranscriptFragment};

/// Adapter for the durable store of call records and transcripts.
#[async_trait]
pub trait PersistenceAdapter: Adapter {
    /// Creates the initial call record when a workflow starts.
    async fn create_call_record(
        &self,
        call_id: &CallId,
        phone_number: &str,
    ) -> Result<(), VoxioError>;

    /// Appends a batch of transcript fragments. Fragments arrive in
    /// per-direction sequence order and must be stored without reordering.
    async fn save_transcript_batch(
        &self,
        call_id: &CallId,
        fragments: &[TranscriptFragment],
    ) -> Result<(), VoxioError>;

    /// Persists the final call outcome. Safe to call more than once with
    /// the same result.
    async fn persist_call_result(&self, result: &CallResult) -> Result<(), VoxioError>;
}
