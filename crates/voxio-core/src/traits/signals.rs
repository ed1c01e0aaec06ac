// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal contract between the real-time data path and the orchestrator.

use async_trait::async_trait;

use crate::error::VoxioError;
use crate::types::CallSignal;

/// Receives coarse-grained call signals from the audio bridge.
///
/// The orchestrator's call handle implements this; signals may arrive late
/// or duplicated, so every receiver treats them idempotently.
#[async_trait]
pub trait SignalSink: Send + Sync + 'static {
    async fn signal(&self, signal: CallSignal) -> Result<(), VoxioError>;
}
