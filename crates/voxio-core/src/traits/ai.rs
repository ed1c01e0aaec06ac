// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI streaming session adapter traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::VoxioError;
use crate::traits::adapter::Adapter;
use crate::types::{AiEvent, AiSessionConfig, CallId};

/// Adapter opening AI streaming sessions.
#[async_trait]
pub trait AiSessionAdapter: Adapter {
    /// Opens and configures a streaming session with greeting, system
    /// prompt, and VAD settings.
    async fn open(&self, config: AiSessionConfig) -> Result<Arc<dyn AiSession>, VoxioError>;
}

/// One live AI streaming session.
///
/// The session is an owned resource: [`AiSession::close`] is the single
/// release point and must be reachable from every teardown trigger (normal
/// close, transport error, forced termination, pre-warm-then-unused).
/// `close` is idempotent; events after close are [`AiEvent::Closed`].
#[async_trait]
pub trait AiSession: Send + Sync + 'static {
    /// Streams one chunk of PCM16 16 kHz caller audio into the session.
    async fn send_audio(&self, pcm16: Vec<i16>) -> Result<(), VoxioError>;

    /// Sends a text turn (used to kick off the greeting utterance).
    async fn send_text(&self, text: &str) -> Result<(), VoxioError>;

    /// Awaits the next session event, in upstream order.
    async fn next_event(&self) -> Result<AiEvent, VoxioError>;

    /// Closes the session and releases the upstream connection.
    async fn close(&self) -> Result<(), VoxioError>;
}

/// Pre-warms AI sessions ahead of transport connect.
///
/// Pre-warming is a latency optimization, never a hard dependency: a failed
/// pre-warm is logged and the bridge falls back to synchronous creation.
#[async_trait]
pub trait SessionPrewarmer: Send + Sync + 'static {
    async fn prewarm(&self, call_id: &CallId, config: AiSessionConfig)
        -> Result<(), VoxioError>;
}
