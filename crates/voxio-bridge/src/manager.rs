// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local directory of active bridge sessions.
//!
//! Keyed by stream id once a transport attaches; pre-warmed sessions park
//! under their call id until the transport arrives or a reclaim deadline
//! releases them. Enforces at most one live session per stream id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, warn};
use voxio_config::VoxioConfig;
use voxio_core::traits::{AiSessionAdapter, SessionPrewarmer, SignalSink};
use voxio_core::types::{AiSessionConfig, CallId, CallStatus, EndReason, StreamId};
use voxio_core::VoxioError;
use voxio_registry::SessionRegistry;

use crate::session::AudioBridgeSession;
use crate::transport::TransportSink;

/// Creation/attach/teardown entry point for audio bridge sessions.
pub struct BridgeManager {
    sessions: DashMap<StreamId, Arc<AudioBridgeSession>>,
    prewarmed: Arc<DashMap<CallId, Arc<AudioBridgeSession>>>,
    ai: Arc<dyn AiSessionAdapter>,
    registry: Arc<dyn SessionRegistry>,
    bridge_config: voxio_config::BridgeConfig,
    prewarm_reclaim: Duration,
}

impl BridgeManager {
    pub fn new(
        ai: Arc<dyn AiSessionAdapter>,
        registry: Arc<dyn SessionRegistry>,
        config: &VoxioConfig,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            prewarmed: Arc::new(DashMap::new()),
            ai,
            registry,
            bridge_config: config.bridge.clone(),
            prewarm_reclaim: config.ai.prewarm_reclaim(),
        }
    }

    /// Handles a transport `start` event: reclaims the pre-warmed session
    /// for the call if one is parked, otherwise creates one synchronously,
    /// then attaches the transport.
    ///
    /// A second `start` for a stream id with a live session is rejected.
    pub async fn create_or_attach(
        &self,
        stream_id: StreamId,
        call_id: CallId,
        config: AiSessionConfig,
        sink: Arc<dyn TransportSink>,
        signals: Arc<dyn SignalSink>,
    ) -> Result<Arc<AudioBridgeSession>, VoxioError> {
        if self.sessions.contains_key(&stream_id) {
            return Err(VoxioError::SessionAttach(format!(
                "stream {stream_id} already has an active session"
            )));
        }

        let session = match self.prewarmed.remove(&call_id) {
            Some((_, session)) if !session.is_torn_down() => {
                info!(
                    call_id = %call_id,
                    stream_id = %stream_id,
                    buffered_frames = session.outbound_depth(),
                    "reusing pre-warmed session"
                );
                session
            }
            other => {
                if other.is_some() {
                    debug!(call_id = %call_id, "pre-warmed session already released");
                } else {
                    debug!(call_id = %call_id, "no pre-warmed session; creating synchronously");
                }
                AudioBridgeSession::open(
                    call_id.clone(),
                    Arc::clone(&self.ai),
                    config,
                    self.bridge_config.clone(),
                )
                .await?
            }
        };

        session.attach(stream_id.clone(), sink, signals).await?;

        match self.sessions.entry(stream_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&session));
            }
            Entry::Occupied(_) => {
                // Lost a race with a concurrent start for the same stream.
                session.teardown(EndReason::Error).await;
                return Err(VoxioError::SessionAttach(format!(
                    "stream {stream_id} already has an active session"
                )));
            }
        }

        match self
            .registry
            .update_status(&call_id, CallStatus::InProgress, Some(stream_id.clone()))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(call_id = %call_id, "no registry record to update on attach")
            }
            Err(error) => {
                warn!(call_id = %call_id, %error, "registry update failed on attach")
            }
        }

        Ok(session)
    }

    /// Routes one inbound `media` frame to its session.
    ///
    /// A `media` event with no prior `start` is an error for the caller to
    /// report, never a crash.
    pub fn dispatch_media(&self, stream_id: &StreamId, payload: &[u8]) -> Result<(), VoxioError> {
        match self.sessions.get(stream_id) {
            Some(session) => session.handle_media(payload),
            None => Err(VoxioError::SessionAttach(format!(
                "media for unknown stream {stream_id}"
            ))),
        }
    }

    /// Handles a transport `stop` event: records the orderly shutdown and
    /// tears the session down with reason `normal`.
    pub async fn handle_stop(&self, stream_id: &StreamId) -> Result<(), VoxioError> {
        let Some(session) = self.get(stream_id) else {
            return Err(VoxioError::SessionAttach(format!(
                "stop for unknown stream {stream_id}"
            )));
        };
        session.mark_stop_received();
        self.close(stream_id).await;
        Ok(())
    }

    /// Tears down and forgets the session for a stream id.
    ///
    /// Safe to call for unknown or already-closed streams; teardown races
    /// (transport error vs. orchestrator terminate) resolve to one
    /// winner inside the session.
    pub async fn close(&self, stream_id: &StreamId) -> bool {
        let Some((_, session)) = self.sessions.remove(stream_id) else {
            return false;
        };
        let reason = session.close_reason();
        session.teardown(reason).await;

        if let Err(error) = self.registry.remove(session.call_id()).await {
            warn!(
                call_id = %session.call_id(),
                %error,
                "failed to remove registry entry on close"
            );
        }
        true
    }

    /// Closes every active and parked session (process shutdown).
    pub async fn close_all(&self) {
        let stream_ids: Vec<StreamId> =
            self.sessions.iter().map(|e| e.key().clone()).collect();
        for stream_id in stream_ids {
            self.close(&stream_id).await;
        }

        let call_ids: Vec<CallId> = self.prewarmed.iter().map(|e| e.key().clone()).collect();
        for call_id in call_ids {
            if let Some((_, session)) = self.prewarmed.remove(&call_id) {
                session.teardown(EndReason::Normal).await;
            }
        }
    }

    pub fn get(&self, stream_id: &StreamId) -> Option<Arc<AudioBridgeSession>> {
        self.sessions.get(stream_id).map(|e| Arc::clone(e.value()))
    }

    /// Number of attached sessions in this process.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Number of parked pre-warmed sessions awaiting attach.
    pub fn prewarmed_sessions(&self) -> usize {
        self.prewarmed.len()
    }
}

#[async_trait]
impl SessionPrewarmer for BridgeManager {
    /// Opens and parks an AI session before the transport exists.
    ///
    /// Idempotent per call id. An unclaimed session is released when the
    /// reclaim deadline lapses, so an unanswered call never leaks its AI
    /// session.
    async fn prewarm(
        &self,
        call_id: &CallId,
        config: AiSessionConfig,
    ) -> Result<(), VoxioError> {
        if self.prewarmed.contains_key(call_id) {
            debug!(call_id = %call_id, "pre-warm already in place");
            return Ok(());
        }

        let session = AudioBridgeSession::open(
            call_id.clone(),
            Arc::clone(&self.ai),
            config,
            self.bridge_config.clone(),
        )
        .await?;
        self.prewarmed.insert(call_id.clone(), Arc::clone(&session));
        info!(call_id = %call_id, "pre-warmed AI session parked");

        let prewarmed = Arc::clone(&self.prewarmed);
        let call_id = call_id.clone();
        let reclaim = self.prewarm_reclaim;
        tokio::spawn(async move {
            tokio::time::sleep(reclaim).await;
            if let Some((_, session)) = prewarmed.remove(&call_id) {
                info!(call_id = %call_id, "releasing unclaimed pre-warmed session");
                session.teardown(EndReason::Normal).await;
            }
        });

        Ok(())
    }
}
