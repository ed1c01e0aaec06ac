// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock AI streaming session for deterministic testing.
//!
//! Tests inject [`AiEvent`]s through the session's emitter; everything the
//! bridge sends into the session (audio chunks, text turns) is recorded,
//! and releases are counted so resource-leak assertions are possible.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use voxio_core::VoxioError;
use voxio_core::traits::{Adapter, AiSession, AiSessionAdapter};
use voxio_core::types::{AdapterType, AiEvent, AiSessionConfig, HealthStatus};

/// A mock AI session adapter that hands out [`MockAiSession`]s.
pub struct MockAiAdapter {
    sessions: StdMutex<Vec<Arc<MockAiSession>>>,
    fail_opens: AtomicUsize,
}

impl MockAiAdapter {
    pub fn new() -> Self {
        Self {
            sessions: StdMutex::new(Vec::new()),
            fail_opens: AtomicUsize::new(0),
        }
    }

    /// Makes the next `count` `open` calls fail with a transient error.
    pub fn fail_next_opens(&self, count: usize) {
        self.fail_opens.store(count, Ordering::SeqCst);
    }

    /// Every session opened so far, in order.
    pub fn sessions(&self) -> Vec<Arc<MockAiSession>> {
        self.sessions.lock().expect("sessions lock").clone()
    }

    pub fn open_count(&self) -> usize {
        self.sessions.lock().expect("sessions lock").len()
    }

    /// The most recently opened session.
    pub fn last_session(&self) -> Option<Arc<MockAiSession>> {
        self.sessions.lock().expect("sessions lock").last().cloned()
    }
}

impl Default for MockAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockAiAdapter {
    fn name(&self) -> &str {
        "mock-ai"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Ai
    }

    async fn health_check(&self) -> Result<HealthStatus, VoxioError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VoxioError> {
        Ok(())
    }
}

#[async_trait]
impl AiSessionAdapter for MockAiAdapter {
    async fn open(&self, config: AiSessionConfig) -> Result<Arc<dyn AiSession>, VoxioError> {
        let remaining = self.fail_opens.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_opens.store(remaining - 1, Ordering::SeqCst);
            return Err(VoxioError::transient("AI session open failed"));
        }

        let session = Arc::new(MockAiSession::new(config));
        self.sessions
            .lock()
            .expect("sessions lock")
            .push(Arc::clone(&session));
        Ok(session)
    }
}

/// One scripted AI streaming session.
pub struct MockAiSession {
    config: AiSessionConfig,
    event_tx: mpsc::UnboundedSender<AiEvent>,
    event_rx: Mutex<mpsc::UnboundedReceiver<AiEvent>>,
    sent_audio: StdMutex<Vec<Vec<i16>>>,
    sent_text: StdMutex<Vec<String>>,
    closed: AtomicBool,
    close_count: AtomicUsize,
}

impl MockAiSession {
    fn new(config: AiSessionConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            config,
            event_tx,
            event_rx: Mutex::new(event_rx),
            sent_audio: StdMutex::new(Vec::new()),
            sent_text: StdMutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            close_count: AtomicUsize::new(0),
        }
    }

    /// Injects an event the bridge will receive from `next_event`.
    pub fn emit(&self, event: AiEvent) {
        let _ = self.event_tx.send(event);
    }

    /// The configuration this session was opened with.
    pub fn config(&self) -> &AiSessionConfig {
        &self.config
    }

    /// Audio chunks the bridge forwarded into the session.
    pub fn sent_audio(&self) -> Vec<Vec<i16>> {
        self.sent_audio.lock().expect("sent_audio lock").clone()
    }

    pub fn sent_audio_count(&self) -> usize {
        self.sent_audio.lock().expect("sent_audio lock").len()
    }

    /// Text turns sent into the session (greeting kick-offs and nudges).
    pub fn sent_text(&self) -> Vec<String> {
        self.sent_text.lock().expect("sent_text lock").clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// How many times `close` was called; teardown paths must make this
    /// exactly one.
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiSession for MockAiSession {
    async fn send_audio(&self, pcm16: Vec<i16>) -> Result<(), VoxioError> {
        if self.is_closed() {
            return Err(VoxioError::Ai {
                message: "send_audio on closed session".into(),
                source: None,
            });
        }
        self.sent_audio.lock().expect("sent_audio lock").push(pcm16);
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), VoxioError> {
        if self.is_closed() {
            return Err(VoxioError::Ai {
                message: "send_text on closed session".into(),
                source: None,
            });
        }
        self.sent_text
            .lock()
            .expect("sent_text lock")
            .push(text.to_string());
        Ok(())
    }

    async fn next_event(&self) -> Result<AiEvent, VoxioError> {
        match self.event_rx.lock().await.recv().await {
            Some(event) => Ok(event),
            None => Ok(AiEvent::Closed),
        }
    }

    async fn close(&self) -> Result<(), VoxioError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        if !self.closed.swap(true, Ordering::SeqCst) {
            // Wake a pending next_event with the terminal event.
            let _ = self.event_tx.send(AiEvent::Closed);
        }
        Ok(())
    }
}
