// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport sink and signal recorder.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use voxio_bridge::TransportSink;
use voxio_core::VoxioError;
use voxio_core::traits::SignalSink;
use voxio_core::types::CallSignal;

/// A [`TransportSink`] that records every frame written to it.
///
/// `disconnect()` makes further writes fail, simulating a dead connection
/// so teardown-on-write-failure paths can be exercised.
pub struct MockTransport {
    frames: Mutex<Vec<Vec<u8>>>,
    connected: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().expect("frames lock").clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().expect("frames lock").len()
    }

    /// Simulates the transport connection dying.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportSink for MockTransport {
    async fn send_frame(&self, frame: Vec<u8>) -> Result<(), VoxioError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(VoxioError::TransportDisconnect {
                reason: "mock transport disconnected".into(),
            });
        }
        self.frames.lock().expect("frames lock").push(frame);
        Ok(())
    }
}

/// A [`SignalSink`] that records signals instead of driving a workflow.
///
/// Used to test the bridge's signal contract in isolation.
pub struct RecordingSignalSink {
    signals: Mutex<Vec<CallSignal>>,
}

impl RecordingSignalSink {
    pub fn new() -> Self {
        Self {
            signals: Mutex::new(Vec::new()),
        }
    }

    pub fn signals(&self) -> Vec<CallSignal> {
        self.signals.lock().expect("signals lock").clone()
    }
}

impl Default for RecordingSignalSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalSink for RecordingSignalSink {
    async fn signal(&self, signal: CallSignal) -> Result<(), VoxioError> {
        self.signals.lock().expect("signals lock").push(signal);
        Ok(())
    }
}
