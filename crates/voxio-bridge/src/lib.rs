// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time audio bridge for the Voxio call system.
//!
//! Relays and transcodes bidirectional voice audio between the telephony
//! transport (mu-law 8 kHz) and the AI streaming session (PCM16, 16 kHz in
//! / 24 kHz out) with minimum added latency, buffering transcripts for
//! periodic rather than per-frame delivery to the orchestrator.
//!
//! The data path here is deliberately decoupled from the durable control
//! path in `voxio-workflow`: the only things that cross are the
//! coarse-grained signals of [`voxio_core::CallSignal`].

pub mod manager;
pub mod metrics;
pub mod queue;
pub mod session;
pub mod transcript;
pub mod transport;

pub use manager::BridgeManager;
pub use metrics::{BridgeCounters, BridgeMetrics};
pub use queue::FrameQueue;
pub use session::{AudioBridgeSession, TRANSPORT_FRAME_BYTES};
pub use transcript::TranscriptBuffer;
pub use transport::TransportSink;
