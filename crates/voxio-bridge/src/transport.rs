// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound half of the transport contract.
//!
//! The front door owns the actual connection and implements
//! [`TransportSink`] over it; the bridge only ever sees framed codec
//! bytes going out and [`voxio_core::TransportEvent`]s coming in.

use async_trait::async_trait;
use voxio_core::VoxioError;

/// Writes codec-native frames back to the telephony transport.
///
/// `send_frame` must fail (rather than block indefinitely) once the
/// underlying connection is gone, so the playback pump can trigger
/// teardown instead of wedging on a dead connection.
#[async_trait]
pub trait TransportSink: Send + Sync + 'static {
    async fn send_frame(&self, frame: Vec<u8>) -> Result<(), VoxioError>;
}
