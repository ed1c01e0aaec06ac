// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The registry adapter trait.

use std::time::Duration;

use async_trait::async_trait;
use voxio_core::VoxioError;
use voxio_core::traits::Adapter;
use voxio_core::types::{CallId, CallStatus, StreamId};

use crate::record::SessionRecord;

/// Keyed store mapping a call id to its session metadata.
///
/// Every mutation is an atomic per-key upsert; concurrent writers for the
/// same call id never observe a torn record. Implementations expire
/// records by TTL so orphaned sessions clean themselves up.
#[async_trait]
pub trait SessionRegistry: Adapter {
    /// Creates or replaces the record for `record.call_id`, resetting its
    /// TTL clock.
    async fn upsert(&self, record: SessionRecord) -> Result<(), VoxioError>;

    /// Fetches the non-expired record for a call id, if any.
    async fn get(&self, call_id: &CallId) -> Result<Option<SessionRecord>, VoxioError>;

    /// Updates the record's status (and stream id, when provided).
    ///
    /// Returns `false` when no live record exists for the call id.
    async fn update_status(
        &self,
        call_id: &CallId,
        status: CallStatus,
        stream_id: Option<StreamId>,
    ) -> Result<bool, VoxioError>;

    /// Records the provider call id after a successful placement.
    ///
    /// First writer wins: if a provider call id is already stored, the
    /// existing value is returned unchanged and the new one is discarded.
    /// This is the guard that keeps a retried place-call activity from
    /// dialing twice.
    async fn record_placement(
        &self,
        call_id: &CallId,
        provider_call_id: &str,
    ) -> Result<Option<String>, VoxioError>;

    /// Replaces the record's TTL, restarting its expiry clock.
    ///
    /// Returns `false` when no live record exists for the call id.
    async fn set_ttl(&self, call_id: &CallId, ttl: Duration) -> Result<bool, VoxioError>;

    /// Deletes the record. Returns `false` when nothing was stored.
    async fn remove(&self, call_id: &CallId) -> Result<bool, VoxioError>;
}
