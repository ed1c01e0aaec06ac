// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telephony adapter trait for outbound call providers.

use async_trait::async_trait;

use crate::error::VoxioError;
use crate::traits::adapter::Adapter;
use crate::types::WebhookUrls;

/// Adapter for the telephony provider placing and controlling calls.
///
/// `place_call` must be safe to invoke more than once for the same call:
/// the activity layer retries transient failures, and the caller guards
/// against double-dialing by recording the returned provider call id before
/// any retry can fire a second placement.
#[async_trait]
pub trait TelephonyAdapter: Adapter {
    /// Places an outbound call and returns the provider's call identifier.
    ///
    /// Transient provider failures (rate limits, timeouts) surface as
    /// [`VoxioError::TransientProvider`] so the activity layer can retry.
    async fn place_call(
        &self,
        phone_number: &str,
        webhooks: &WebhookUrls,
    ) -> Result<String, VoxioError>;

    /// Requests hangup of an active call. Idempotent: hanging up a call
    /// that already ended succeeds.
    async fn hangup(&self, provider_call_id: &str) -> Result<(), VoxioError>;
}
