// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session record layout shared between the orchestrator and the bridge.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use voxio_core::types::{CallId, CallRequest, CallStatus, StreamId};

/// One call's session metadata in the registry.
///
/// Written by the orchestrator when the call starts, read by whichever
/// process instance receives the transport connection, updated as the call
/// progresses, and expired by TTL so orphaned records cannot accumulate.
/// Invariant: at most one non-expired record exists per call id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub call_id: CallId,
    /// Assigned once the transport connects.
    pub stream_id: Option<StreamId>,
    pub phone_number: String,
    pub greeting: String,
    pub prompt: String,
    pub status: CallStatus,
    /// Set after a successful placement; the guard that keeps a retried
    /// place-call activity from dialing twice.
    pub provider_call_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Time to live from the moment of the last upsert.
    #[serde(with = "ttl_seconds")]
    pub ttl: Duration,
}

impl SessionRecord {
    /// Builds the initial record for a freshly validated call request.
    pub fn for_request(call_id: CallId, request: &CallRequest, ttl: Duration) -> Self {
        Self {
            call_id,
            stream_id: None,
            phone_number: request.phone_number.clone(),
            greeting: request.greeting.clone(),
            prompt: request.effective_system_prompt().to_string(),
            status: CallStatus::Initiated,
            provider_call_id: None,
            created_at: Utc::now(),
            ttl,
        }
    }
}

/// Serialize the TTL as whole seconds, the registry wire convention.
mod ttl_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
