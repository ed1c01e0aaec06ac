// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory session registry with TTL expiry.
//!
//! Suitable for single-node deployments and tests; a networked keyed store
//! implements [`SessionRegistry`] the same way for multi-instance
//! deployments. Expiry is lazy on access plus an optional background
//! sweeper, so an idle record never outlives its TTL by more than one
//! sweep interval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use voxio_core::VoxioError;
use voxio_core::traits::Adapter;
use voxio_core::types::{AdapterType, CallId, CallStatus, HealthStatus, StreamId};

use crate::adapter::SessionRegistry;
use crate::record::SessionRecord;

struct StoredRecord {
    record: SessionRecord,
    expires_at: Instant,
}

impl StoredRecord {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-local [`SessionRegistry`] backed by a concurrent map.
///
/// `DashMap`'s per-key locking makes every mutation an atomic upsert.
pub struct MemoryRegistry {
    records: DashMap<CallId, StoredRecord>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Removes every expired record; returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, stored| !stored.is_expired(now));
        before - self.records.len()
    }

    /// Runs a periodic sweep until the token is cancelled.
    pub fn run_sweeper(
        self: Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let dropped = self.sweep();
                        if dropped > 0 {
                            debug!(dropped, "registry sweep removed expired sessions");
                        }
                    }
                }
            }
        })
    }

    /// Number of live (non-expired) records.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.records
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MemoryRegistry {
    fn name(&self) -> &str {
        "memory-registry"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Registry
    }

    async fn health_check(&self) -> Result<HealthStatus, VoxioError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VoxioError> {
        self.records.clear();
        Ok(())
    }
}

#[async_trait]
impl SessionRegistry for MemoryRegistry {
    async fn upsert(&self, record: SessionRecord) -> Result<(), VoxioError> {
        let expires_at = Instant::now() + record.ttl;
        self.records.insert(
            record.call_id.clone(),
            StoredRecord { record, expires_at },
        );
        Ok(())
    }

    async fn get(&self, call_id: &CallId) -> Result<Option<SessionRecord>, VoxioError> {
        let now = Instant::now();
        if let Some(entry) = self.records.get(call_id) {
            if !entry.value().is_expired(now) {
                return Ok(Some(entry.value().record.clone()));
            }
        }
        // Drop the expired entry so the at-most-one invariant holds for
        // a subsequent upsert under the same key.
        self.records
            .remove_if(call_id, |_, stored| stored.is_expired(now));
        Ok(None)
    }

    async fn update_status(
        &self,
        call_id: &CallId,
        status: CallStatus,
        stream_id: Option<StreamId>,
    ) -> Result<bool, VoxioError> {
        let now = Instant::now();
        match self.records.get_mut(call_id) {
            Some(mut entry) if !entry.value().is_expired(now) => {
                let record = &mut entry.value_mut().record;
                record.status = status;
                if stream_id.is_some() {
                    record.stream_id = stream_id;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_placement(
        &self,
        call_id: &CallId,
        provider_call_id: &str,
    ) -> Result<Option<String>, VoxioError> {
        let now = Instant::now();
        match self.records.get_mut(call_id) {
            Some(mut entry) if !entry.value().is_expired(now) => {
                let record = &mut entry.value_mut().record;
                if let Some(existing) = &record.provider_call_id {
                    return Ok(Some(existing.clone()));
                }
                record.provider_call_id = Some(provider_call_id.to_string());
                Ok(None)
            }
            _ => Err(VoxioError::Registry(format!(
                "no live session record for call {call_id}"
            ))),
        }
    }

    async fn set_ttl(&self, call_id: &CallId, ttl: Duration) -> Result<bool, VoxioError> {
        let now = Instant::now();
        match self.records.get_mut(call_id) {
            Some(mut entry) if !entry.value().is_expired(now) => {
                let stored = entry.value_mut();
                stored.record.ttl = ttl;
                stored.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, call_id: &CallId) -> Result<bool, VoxioError> {
        Ok(self.records.remove(call_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxio_core::types::CallRequest;

    fn record(call_id: &str, ttl: Duration) -> SessionRecord {
        SessionRecord::for_request(
            CallId(call_id.to_string()),
            &CallRequest::new("+15551234567"),
            ttl,
        )
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let registry = MemoryRegistry::new();
        let rec = record("c1", Duration::from_secs(60));
        registry.upsert(rec.clone()).await.unwrap();

        let fetched = registry.get(&CallId("c1".into())).await.unwrap().unwrap();
        assert_eq!(fetched, rec);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_record() {
        let registry = MemoryRegistry::new();
        registry
            .upsert(record("c1", Duration::from_secs(60)))
            .await
            .unwrap();

        let mut updated = record("c1", Duration::from_secs(60));
        updated.status = CallStatus::Ringing;
        registry.upsert(updated).await.unwrap();

        assert_eq!(registry.len(), 1, "at most one record per call id");
        let fetched = registry.get(&CallId("c1".into())).await.unwrap().unwrap();
        assert_eq!(fetched.status, CallStatus::Ringing);
    }

    #[tokio::test(start_paused = true)]
    async fn records_expire_after_ttl() {
        let registry = MemoryRegistry::new();
        registry
            .upsert(record("c1", Duration::from_secs(10)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(registry.get(&CallId("c1".into())).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(registry.get(&CallId("c1".into())).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn set_ttl_restarts_expiry_clock() {
        let registry = MemoryRegistry::new();
        registry
            .upsert(record("c1", Duration::from_secs(10)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(
            registry
                .set_ttl(&CallId("c1".into()), Duration::from_secs(300))
                .await
                .unwrap()
        );

        tokio::time::advance(Duration::from_secs(200)).await;
        assert!(registry.get(&CallId("c1".into())).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_status_records_stream_id_once_known() {
        let registry = MemoryRegistry::new();
        registry
            .upsert(record("c1", Duration::from_secs(60)))
            .await
            .unwrap();

        let updated = registry
            .update_status(
                &CallId("c1".into()),
                CallStatus::InProgress,
                Some(StreamId("MZ1".into())),
            )
            .await
            .unwrap();
        assert!(updated);

        let fetched = registry.get(&CallId("c1".into())).await.unwrap().unwrap();
        assert_eq!(fetched.status, CallStatus::InProgress);
        assert_eq!(fetched.stream_id, Some(StreamId("MZ1".into())));

        // Status-only updates keep the stream id.
        registry
            .update_status(&CallId("c1".into()), CallStatus::Completed, None)
            .await
            .unwrap();
        let fetched = registry.get(&CallId("c1".into())).await.unwrap().unwrap();
        assert_eq!(fetched.stream_id, Some(StreamId("MZ1".into())));
    }

    #[tokio::test]
    async fn update_status_on_missing_record_returns_false() {
        let registry = MemoryRegistry::new();
        let updated = registry
            .update_status(&CallId("missing".into()), CallStatus::Failed, None)
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn record_placement_is_first_writer_wins() {
        let registry = MemoryRegistry::new();
        registry
            .upsert(record("c1", Duration::from_secs(60)))
            .await
            .unwrap();

        let call_id = CallId("c1".into());
        let prior = registry.record_placement(&call_id, "CA-1").await.unwrap();
        assert!(prior.is_none());

        // A retried placement must observe the original id.
        let prior = registry.record_placement(&call_id, "CA-2").await.unwrap();
        assert_eq!(prior.as_deref(), Some("CA-1"));

        let fetched = registry.get(&call_id).await.unwrap().unwrap();
        assert_eq!(fetched.provider_call_id.as_deref(), Some("CA-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_only_expired_records() {
        let registry = MemoryRegistry::new();
        registry
            .upsert(record("short", Duration::from_secs(5)))
            .await
            .unwrap();
        registry
            .upsert(record("long", Duration::from_secs(500)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(registry.sweep(), 1);
        assert!(registry.get(&CallId("long".into())).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_task_stops_on_cancel() {
        let registry = Arc::new(MemoryRegistry::new());
        let cancel = CancellationToken::new();
        let handle = registry
            .clone()
            .run_sweeper(Duration::from_secs(30), cancel.clone());

        registry
            .upsert(record("c1", Duration::from_secs(5)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert!(registry.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let registry = MemoryRegistry::new();
        registry
            .upsert(record("c1", Duration::from_secs(60)))
            .await
            .unwrap();
        assert!(registry.remove(&CallId("c1".into())).await.unwrap());
        assert!(!registry.remove(&CallId("c1".into())).await.unwrap());
    }
}
