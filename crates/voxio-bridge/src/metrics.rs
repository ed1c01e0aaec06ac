// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session bridge counters.
//!
//! Internal observability only: counters feed structured logs on teardown
//! and the [`BridgeMetrics`] snapshot; exporters and dashboards live
//! outside this workspace.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by the bridge session's tasks.
#[derive(Debug, Default)]
pub struct BridgeCounters {
    frames_in: AtomicU64,
    frames_out: AtomicU64,
    dropped_in: AtomicU64,
    dropped_out: AtomicU64,
    interruptions: AtomicU64,
    queue_depth_peak: AtomicU64,
    queue_depth_sum: AtomicU64,
    queue_depth_samples: AtomicU64,
}

impl BridgeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame_in(&self) {
        self.frames_in.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_out(&self) {
        self.frames_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_in(&self) {
        self.dropped_in.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_out(&self) {
        self.dropped_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_interruption(&self) {
        self.interruptions.fetch_add(1, Ordering::Relaxed);
    }

    /// Samples the outbound queue depth for peak/mean tracking.
    pub fn sample_queue_depth(&self, depth: usize) {
        let depth = depth as u64;
        self.queue_depth_peak.fetch_max(depth, Ordering::Relaxed);
        self.queue_depth_sum.fetch_add(depth, Ordering::Relaxed);
        self.queue_depth_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_in(&self) -> u64 {
        self.dropped_in.load(Ordering::Relaxed)
    }

    pub fn frames_in(&self) -> u64 {
        self.frames_in.load(Ordering::Relaxed)
    }

    /// Point-in-time snapshot of every counter.
    pub fn snapshot(&self, user_turns: u64, agent_turns: u64) -> BridgeMetrics {
        let samples = self.queue_depth_samples.load(Ordering::Relaxed);
        let mean_queue_depth = if samples == 0 {
            0.0
        } else {
            self.queue_depth_sum.load(Ordering::Relaxed) as f64 / samples as f64
        };
        BridgeMetrics {
            frames_in: self.frames_in.load(Ordering::Relaxed),
            frames_out: self.frames_out.load(Ordering::Relaxed),
            dropped_in: self.dropped_in.load(Ordering::Relaxed),
            dropped_out: self.dropped_out.load(Ordering::Relaxed),
            interruptions: self.interruptions.load(Ordering::Relaxed),
            peak_queue_depth: self.queue_depth_peak.load(Ordering::Relaxed),
            mean_queue_depth,
            user_turns,
            agent_turns,
        }
    }
}

/// Snapshot of one session's relay counters.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeMetrics {
    pub frames_in: u64,
    pub frames_out: u64,
    pub dropped_in: u64,
    pub dropped_out: u64,
    pub interruptions: u64,
    pub peak_queue_depth: u64,
    pub mean_queue_depth: f64,
    pub user_turns: u64,
    pub agent_turns: u64,
}

impl BridgeMetrics {
    /// Share of inbound frames dropped by backpressure, in percent.
    pub fn inbound_drop_rate(&self) -> f64 {
        if self.frames_in == 0 {
            return 0.0;
        }
        self.dropped_in as f64 / self.frames_in as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let counters = BridgeCounters::new();
        for _ in 0..10 {
            counters.record_frame_in();
        }
        counters.record_dropped_in();
        counters.record_frame_out();
        counters.record_interruption();

        let metrics = counters.snapshot(2, 3);
        assert_eq!(metrics.frames_in, 10);
        assert_eq!(metrics.frames_out, 1);
        assert_eq!(metrics.dropped_in, 1);
        assert_eq!(metrics.interruptions, 1);
        assert_eq!(metrics.user_turns, 2);
        assert_eq!(metrics.agent_turns, 3);
    }

    #[test]
    fn queue_depth_peak_and_mean() {
        let counters = BridgeCounters::new();
        counters.sample_queue_depth(2);
        counters.sample_queue_depth(8);
        counters.sample_queue_depth(5);

        let metrics = counters.snapshot(0, 0);
        assert_eq!(metrics.peak_queue_depth, 8);
        assert!((metrics.mean_queue_depth - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn drop_rate_handles_zero_frames() {
        let metrics = BridgeCounters::new().snapshot(0, 0);
        assert_eq!(metrics.inbound_drop_rate(), 0.0);
    }

    #[test]
    fn drop_rate_is_percentage() {
        let counters = BridgeCounters::new();
        for _ in 0..4 {
            counters.record_frame_in();
        }
        counters.record_dropped_in();
        let metrics = counters.snapshot(0, 0);
        assert!((metrics.inbound_drop_rate() - 25.0).abs() < f64::EPSILON);
    }
}
