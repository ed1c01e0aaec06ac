// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-direction transcript accumulation between sync ticks.
//!
//! Fragments are append-only with a monotonic sequence number per
//! direction; draining hands back the batch in arrival order, so batch
//! boundaries can split an utterance without ever reordering it.

use chrono::Utc;
use voxio_core::types::{Speaker, TranscriptFragment};

/// Buffer of transcript fragments awaiting the next sync tick.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    pending: Vec<TranscriptFragment>,
    user_seq: u64,
    agent_seq: u64,
    last_speaker: Option<Speaker>,
    user_turns: u64,
    agent_turns: u64,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment, assigning the next sequence number for its
    /// direction. Returns the assigned sequence number.
    pub fn push(&mut self, direction: Speaker, text: impl Into<String>) -> u64 {
        let seq = match direction {
            Speaker::User => {
                self.user_seq += 1;
                self.user_seq
            }
            Speaker::Agent => {
                self.agent_seq += 1;
                self.agent_seq
            }
        };

        // A change of speaker starts a new conversational turn.
        if self.last_speaker != Some(direction) {
            match direction {
                Speaker::User => self.user_turns += 1,
                Speaker::Agent => self.agent_turns += 1,
            }
            self.last_speaker = Some(direction);
        }

        self.pending.push(TranscriptFragment {
            direction,
            text: text.into(),
            seq,
            timestamp: Utc::now(),
        });
        seq
    }

    /// Takes every pending fragment, leaving the buffer empty but keeping
    /// the sequence counters so later batches continue the ordering.
    pub fn drain(&mut self) -> Vec<TranscriptFragment> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Turn counts observed so far: `(user, agent)`.
    pub fn turns(&self) -> (u64, u64) {
        (self.user_turns, self.agent_turns)
    }
}
