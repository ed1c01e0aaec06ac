// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure decision core of the call lifecycle.
//!
//! [`CallMachine`] is a function of its received events: no clock reads,
//! no randomness, no I/O. Every side effect it wants comes back as a
//! [`Command`] for the driver to execute, so replaying the same event
//! sequence always reproduces the same decisions.
//!
//! State space: `Initiated -> Ringing -> InProgress` with terminal exits
//! `Completed`, `Failed`, `NoAnswer`, `Busy`, `Canceled`. Terminal states
//! accept no further transitions; late or duplicated signals are ignored.

use voxio_core::types::{CallSignal, CallStatus, EndReason, StreamId, TranscriptFragment};

/// One input to the decision core, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// The place-call activity completed.
    PlacementSucceeded { provider_call_id: String },
    /// A fatal start-phase activity failed after classification and
    /// retries (record creation, registry upsert, call placement).
    ActivityFailed { activity: String, message: String },
    /// The pre-warm activity failed; informational, never fatal.
    PrewarmFailed { message: String },
    /// A coarse-grained signal from the bridge or the front door.
    Signal(CallSignal),
    /// The connect timer fired before the call connected.
    ConnectTimeout,
    /// The max-duration race timer fired.
    MaxDurationReached,
    /// Cancellation requested by the caller.
    TerminateRequested,
}

/// One side effect requested by the decision core.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create the durable call record.
    CreateCallRecord,
    /// Upsert the session registry record for transport attach.
    UpsertSessionRecord,
    /// Start the idempotent outbound call placement activity.
    PlaceCall,
    /// Start the idempotent AI session pre-warm activity.
    PrewarmAi,
    /// Arm the connect timeout.
    StartConnectTimer,
    /// Arm the max-duration race timer.
    StartMaxDurationTimer,
    /// Persist a transcript batch.
    SaveTranscripts(Vec<TranscriptFragment>),
    /// Request provider hangup.
    Hangup { provider_call_id: String },
    /// Persist the terminal call result.
    PersistResult,
    /// Schedule registry cleanup with the grace TTL.
    CleanupRegistry,
}

/// Replay-safe call lifecycle state machine.
#[derive(Debug)]
pub struct CallMachine {
    status: CallStatus,
    provider_call_id: Option<String>,
    stream_id: Option<StreamId>,
    transcript_count: u64,
    connected: bool,
    finalized: bool,
}

impl CallMachine {
    /// Creates the machine in `Initiated` and returns the start-of-call
    /// commands: durable record creation, then call placement concurrent
    /// with AI pre-warming, under a connect timeout.
    pub fn start() -> (Self, Vec<Command>) {
        let machine = Self {
            status: CallStatus::Initiated,
            provider_call_id: None,
            stream_id: None,
            transcript_count: 0,
            connected: false,
            finalized: false,
        };
        let commands = vec![
            Command::CreateCallRecord,
            Command::UpsertSessionRecord,
            Command::PlaceCall,
            Command::PrewarmAi,
            Command::StartConnectTimer,
        ];
        (machine, commands)
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn provider_call_id(&self) -> Option<&str> {
        self.provider_call_id.as_deref()
    }

    pub fn stream_id(&self) -> Option<&StreamId> {
        self.stream_id.as_ref()
    }

    pub fn transcript_count(&self) -> u64 {
        self.transcript_count
    }

    /// Whether the machine reached a terminal status and issued its
    /// finalization commands.
    pub fn is_finished(&self) -> bool {
        self.finalized
    }

    /// Advances the machine by one event, returning the commands to run.
    pub fn handle(&mut self, event: WorkflowEvent) -> Vec<Command> {
        match event {
            WorkflowEvent::PlacementSucceeded { provider_call_id } => {
                self.on_placement_succeeded(provider_call_id)
            }
            WorkflowEvent::ActivityFailed { .. } => self.terminate(CallStatus::Failed),
            WorkflowEvent::PrewarmFailed { .. } => Vec::new(),
            WorkflowEvent::Signal(signal) => self.on_signal(signal),
            WorkflowEvent::ConnectTimeout => self.on_connect_timeout(),
            WorkflowEvent::MaxDurationReached => self.on_max_duration(),
            WorkflowEvent::TerminateRequested => self.terminate(CallStatus::Canceled),
        }
    }

    fn on_placement_succeeded(&mut self, provider_call_id: String) -> Vec<Command> {
        let first_ack = self.provider_call_id.is_none();
        self.provider_call_id = Some(provider_call_id.clone());

        if self.status == CallStatus::Initiated {
            self.status = CallStatus::Ringing;
            return Vec::new();
        }
        // Placement acknowledged after the call was already terminated:
        // the finalization pass could not hang up without the id, so do
        // it now.
        if self.finalized && first_ack {
            return vec![Command::Hangup { provider_call_id }];
        }
        Vec::new()
    }

    fn on_signal(&mut self, signal: CallSignal) -> Vec<Command> {
        match signal {
            CallSignal::StreamingStarted { stream_id } => {
                if self.status.is_terminal() || self.status == CallStatus::InProgress {
                    // Late or duplicated; ignored by contract.
                    return Vec::new();
                }
                self.status = CallStatus::InProgress;
                self.connected = true;
                self.stream_id = Some(stream_id);
                vec![Command::StartMaxDurationTimer]
            }
            CallSignal::TranscriptsAvailable(fragments) => {
                if fragments.is_empty() {
                    return Vec::new();
                }
                self.transcript_count += fragments.len() as u64;
                vec![Command::SaveTranscripts(fragments)]
            }
            CallSignal::CallStatusChanged { provider_status } => {
                self.on_provider_status(&provider_status)
            }
            CallSignal::StreamingEnded { reason } => {
                if self.status != CallStatus::InProgress {
                    return Vec::new();
                }
                let status = match reason {
                    EndReason::Normal => CallStatus::Completed,
                    EndReason::Error => CallStatus::Failed,
                };
                self.terminate(status)
            }
        }
    }

    fn on_provider_status(&mut self, provider_status: &str) -> Vec<Command> {
        if self.status.is_terminal() {
            return Vec::new();
        }
        let Some(mapped) = CallStatus::from_provider(provider_status) else {
            return Vec::new();
        };
        match mapped {
            CallStatus::Initiated => Vec::new(),
            CallStatus::Ringing => {
                if self.status == CallStatus::Initiated {
                    self.status = CallStatus::Ringing;
                }
                Vec::new()
            }
            CallStatus::InProgress => {
                if self.status == CallStatus::InProgress {
                    return Vec::new();
                }
                self.status = CallStatus::InProgress;
                self.connected = true;
                vec![Command::StartMaxDurationTimer]
            }
            terminal => {
                // Busy and no-answer presuppose the call rang; before the
                // placement acknowledges, only a hard failure is credible.
                if self.status == CallStatus::Initiated && terminal != CallStatus::Failed {
                    return Vec::new();
                }
                self.terminate(terminal)
            }
        }
    }

    fn on_connect_timeout(&mut self) -> Vec<Command> {
        if self.connected || self.status.is_terminal() {
            return Vec::new();
        }
        // Rang but never answered; or never even acknowledged placement.
        let status = match self.status {
            CallStatus::Ringing => CallStatus::NoAnswer,
            _ => CallStatus::Failed,
        };
        self.terminate(status)
    }

    fn on_max_duration(&mut self) -> Vec<Command> {
        if self.status != CallStatus::InProgress {
            return Vec::new();
        }
        self.terminate(CallStatus::Completed)
    }

    /// Enters a terminal status and emits the finalization sequence.
    fn terminate(&mut self, status: CallStatus) -> Vec<Command> {
        if self.status.is_terminal() {
            return Vec::new();
        }
        debug_assert!(status.is_terminal());
        self.status = status;
        self.finalized = true;

        let mut commands = Vec::new();
        if let Some(provider_call_id) = &self.provider_call_id {
            commands.push(Command::Hangup {
                provider_call_id: provider_call_id.clone(),
            });
        }
        commands.push(Command::PersistResult);
        commands.push(Command::CleanupRegistry);
        commands
    }
}
