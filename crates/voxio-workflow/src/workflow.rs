// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async driver for the call lifecycle machine.
//!
//! One driver task per call. Every input — activity results, bridge and
//! front-door signals, timer fires — serializes through a single event
//! channel before reaching the pure [`CallMachine`], which keeps the
//! decision path single-threaded and its history replayable. Side effects
//! run through the activity layer; queries are answered from a
//! watch-published snapshot without touching the event loop.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use voxio_config::VoxioConfig;
use voxio_core::traits::{PersistenceAdapter, SessionPrewarmer, SignalSink, TelephonyAdapter};
use voxio_core::types::{
    AiSessionConfig, CallConfigSnapshot, CallId, CallRequest, CallResult, CallSignal,
    CallStatus, StatusSnapshot,
};
use voxio_core::VoxioError;
use voxio_registry::{SessionRecord, SessionRegistry};

use crate::activity::{run_activity, RetryPolicy};
use crate::machine::{CallMachine, Command, WorkflowEvent};

const ACTIVITY_CREATE_CALL_RECORD: &str = "create_call_record";
const ACTIVITY_UPSERT_SESSION_RECORD: &str = "upsert_session_record";
const ACTIVITY_PLACE_CALL: &str = "place_outbound_call";
const ACTIVITY_PREWARM: &str = "prewarm_ai_session";
const ACTIVITY_SAVE_TRANSCRIPTS: &str = "save_transcript_batch";
const ACTIVITY_HANGUP: &str = "hangup_call";
const ACTIVITY_PERSIST_RESULT: &str = "persist_call_result";

/// Everything a call workflow needs from the outside world.
#[derive(Clone)]
pub struct WorkflowDeps {
    pub telephony: Arc<dyn TelephonyAdapter>,
    pub prewarmer: Arc<dyn SessionPrewarmer>,
    pub persistence: Arc<dyn PersistenceAdapter>,
    pub registry: Arc<dyn SessionRegistry>,
    pub config: VoxioConfig,
}

/// Entry point for starting call workflows.
pub struct CallWorkflow;

impl CallWorkflow {
    /// Validates the request and starts the per-call driver task.
    ///
    /// Fails with [`VoxioError::Configuration`] before any side effect
    /// when the request is invalid.
    pub fn start(request: CallRequest, deps: WorkflowDeps) -> Result<CallHandle, VoxioError> {
        request.validate()?;

        let call_id = CallId::generate();
        let config_snapshot = Arc::new(CallConfigSnapshot {
            call_id: call_id.clone(),
            greeting: request.greeting.clone(),
            system_prompt: request.effective_system_prompt().to_string(),
            vad: request.vad.clone(),
        });

        let (event_tx, event_rx) = mpsc::channel(64);
        let (status_tx, status_rx) = watch::channel(StatusSnapshot {
            status: CallStatus::Initiated,
            transcript_count: 0,
        });
        let (result_tx, result_rx) = watch::channel(None);

        let (machine, initial_commands) = CallMachine::start();
        let policy = RetryPolicy::from_config(&deps.config.workflow);

        let driver = Driver {
            call_id: call_id.clone(),
            request,
            machine,
            deps,
            policy,
            event_tx: event_tx.clone(),
            status_tx,
            result_tx,
            cancel: CancellationToken::new(),
            started_at: Utc::now(),
            ended_at: None,
            outstanding_placement: false,
        };
        tokio::spawn(driver.run(initial_commands, event_rx));

        Ok(CallHandle {
            call_id,
            config: config_snapshot,
            event_tx,
            status_rx,
            result_rx,
        })
    }
}

/// Signal/query surface of one running call workflow.
///
/// Clonable; the bridge holds one as its [`SignalSink`] and the front door
/// holds one for queries and termination.
#[derive(Clone)]
pub struct CallHandle {
    call_id: CallId,
    config: Arc<CallConfigSnapshot>,
    event_tx: mpsc::Sender<WorkflowEvent>,
    status_rx: watch::Receiver<StatusSnapshot>,
    result_rx: watch::Receiver<Option<CallResult>>,
}

impl CallHandle {
    pub fn call_id(&self) -> &CallId {
        &self.call_id
    }

    /// Query: call configuration for the bridge, answerable before the
    /// transport exists.
    pub fn get_call_config(&self) -> CallConfigSnapshot {
        (*self.config).clone()
    }

    /// The AI session configuration derived from the call config.
    pub fn ai_session_config(&self) -> AiSessionConfig {
        AiSessionConfig {
            greeting: self.config.greeting.clone(),
            system_prompt: self.config.system_prompt.clone(),
            vad: self.config.vad.clone(),
        }
    }

    /// Query: current status and transcript count.
    pub fn get_status(&self) -> StatusSnapshot {
        self.status_rx.borrow().clone()
    }

    /// Requests cancellation; the workflow hangs up and finishes as
    /// `Canceled`. Safe to call on an already finished call.
    pub async fn terminate(&self) {
        let _ = self.event_tx.send(WorkflowEvent::TerminateRequested).await;
    }

    /// Awaits the terminal call result.
    pub async fn result(&self) -> Result<CallResult, VoxioError> {
        let mut rx = self.result_rx.clone();
        let value = rx
            .wait_for(|result| result.is_some())
            .await
            .map_err(|_| VoxioError::Internal("call workflow dropped its result".into()))?;
        Ok(value.clone().expect("checked by wait_for"))
    }
}

#[async_trait]
impl SignalSink for CallHandle {
    /// Delivers a coarse-grained signal to the workflow.
    ///
    /// Signals addressed to an already finished workflow are dropped
    /// silently; late and duplicated signals are part of the contract.
    async fn signal(&self, signal: CallSignal) -> Result<(), VoxioError> {
        if self.event_tx.send(WorkflowEvent::Signal(signal)).await.is_err() {
            info!(call_id = %self.call_id, "signal after workflow finished; ignored");
        }
        Ok(())
    }
}

struct Driver {
    call_id: CallId,
    request: CallRequest,
    machine: CallMachine,
    deps: WorkflowDeps,
    policy: RetryPolicy,
    event_tx: mpsc::Sender<WorkflowEvent>,
    status_tx: watch::Sender<StatusSnapshot>,
    result_tx: watch::Sender<Option<CallResult>>,
    cancel: CancellationToken,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    outstanding_placement: bool,
}

impl Driver {
    async fn run(mut self, initial: Vec<Command>, mut event_rx: mpsc::Receiver<WorkflowEvent>) {
        info!(
            call_id = %self.call_id,
            phone_number = %self.request.phone_number,
            "call workflow started"
        );

        self.execute_all(initial).await;

        // Keep consuming events until the machine finished AND no
        // placement is in flight: a placement acknowledged after
        // cancellation still needs its hangup issued.
        while !(self.machine.is_finished() && !self.outstanding_placement) {
            let Some(event) = event_rx.recv().await else { break };

            match &event {
                WorkflowEvent::PlacementSucceeded { provider_call_id } => {
                    info!(
                        call_id = %self.call_id,
                        provider_call_id = %provider_call_id,
                        "placement acknowledged"
                    );
                    self.outstanding_placement = false;
                }
                WorkflowEvent::ActivityFailed { activity, message } => {
                    error!(
                        call_id = %self.call_id,
                        activity = %activity,
                        message = %message,
                        "activity failed"
                    );
                    if activity == ACTIVITY_PLACE_CALL {
                        self.outstanding_placement = false;
                    }
                }
                WorkflowEvent::PrewarmFailed { message } => {
                    // Pre-warming is a latency optimization only.
                    warn!(
                        call_id = %self.call_id,
                        message = %message,
                        "AI pre-warm failed; continuing"
                    );
                }
                _ => {}
            }

            let commands = self.machine.handle(event);
            self.publish_status();
            self.execute_all(commands).await;
        }

        self.cancel.cancel();
        info!(
            call_id = %self.call_id,
            status = %self.machine.status(),
            transcripts = self.machine.transcript_count(),
            "call workflow finished"
        );
    }

    /// Executes commands in order; an inline activity failure feeds back
    /// into the machine before the remaining commands run.
    async fn execute_all(&mut self, commands: Vec<Command>) {
        let mut queue = VecDeque::from(commands);
        while let Some(command) = queue.pop_front() {
            if let Some(event) = self.execute(command).await {
                let follow_up = self.machine.handle(event);
                self.publish_status();
                queue.extend(follow_up);
            }
        }
    }

    /// Executes one command. Returns a follow-up event for fatal inline
    /// failures.
    async fn execute(&mut self, command: Command) -> Option<WorkflowEvent> {
        match command {
            Command::CreateCallRecord => {
                let persistence = Arc::clone(&self.deps.persistence);
                let call_id = self.call_id.clone();
                let phone = self.request.phone_number.clone();
                let result = run_activity(ACTIVITY_CREATE_CALL_RECORD, &self.policy, || {
                    let persistence = Arc::clone(&persistence);
                    let call_id = call_id.clone();
                    let phone = phone.clone();
                    async move { persistence.create_call_record(&call_id, &phone).await }
                })
                .await;
                result.err().map(|error| WorkflowEvent::ActivityFailed {
                    activity: ACTIVITY_CREATE_CALL_RECORD.to_string(),
                    message: error.to_string(),
                })
            }
            Command::UpsertSessionRecord => {
                let registry = Arc::clone(&self.deps.registry);
                let record = SessionRecord::for_request(
                    self.call_id.clone(),
                    &self.request,
                    self.deps.config.registry.session_ttl(),
                );
                let result = run_activity(ACTIVITY_UPSERT_SESSION_RECORD, &self.policy, || {
                    let registry = Arc::clone(&registry);
                    let record = record.clone();
                    async move { registry.upsert(record).await }
                })
                .await;
                result.err().map(|error| WorkflowEvent::ActivityFailed {
                    activity: ACTIVITY_UPSERT_SESSION_RECORD.to_string(),
                    message: error.to_string(),
                })
            }
            Command::PlaceCall => {
                self.outstanding_placement = true;
                self.spawn_placement();
                None
            }
            Command::PrewarmAi => {
                self.spawn_prewarm();
                None
            }
            Command::StartConnectTimer => {
                self.spawn_timer(
                    self.deps.config.telephony.connect_timeout(),
                    WorkflowEvent::ConnectTimeout,
                );
                None
            }
            Command::StartMaxDurationTimer => {
                self.spawn_timer(
                    Duration::from_secs(self.request.max_duration_seconds),
                    WorkflowEvent::MaxDurationReached,
                );
                None
            }
            Command::SaveTranscripts(fragments) => {
                let persistence = Arc::clone(&self.deps.persistence);
                let call_id = self.call_id.clone();
                let result = run_activity(ACTIVITY_SAVE_TRANSCRIPTS, &self.policy, || {
                    let persistence = Arc::clone(&persistence);
                    let call_id = call_id.clone();
                    let fragments = fragments.clone();
                    async move { persistence.save_transcript_batch(&call_id, &fragments).await }
                })
                .await;
                if let Err(error) = result {
                    // Losing a batch does not end the call.
                    warn!(call_id = %self.call_id, %error, "failed to persist transcript batch");
                }
                None
            }
            Command::Hangup { provider_call_id } => {
                let telephony = Arc::clone(&self.deps.telephony);
                let result = run_activity(ACTIVITY_HANGUP, &self.policy, || {
                    let telephony = Arc::clone(&telephony);
                    let provider_call_id = provider_call_id.clone();
                    async move { telephony.hangup(&provider_call_id).await }
                })
                .await;
                if let Err(error) = result {
                    warn!(call_id = %self.call_id, %error, "hangup request failed");
                }
                None
            }
            Command::PersistResult => {
                self.ended_at = Some(Utc::now());
                let call_result = self.build_result();
                let persistence = Arc::clone(&self.deps.persistence);
                let result = run_activity(ACTIVITY_PERSIST_RESULT, &self.policy, || {
                    let persistence = Arc::clone(&persistence);
                    let call_result = call_result.clone();
                    async move { persistence.persist_call_result(&call_result).await }
                })
                .await;
                if let Err(error) = result {
                    error!(call_id = %self.call_id, %error, "failed to persist call result");
                }
                self.result_tx.send_replace(Some(call_result));
                None
            }
            Command::CleanupRegistry => {
                // Grace TTL instead of deletion, so in-flight transport
                // messages can still resolve the record.
                let grace = self.deps.config.registry.cleanup_grace();
                match self.deps.registry.set_ttl(&self.call_id, grace).await {
                    Ok(true) => {}
                    Ok(false) => {
                        info!(call_id = %self.call_id, "registry record already gone at cleanup")
                    }
                    Err(error) => {
                        warn!(call_id = %self.call_id, %error, "registry cleanup failed")
                    }
                }
                None
            }
        }
    }

    fn spawn_placement(&self) {
        let telephony = Arc::clone(&self.deps.telephony);
        let registry = Arc::clone(&self.deps.registry);
        let webhooks = self.deps.config.telephony.webhook_urls(&self.call_id);
        let phone = self.request.phone_number.clone();
        let call_id = self.call_id.clone();
        let policy = self.policy.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = run_activity(ACTIVITY_PLACE_CALL, &policy, || {
                let telephony = Arc::clone(&telephony);
                let registry = Arc::clone(&registry);
                let webhooks = webhooks.clone();
                let phone = phone.clone();
                let call_id = call_id.clone();
                async move {
                    // Idempotency guard: a retried attempt whose
                    // predecessor actually dialed must not dial again.
                    if let Some(record) = registry.get(&call_id).await? {
                        if let Some(existing) = record.provider_call_id {
                            return Ok(existing);
                        }
                    }
                    let provider_call_id = telephony.place_call(&phone, &webhooks).await?;
                    match registry.record_placement(&call_id, &provider_call_id).await {
                        Ok(Some(prior)) => Ok(prior),
                        Ok(None) => Ok(provider_call_id),
                        Err(error) => {
                            warn!(%call_id, %error, "failed to record placement in registry");
                            Ok(provider_call_id)
                        }
                    }
                }
            })
            .await;

            let event = match result {
                Ok(provider_call_id) => WorkflowEvent::PlacementSucceeded { provider_call_id },
                Err(error) => WorkflowEvent::ActivityFailed {
                    activity: ACTIVITY_PLACE_CALL.to_string(),
                    message: error.to_string(),
                },
            };
            let _ = event_tx.send(event).await;
        });
    }

    fn spawn_prewarm(&self) {
        let prewarmer = Arc::clone(&self.deps.prewarmer);
        let session_config = AiSessionConfig::from_request(&self.request);
        let call_id = self.call_id.clone();
        let policy = self.policy.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = run_activity(ACTIVITY_PREWARM, &policy, || {
                let prewarmer = Arc::clone(&prewarmer);
                let session_config = session_config.clone();
                let call_id = call_id.clone();
                async move { prewarmer.prewarm(&call_id, session_config).await }
            })
            .await;

            if let Err(error) = result {
                let _ = event_tx
                    .send(WorkflowEvent::PrewarmFailed {
                        message: error.to_string(),
                    })
                    .await;
            }
        });
    }

    fn spawn_timer(&self, after: Duration, event: WorkflowEvent) {
        let event_tx = self.event_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(after) => {
                    let _ = event_tx.send(event).await;
                }
            }
        });
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(StatusSnapshot {
            status: self.machine.status(),
            transcript_count: self.machine.transcript_count(),
        });
    }

    fn build_result(&self) -> CallResult {
        let duration_seconds = self
            .ended_at
            .map(|ended| (ended - self.started_at).num_seconds().max(0) as u64);
        CallResult {
            call_id: self.call_id.clone(),
            status: self.machine.status(),
            phone_number: self.request.phone_number.clone(),
            provider_call_id: self.machine.provider_call_id().map(str::to_string),
            stream_id: self.machine.stream_id().cloned(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_seconds,
            transcript_count: self.machine.transcript_count(),
        }
    }
}
