// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-call audio bridge session.
//!
//! Owns exactly one AI streaming session and (after attach) one telephony
//! transport sink. Four concurrent tasks hang off each session, all
//! children of one cancellation token:
//! - **inbound pump**: transcoded caller audio -> AI session
//! - **AI reader**: AI events -> outbound frame queue / transcript buffer
//! - **playback pump** (attached only): outbound queue -> transport, on a
//!   fixed cadence independent of inbound traffic
//! - **transcript ticker** (attached only): drains the transcript buffer
//!   to the orchestrator on a fixed cadence
//!
//! A session created before any transport exists is *pre-warmed*: the AI
//! session is opened and greeted so its first audio is already buffered
//! when the call connects, hiding connection latency behind the ring
//! period.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use voxio_audio::{ai_to_transport, transport_to_ai};
use voxio_config::BridgeConfig;
use voxio_core::traits::{AiSession, AiSessionAdapter, SignalSink};
use voxio_core::types::{AiEvent, AiSessionConfig, CallId, CallSignal, EndReason, Speaker, StreamId};
use voxio_core::VoxioError;

use crate::metrics::{BridgeCounters, BridgeMetrics};
use crate::queue::FrameQueue;
use crate::transcript::TranscriptBuffer;
use crate::transport::TransportSink;

/// Bytes per outbound transport frame: 20 ms of mu-law at 8 kHz.
pub const TRANSPORT_FRAME_BYTES: usize = 160;

/// Seconds after open at which the greeting is re-sent if the AI session
/// has produced no audio yet.
const FIRST_AUDIO_NUDGES_SECS: [u64; 2] = [3, 8];

/// One live bridge between a telephony transport and an AI session.
pub struct AudioBridgeSession {
    call_id: CallId,
    stream_id: Mutex<Option<StreamId>>,
    ai: Arc<dyn AiSession>,
    config: BridgeConfig,
    greeting: String,
    in_tx: mpsc::Sender<Vec<i16>>,
    outbound: FrameQueue,
    transcripts: Mutex<TranscriptBuffer>,
    counters: BridgeCounters,
    attached: AtomicBool,
    got_first_audio: AtomicBool,
    stop_seen: AtomicBool,
    torn_down: AtomicBool,
    cancel: CancellationToken,
    sink: Mutex<Option<Arc<dyn TransportSink>>>,
    signals: Mutex<Option<Arc<dyn SignalSink>>>,
}

impl AudioBridgeSession {
    /// Opens the AI session and starts the transport-independent tasks.
    ///
    /// With no transport attached yet this *is* a pre-warmed session: the
    /// greeting kick-off below makes the AI speak first, and its audio
    /// accumulates in the outbound queue until attach flushes it.
    pub async fn open(
        call_id: CallId,
        ai_adapter: Arc<dyn AiSessionAdapter>,
        session_config: AiSessionConfig,
        bridge_config: BridgeConfig,
    ) -> Result<Arc<Self>, VoxioError> {
        let ai = ai_adapter.open(session_config.clone()).await?;
        let (in_tx, in_rx) = mpsc::channel(bridge_config.inbound_queue_frames);

        let session = Arc::new(Self {
            call_id: call_id.clone(),
            stream_id: Mutex::new(None),
            ai,
            outbound: FrameQueue::new(bridge_config.outbound_queue_frames),
            config: bridge_config,
            greeting: session_config.greeting.clone(),
            in_tx,
            transcripts: Mutex::new(TranscriptBuffer::new()),
            counters: BridgeCounters::new(),
            attached: AtomicBool::new(false),
            got_first_audio: AtomicBool::new(false),
            stop_seen: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            sink: Mutex::new(None),
            signals: Mutex::new(None),
        });

        // Kick off the first assistant turn instead of waiting on VAD
        // silence detection.
        if let Err(error) = session.ai.send_text(&session.greeting).await {
            warn!(call_id = %call_id, %error, "failed to send greeting kick-off");
        }

        session.spawn_inbound_pump(in_rx);
        session.spawn_ai_reader();
        session.spawn_first_audio_watchdog();

        info!(call_id = %call_id, "audio bridge session opened");
        Ok(session)
    }

    /// Attaches the transport, flushes any pre-warmed audio, and starts
    /// the playback pump and transcript ticker.
    ///
    /// Rejects a second attach: at most one transport per session.
    pub async fn attach(
        self: &Arc<Self>,
        stream_id: StreamId,
        sink: Arc<dyn TransportSink>,
        signals: Arc<dyn SignalSink>,
    ) -> Result<(), VoxioError> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(VoxioError::SessionAttach(
                "session already torn down".to_string(),
            ));
        }
        if self.attached.swap(true, Ordering::SeqCst) {
            return Err(VoxioError::SessionAttach(format!(
                "session for call {} is already attached",
                self.call_id
            )));
        }

        *self.stream_id.lock().expect("stream_id lock") = Some(stream_id.clone());
        *self.sink.lock().expect("sink lock") = Some(sink.clone());
        *self.signals.lock().expect("signals lock") = Some(signals.clone());

        // Pre-warmed greeting audio has been waiting for this moment;
        // drain the backlog at once rather than at playback cadence.
        let mut flushed = 0usize;
        while let Some(frame) = self.outbound.pop() {
            if let Err(error) = sink.send_frame(frame).await {
                warn!(call_id = %self.call_id, %error, "transport rejected pre-warmed audio");
                self.teardown(EndReason::Error).await;
                return Err(VoxioError::TransportDisconnect {
                    reason: error.to_string(),
                });
            }
            self.counters.record_frame_out();
            flushed += 1;
        }
        if flushed > 0 {
            info!(
                call_id = %self.call_id,
                stream_id = %stream_id,
                flushed,
                "flushed pre-warmed audio frames"
            );
        }

        self.spawn_playback_pump();
        self.spawn_transcript_ticker();

        if let Err(error) = signals
            .signal(CallSignal::StreamingStarted {
                stream_id: stream_id.clone(),
            })
            .await
        {
            warn!(call_id = %self.call_id, %error, "failed to signal streaming_started");
        }

        info!(call_id = %self.call_id, stream_id = %stream_id, "transport attached");
        Ok(())
    }

    /// Accepts one inbound transport frame (codec-native bytes).
    ///
    /// Applies early backpressure: when the inbound queue is above 80%
    /// capacity the frame is dropped before the transcoding cost is paid.
    pub fn handle_media(&self, payload: &[u8]) -> Result<(), VoxioError> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(VoxioError::TransportDisconnect {
                reason: "session torn down".to_string(),
            });
        }
        self.counters.record_frame_in();

        let capacity = self.config.inbound_queue_frames;
        if self.in_tx.capacity() * 5 < capacity {
            self.drop_inbound_frame("queue above 80% capacity");
            return Ok(());
        }

        let pcm = transport_to_ai(payload);
        if self.in_tx.try_send(pcm).is_err() {
            self.drop_inbound_frame("queue full after transcoding");
        }
        Ok(())
    }

    fn drop_inbound_frame(&self, cause: &str) {
        self.counters.record_dropped_in();
        let dropped = self.counters.dropped_in();
        // Log every tenth drop to keep a saturated queue from flooding logs.
        if dropped % 10 == 1 {
            warn!(
                call_id = %self.call_id,
                dropped,
                total = self.counters.frames_in(),
                cause,
                "dropping inbound audio frame"
            );
        }
    }

    /// Records that the transport delivered an orderly `stop`, which makes
    /// the eventual teardown reason `normal` rather than `error`.
    pub fn mark_stop_received(&self) {
        self.stop_seen.store(true, Ordering::SeqCst);
    }

    /// Teardown reason implied by what the transport did so far.
    pub fn close_reason(&self) -> EndReason {
        if self.stop_seen.load(Ordering::SeqCst) {
            EndReason::Normal
        } else {
            EndReason::Error
        }
    }

    /// Tears the session down: stops every task, flushes the transcript
    /// remainder, signals `streaming_ended`, and closes the AI session.
    ///
    /// Idempotent; the first caller wins and later calls return
    /// immediately, so racing triggers (transport error vs. orchestrator
    /// terminate) are safe.
    pub async fn teardown(&self, reason: EndReason) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();

        self.flush_transcripts().await;

        let signals = self.signals.lock().expect("signals lock").clone();
        if let Some(signals) = signals {
            if let Err(error) = signals
                .signal(CallSignal::StreamingEnded { reason })
                .await
            {
                warn!(call_id = %self.call_id, %error, "failed to signal streaming_ended");
            }
        }

        if let Err(error) = self.ai.close().await {
            warn!(call_id = %self.call_id, %error, "error closing AI session");
        }

        let metrics = self.metrics();
        info!(
            call_id = %self.call_id,
            reason = %reason,
            frames_in = metrics.frames_in,
            frames_out = metrics.frames_out,
            dropped_in = metrics.dropped_in,
            dropped_out = metrics.dropped_out,
            interruptions = metrics.interruptions,
            peak_queue_depth = metrics.peak_queue_depth,
            user_turns = metrics.user_turns,
            agent_turns = metrics.agent_turns,
            "audio bridge session closed"
        );
    }

    /// Point-in-time counter snapshot.
    pub fn metrics(&self) -> BridgeMetrics {
        let (user_turns, agent_turns) = self.transcripts.lock().expect("transcripts lock").turns();
        self.counters.snapshot(user_turns, agent_turns)
    }

    pub fn call_id(&self) -> &CallId {
        &self.call_id
    }

    pub fn stream_id(&self) -> Option<StreamId> {
        self.stream_id.lock().expect("stream_id lock").clone()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Frames currently queued for the transport (test and log hook).
    pub fn outbound_depth(&self) -> usize {
        self.outbound.len()
    }

    // --- internal tasks ---

    fn spawn_inbound_pump(self: &Arc<Self>, mut rx: mpsc::Receiver<Vec<i16>>) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = session.cancel.cancelled() => break,
                    maybe = rx.recv() => {
                        let Some(pcm) = maybe else { break };
                        if let Err(error) = session.ai.send_audio(pcm).await {
                            warn!(call_id = %session.call_id, %error, "failed to forward caller audio");
                            session.teardown(EndReason::Error).await;
                            break;
                        }
                    }
                }
            }
        });
    }

    fn spawn_ai_reader(self: &Arc<Self>) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let reason = loop {
                tokio::select! {
                    _ = session.cancel.cancelled() => return,
                    event = session.ai.next_event() => match event {
                        Ok(AiEvent::Audio(pcm)) => session.on_ai_audio(&pcm),
                        Ok(AiEvent::UserTranscript(text)) => {
                            session.push_transcript(Speaker::User, text);
                        }
                        Ok(AiEvent::AgentTranscript(text)) => {
                            session.push_transcript(Speaker::Agent, text);
                        }
                        Ok(AiEvent::Interrupted) => session.on_interrupted(),
                        Ok(AiEvent::Closed) => break EndReason::Normal,
                        Err(error) => {
                            warn!(call_id = %session.call_id, %error, "AI session error");
                            break EndReason::Error;
                        }
                    }
                }
            };
            session.teardown(reason).await;
        });
    }

    fn spawn_playback_pump(self: &Arc<Self>) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(session.config.playback_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = session.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(frame) = session.outbound.pop() else { continue };
                        let sink = session.sink.lock().expect("sink lock").clone();
                        let Some(sink) = sink else { continue };
                        if let Err(error) = sink.send_frame(frame).await {
                            warn!(call_id = %session.call_id, %error, "transport write failed");
                            session.teardown(EndReason::Error).await;
                            break;
                        }
                        session.counters.record_frame_out();
                    }
                }
            }
        });
    }

    fn spawn_transcript_ticker(self: &Arc<Self>) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(session.config.transcript_sync_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of a tokio interval fires immediately and
            // would deliver an empty batch; swallow it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = session.cancel.cancelled() => break,
                    _ = ticker.tick() => session.flush_transcripts().await,
                }
            }
        });
    }

    fn spawn_first_audio_watchdog(self: &Arc<Self>) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let mut elapsed = 0u64;
            for checkpoint in FIRST_AUDIO_NUDGES_SECS {
                let wait = Duration::from_secs(checkpoint - elapsed);
                tokio::select! {
                    _ = session.cancel.cancelled() => return,
                    _ = tokio::time::sleep(wait) => {}
                }
                elapsed = checkpoint;

                if session.got_first_audio.load(Ordering::SeqCst) {
                    return;
                }
                info!(
                    call_id = %session.call_id,
                    after_secs = checkpoint,
                    "no AI audio yet; re-sending greeting to unblock first turn"
                );
                if let Err(error) = session.ai.send_text(&session.greeting).await {
                    warn!(call_id = %session.call_id, %error, "greeting nudge failed");
                }
            }

            if !session.got_first_audio.load(Ordering::SeqCst) {
                warn!(
                    call_id = %session.call_id,
                    "still no audio from AI session after greeting retries"
                );
            }
        });
    }

    fn on_ai_audio(&self, pcm: &[i16]) {
        if !self.got_first_audio.swap(true, Ordering::SeqCst) {
            debug!(call_id = %self.call_id, "first AI audio frame received");
        }
        let bytes = ai_to_transport(pcm);
        for frame in bytes.chunks(TRANSPORT_FRAME_BYTES) {
            if self.outbound.push(frame.to_vec()).is_some() {
                self.counters.record_dropped_out();
            }
            self.counters.sample_queue_depth(self.outbound.len());
        }
    }

    fn on_interrupted(&self) {
        if self.attached.load(Ordering::SeqCst) {
            let discarded = self.outbound.clear();
            self.counters.record_interruption();
            if discarded > 0 {
                debug!(
                    call_id = %self.call_id,
                    discarded,
                    "barge-in discarded queued agent audio"
                );
            }
        } else {
            // A pre-warmed session has no listener yet; the buffered
            // greeting must survive until attach.
            debug!(call_id = %self.call_id, "interruption during pre-warm ignored");
        }
    }

    fn push_transcript(&self, direction: Speaker, text: String) {
        self.transcripts
            .lock()
            .expect("transcripts lock")
            .push(direction, text);
    }

    async fn flush_transcripts(&self) {
        let batch = self.transcripts.lock().expect("transcripts lock").drain();
        if batch.is_empty() {
            return;
        }
        let signals = self.signals.lock().expect("signals lock").clone();
        let Some(signals) = signals else { return };
        if let Err(error) = signals
            .signal(CallSignal::TranscriptsAvailable(batch))
            .await
        {
            warn!(call_id = %self.call_id, %error, "failed to deliver transcript batch");
        }
    }
}
