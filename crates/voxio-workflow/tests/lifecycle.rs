// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end call lifecycle tests against the mock provider stack.

use std::time::Duration;

use voxio_core::VoxioError;
use voxio_core::types::{CallRequest, CallSignal, CallStatus, Speaker, StreamId};
use voxio_core::vad::{VadConfig, VadSensitivity};
use voxio_core::traits::SignalSink;
use voxio_registry::SessionRegistry;
use voxio_test_utils::{CallHarness, PlacementOutcome};

fn request() -> CallRequest {
    CallRequest::new("+15551234567")
}

#[tokio::test(start_paused = true)]
async fn scenario_minimal_request_reaches_in_progress() {
    let harness = CallHarness::with_defaults();
    let handle = harness.start_call(request()).unwrap();

    // Defaults applied at ingestion.
    let config = handle.get_call_config();
    assert_eq!(config.greeting, "Hello! How can I help you today?");
    assert!(!config.vad.disabled);
    assert_eq!(config.vad.start_sensitivity, VadSensitivity::High);

    harness.wait_for_status(&handle, CallStatus::Ringing).await;
    assert_eq!(harness.telephony.placement_count(), 1);

    // Transport connects; streaming_started moves the call to InProgress.
    harness.connect_transport(&handle, "MZ-1").await.unwrap();
    harness
        .wait_for_status(&handle, CallStatus::InProgress)
        .await;

    // The registry now carries the stream id for any instance to find.
    let record = harness
        .registry
        .get(handle.call_id())
        .await
        .unwrap()
        .expect("session record");
    assert_eq!(record.stream_id, Some(StreamId("MZ-1".into())));
    assert_eq!(record.status, CallStatus::InProgress);
}

#[tokio::test]
async fn invalid_phone_number_rejected_before_side_effects() {
    let harness = CallHarness::with_defaults();
    let result = harness.start_call(CallRequest::new("not-a-number"));
    assert!(matches!(result, Err(VoxioError::Configuration(_))));
    assert_eq!(harness.telephony.placement_count(), 0);
    assert!(harness.persistence.created_calls().is_empty());
}

#[tokio::test]
async fn out_of_range_vad_rejected_before_side_effects() {
    let harness = CallHarness::with_defaults();
    let mut bad = request();
    bad.vad = VadConfig {
        silence_duration_ms: 5_000,
        ..VadConfig::default()
    };
    let result = harness.start_call(bad);
    assert!(matches!(result, Err(VoxioError::Configuration(_))));
    assert_eq!(harness.telephony.placement_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn transient_placement_failure_retries_without_double_dial() {
    let harness = CallHarness::builder()
        .with_placement_script(vec![
            PlacementOutcome::TransientFailure,
            PlacementOutcome::Succeed,
        ])
        .build();
    let handle = harness.start_call(request()).unwrap();

    harness.wait_for_status(&handle, CallStatus::Ringing).await;

    // The transient first attempt never dialed; exactly one call went out.
    assert_eq!(harness.telephony.placement_count(), 1);

    let record = harness
        .registry
        .get(handle.call_id())
        .await
        .unwrap()
        .expect("session record");
    assert_eq!(record.provider_call_id.as_deref(), Some("CA-mock-1"));

    harness.connect_transport(&handle, "MZ-1").await.unwrap();
    harness
        .wait_for_status(&handle, CallStatus::InProgress)
        .await;
}

#[tokio::test(start_paused = true)]
async fn permanent_placement_failure_fails_the_call() {
    let harness = CallHarness::builder()
        .with_placement_script(vec![PlacementOutcome::PermanentFailure])
        .build();
    let handle = harness.start_call(request()).unwrap();

    let result = handle.result().await.unwrap();
    assert_eq!(result.status, CallStatus::Failed);
    assert_eq!(harness.telephony.placement_count(), 0);
    // The terminal result was persisted once.
    assert_eq!(harness.persistence.results().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn connect_timeout_ends_as_no_answer() {
    let harness = CallHarness::with_defaults();
    let handle = harness.start_call(request()).unwrap();
    harness.wait_for_status(&handle, CallStatus::Ringing).await;

    // Nobody answers; awaiting the result lets the paused clock jump to
    // the 30 s connect timer.
    let result = handle.result().await.unwrap();
    assert_eq!(result.status, CallStatus::NoAnswer);
    assert_eq!(result.provider_call_id.as_deref(), Some("CA-mock-1"));
    // The pending outbound call was hung up during finalization.
    assert_eq!(harness.telephony.hangups(), vec!["CA-mock-1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn provider_terminal_status_maps_to_busy() {
    let harness = CallHarness::with_defaults();
    let handle = harness.start_call(request()).unwrap();
    harness.wait_for_status(&handle, CallStatus::Ringing).await;

    handle
        .signal(CallSignal::CallStatusChanged {
            provider_status: "busy".into(),
        })
        .await
        .unwrap();

    let result = handle.result().await.unwrap();
    assert_eq!(result.status, CallStatus::Busy);
}

#[tokio::test(start_paused = true)]
async fn duplicate_streaming_started_is_idempotent() {
    let harness = CallHarness::with_defaults();
    let handle = harness.start_call(request()).unwrap();
    harness.wait_for_status(&handle, CallStatus::Ringing).await;
    harness.connect_transport(&handle, "MZ-1").await.unwrap();
    harness
        .wait_for_status(&handle, CallStatus::InProgress)
        .await;

    // A duplicated (late) signal must change nothing.
    handle
        .signal(CallSignal::StreamingStarted {
            stream_id: StreamId("MZ-9".into()),
        })
        .await
        .unwrap();
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }

    assert_eq!(handle.get_status().status, CallStatus::InProgress);
    let record = harness.registry.get(handle.call_id()).await.unwrap().unwrap();
    assert_eq!(record.stream_id, Some(StreamId("MZ-1".into())));
}

#[tokio::test(start_paused = true)]
async fn transcripts_flow_to_persistence_in_order() {
    let harness = CallHarness::with_defaults();
    let handle = harness.start_call(request()).unwrap();
    harness.wait_for_status(&handle, CallStatus::Ringing).await;
    let (_session, _transport) = harness.connect_transport(&handle, "MZ-1").await.unwrap();
    harness
        .wait_for_status(&handle, CallStatus::InProgress)
        .await;

    let ai = harness.ai.last_session().expect("AI session");
    ai.emit(voxio_core::types::AiEvent::AgentTranscript("Hello! ".into()));
    ai.emit(voxio_core::types::AiEvent::UserTranscript("Hi ".into()));
    ai.emit(voxio_core::types::AiEvent::AgentTranscript("How can I help?".into()));

    // One sync tick delivers the first batch; a second utterance lands in
    // the next batch.
    tokio::time::sleep(Duration::from_millis(2_100)).await;
    ai.emit(voxio_core::types::AiEvent::UserTranscript("I need a cab".into()));
    tokio::time::sleep(Duration::from_millis(2_100)).await;
    for _ in 0..200 {
        tokio::task::yield_now().await;
    }

    assert_eq!(handle.get_status().transcript_count, 4);

    let fragments = harness.persistence.fragments_for(handle.call_id());
    assert_eq!(fragments.len(), 4);
    // Per-direction sequence ordering survives the batch split.
    let user_seqs: Vec<u64> = fragments
        .iter()
        .filter(|f| f.direction == Speaker::User)
        .map(|f| f.seq)
        .collect();
    assert_eq!(user_seqs, vec![1, 2]);
    let agent_seqs: Vec<u64> = fragments
        .iter()
        .filter(|f| f.direction == Speaker::Agent)
        .map(|f| f.seq)
        .collect();
    assert_eq!(agent_seqs, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn streaming_ended_normal_completes_call() {
    let harness = CallHarness::with_defaults();
    let handle = harness.start_call(request()).unwrap();
    harness.wait_for_status(&handle, CallStatus::Ringing).await;
    harness.connect_transport(&handle, "MZ-1").await.unwrap();
    harness
        .wait_for_status(&handle, CallStatus::InProgress)
        .await;

    // The transport reports an orderly stop.
    harness
        .manager
        .handle_stop(&StreamId("MZ-1".into()))
        .await
        .unwrap();

    let result = handle.result().await.unwrap();
    assert_eq!(result.status, CallStatus::Completed);
    assert_eq!(result.stream_id, Some(StreamId("MZ-1".into())));
    assert_eq!(result.transcript_count, 0);
    // Teardown released the AI session exactly once.
    let ai = harness.ai.last_session().unwrap();
    assert_eq!(ai.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn max_duration_forces_completion() {
    let harness = CallHarness::with_defaults();
    let mut short = request();
    short.max_duration_seconds = 5;
    let handle = harness.start_call(short).unwrap();

    harness.wait_for_status(&handle, CallStatus::Ringing).await;
    harness.connect_transport(&handle, "MZ-1").await.unwrap();
    harness
        .wait_for_status(&handle, CallStatus::InProgress)
        .await;

    // No terminal signal arrives; the race timer wins.
    let result = handle.result().await.unwrap();
    assert_eq!(result.status, CallStatus::Completed);
    assert_eq!(harness.telephony.hangups(), vec!["CA-mock-1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn terminate_cancels_and_hangs_up() {
    let harness = CallHarness::with_defaults();
    let handle = harness.start_call(request()).unwrap();
    harness.wait_for_status(&handle, CallStatus::Ringing).await;

    handle.terminate().await;
    let result = handle.result().await.unwrap();
    assert_eq!(result.status, CallStatus::Canceled);
    assert_eq!(harness.telephony.hangups(), vec!["CA-mock-1".to_string()]);

    // Cleanup kept the record on a grace TTL rather than deleting it.
    assert!(harness.registry.get(handle.call_id()).await.unwrap().is_some());

    // Terminating again is harmless.
    handle.terminate().await;
    assert_eq!(handle.get_status().status, CallStatus::Canceled);
}

#[tracing_test::traced_test]
#[tokio::test(start_paused = true)]
async fn prewarm_failure_never_blocks_the_call() {
    let harness = CallHarness::builder().with_failed_ai_opens(3).build();
    let handle = harness.start_call(request()).unwrap();

    harness.wait_for_status(&handle, CallStatus::Ringing).await;
    assert_eq!(harness.manager.prewarmed_sessions(), 0);

    // Transport connect falls back to synchronous session creation.
    harness.connect_transport(&handle, "MZ-1").await.unwrap();
    harness
        .wait_for_status(&handle, CallStatus::InProgress)
        .await;
    assert_eq!(harness.ai.open_count(), 1);
    assert!(logs_contain("AI pre-warm failed"));
}

#[tokio::test(start_paused = true)]
async fn call_record_created_before_placement() {
    let harness = CallHarness::with_defaults();
    let handle = harness.start_call(request()).unwrap();
    harness.wait_for_status(&handle, CallStatus::Ringing).await;

    let created = harness.persistence.created_calls();
    assert_eq!(created.len(), 1);
    assert_eq!(&created[0].0, handle.call_id());
    assert_eq!(created[0].1, "+15551234567");
}
