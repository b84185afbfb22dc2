//! Integration tests for the supervisor state machine
//!
//! These tests drive the full capture → probe → sink pipeline against the
//! scripted backend in `test_utils`.

use crate::test_utils::{ScriptedBackend, Step};
use spdif_bridge::audio::output::{SinkFraming, SinkParams};
use spdif_bridge::audio::{Supervisor, SupervisorConfig, SupervisorState};
use spdif_bridge::spdif::CodecId;
use std::time::Duration;

fn config(passthrough: Option<&str>) -> SupervisorConfig {
    SupervisorConfig {
        primary_device: "surround".to_string(),
        passthrough_device: passthrough.map(str::to_string),
        retry_delay: Duration::ZERO,
        trace: false,
    }
}

/// Steps until `count` transitions into `Failing` have been completed and the
/// session is streaming again, or `limit` steps have run.
fn run_through_failures(supervisor: &mut Supervisor<ScriptedBackend>, count: usize, limit: usize) -> Vec<SupervisorState> {
    let mut seen = Vec::new();
    let mut failures = 0;
    for _ in 0..limit {
        let before = supervisor.state();
        let after = supervisor.step();
        seen.push(after);
        if before == SupervisorState::Failing {
            failures += 1;
        }
        if failures == count && after == SupervisorState::Streaming {
            break;
        }
    }
    seen
}

#[test]
fn test_end_to_end_codec_switch_and_write_failure() {
    let mut script = vec![Step::Raw; 5];
    script.push(Step::CodecHeader(CodecId::Ac3));
    script.extend(std::iter::repeat(Step::compressed(CodecId::Ac3, 6)).take(4));

    let mut backend = ScriptedBackend::new(script);
    // 5 raw + 3 compressed writes succeed, the fourth compressed write fails.
    backend.fail_write_at = Some(9);
    let ledger = backend.ledger.clone();
    let mut supervisor = Supervisor::new(backend, config(None));

    let states = run_through_failures(&mut supervisor, 1, 50);
    assert_eq!(supervisor.state(), SupervisorState::Streaming);
    assert_eq!(states.iter().filter(|s| **s == SupervisorState::Failing).count(), 1);
    assert_eq!(supervisor.backend().remaining_steps(), 0);

    let ledger = ledger.borrow();
    assert_eq!(
        ledger.sink_opens,
        vec![
            ("surround".to_string(), SinkParams::pcm(2, 48_000)),
            ("surround".to_string(), SinkParams::pcm(6, 48_000)),
        ]
    );
    assert_eq!(ledger.codec_loads, vec![CodecId::Ac3]);
    assert_eq!(ledger.write_attempts, 9);
    assert_eq!(ledger.capture_opens, 2);
    assert_eq!(ledger.probe_opens, 2);
    assert_eq!(ledger.sink_live, 0);
    assert!(ledger.leaks.is_empty(), "leaked handles: {:?}", ledger.leaks);
}

#[test]
fn test_sink_reopens_only_on_format_change() {
    let mut script = vec![Step::Raw; 3];
    script.push(Step::CodecHeader(CodecId::Dts));
    script.push(Step::compressed(CodecId::Dts, 6));
    script.push(Step::compressed(CodecId::Dts, 6));
    script.push(Step::compressed(CodecId::Dts, 2));
    script.push(Step::Raw);
    script.push(Step::Raw);
    let steps = script.len();

    let backend = ScriptedBackend::new(script);
    let ledger = backend.ledger.clone();
    let mut supervisor = Supervisor::new(backend, config(None));

    assert_eq!(supervisor.step(), SupervisorState::Streaming);
    for _ in 0..steps {
        assert_eq!(supervisor.step(), SupervisorState::Streaming);
    }

    let ledger = ledger.borrow();
    let channels: Vec<u16> = ledger.sink_opens.iter().map(|(_, p)| p.channels).collect();
    // PCM, DTS 5.1, DTS stereo, PCM again
    assert_eq!(channels, vec![2, 6, 2, 2]);
    assert_eq!(ledger.sink_closes, 3);
    assert_eq!(ledger.write_attempts, steps - 1);
    assert_eq!(supervisor.active_format().map(|f| f.codec), Some(CodecId::None));
}

#[test]
fn test_compressed_audio_goes_to_passthrough_device() {
    let script = vec![
        Step::Raw,
        Step::CodecHeader(CodecId::Ac3),
        Step::compressed(CodecId::Ac3, 2),
        Step::Raw,
    ];
    let backend = ScriptedBackend::new(script);
    let ledger = backend.ledger.clone();
    let mut supervisor = Supervisor::new(backend, config(Some("iec958")));

    for _ in 0..5 {
        supervisor.step();
    }

    let ledger = ledger.borrow();
    let routes: Vec<(&str, SinkFraming)> = ledger
        .sink_opens
        .iter()
        .map(|(device, params)| (device.as_str(), params.framing))
        .collect();
    assert_eq!(
        routes,
        vec![
            ("surround", SinkFraming::Pcm),
            ("iec958", SinkFraming::Iec61937),
            ("surround", SinkFraming::Pcm),
        ]
    );
}

#[test]
fn test_consecutive_failures_release_everything() {
    let script = vec![Step::Raw, Step::CaptureError, Step::CaptureError, Step::Raw];
    let backend = ScriptedBackend::new(script);
    let ledger = backend.ledger.clone();
    let mut supervisor = Supervisor::new(backend, config(None));

    let mut failing_steps = 0;
    for _ in 0..12 {
        let before = supervisor.state();
        let after = supervisor.step();
        if before == SupervisorState::Failing {
            failing_steps += 1;
            assert_eq!(after, SupervisorState::Bootstrapping);
            assert!(!supervisor.holds_resources());
            let ledger = ledger.borrow();
            assert_eq!(ledger.capture_live + ledger.probe_live + ledger.sink_live, 0);
        }
        if failing_steps == 2 && after == SupervisorState::Streaming {
            break;
        }
    }

    assert_eq!(failing_steps, 2);
    let ledger = ledger.borrow();
    assert_eq!(ledger.capture_opens, 3);
    assert!(ledger.leaks.is_empty(), "leaked handles: {:?}", ledger.leaks);
}

#[test]
fn test_bootstrap_failure_closes_partial_session() {
    let mut backend = ScriptedBackend::new(vec![Step::Raw]);
    backend.fail_probe_opens = 1;
    let ledger = backend.ledger.clone();
    let mut supervisor = Supervisor::new(backend, config(None));

    assert_eq!(supervisor.step(), SupervisorState::Failing);
    assert!(supervisor.holds_resources());
    assert_eq!(supervisor.step(), SupervisorState::Bootstrapping);
    assert_eq!(ledger.borrow().capture_live, 0);
    assert_eq!(supervisor.step(), SupervisorState::Streaming);
    assert_eq!(supervisor.step(), SupervisorState::Streaming);
    assert_eq!(ledger.borrow().write_attempts, 1);
    assert!(ledger.borrow().leaks.is_empty());
}

#[test]
fn test_decoder_instantiation_failure_restarts_session() {
    let mut backend = ScriptedBackend::new(vec![Step::Raw, Step::CodecHeader(CodecId::TrueHd)]);
    backend.unsupported = vec![CodecId::TrueHd];
    let ledger = backend.ledger.clone();
    let mut supervisor = Supervisor::new(backend, config(None));

    assert_eq!(supervisor.step(), SupervisorState::Streaming);
    assert_eq!(supervisor.step(), SupervisorState::Streaming);
    assert_eq!(supervisor.step(), SupervisorState::Failing);
    assert_eq!(supervisor.step(), SupervisorState::Bootstrapping);
    assert_eq!(ledger.borrow().codec_loads, vec![CodecId::TrueHd]);
    assert_eq!(ledger.borrow().sink_live, 0);
}

#[test]
fn test_leftover_bytes_do_not_interrupt_streaming() {
    let script = vec![
        Step::CodecHeader(CodecId::Ac3),
        Step::Compressed {
            codec: CodecId::Ac3,
            channels: 6,
            sample_rate: 48_000,
            unconsumed: 12,
        },
        Step::compressed(CodecId::Ac3, 6),
    ];
    let backend = ScriptedBackend::new(script);
    let ledger = backend.ledger.clone();
    let mut supervisor = Supervisor::new(backend, config(None));

    for _ in 0..4 {
        assert_eq!(supervisor.step(), SupervisorState::Streaming);
    }
    assert_eq!(ledger.borrow().write_attempts, 2);
    assert_eq!(ledger.borrow().sink_opens.len(), 1);
}
