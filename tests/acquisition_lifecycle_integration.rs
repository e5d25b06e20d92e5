//! Integration tests for the acquisition backend lifecycle
//!
//! These tests validate the complete backend workflow on a real thread:
//! - Start, stop and shutdown
//! - Session end on transport errors
//! - Window reset on restart
//! - Live threshold changes and lossy result delivery
//! - Prompt exit with a silent device or an undrained status queue

mod common;

use common::backend_timeout;
use common::builders::{fast_config, FrameLineBuilder};
use common::mock_helpers::{default_stages, replay};
use gesture_rs::backend::{
    AcquisitionBackend, BackendMessage, DeviceTransport, FrontendHandle, ReplayTransport,
    Transport,
};
use gesture_rs::config::AppConfig;
use gesture_rs::types::{AcquisitionStatus, PipelineResult, PipelineStats};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

fn spawn_backend(
    config: &AppConfig,
    transport: impl Transport + 'static,
) -> (FrontendHandle, JoinHandle<()>) {
    let (preprocessor, classifier) = default_stages(config);
    let (backend, frontend) =
        AcquisitionBackend::new(config, Box::new(transport), preprocessor, classifier).unwrap();
    let handle = thread::spawn(move || backend.run());
    (frontend, handle)
}

/// Collect status messages until `done` matches one or the timeout expires
fn wait_for(
    frontend: &FrontendHandle,
    done: impl Fn(&BackendMessage) -> bool,
) -> Vec<BackendMessage> {
    let deadline = Instant::now() + backend_timeout();
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        if let Some(msg) = frontend.recv_timeout(Duration::from_millis(10)) {
            let finished = done(&msg);
            seen.push(msg);
            if finished {
                return seen;
            }
        }
    }
    panic!("timed out waiting for backend, saw {:?}", seen);
}

fn is_transport_error(msg: &BackendMessage) -> bool {
    matches!(msg, BackendMessage::TransportError(_))
}

fn last_stats(messages: &[BackendMessage]) -> Option<PipelineStats> {
    messages.iter().rev().find_map(|m| match m {
        BackendMessage::Stats(stats) => Some(stats.clone()),
        _ => None,
    })
}

fn session_lines() -> Vec<String> {
    let mut lines = vec!["Initializing sensors...".to_string()];
    lines.extend((0..5).map(|_| FrameLineBuilder::pose("Water").build()));
    lines.push("1,2,abc,4,5,6,7,8".to_string());
    lines
}

#[test]
fn test_backend_creation_and_shutdown() {
    let config = fast_config();
    let (frontend, handle) = spawn_backend(&config, ReplayTransport::new(Vec::<String>::new()));

    frontend.shutdown();
    wait_for(&frontend, |m| *m == BackendMessage::Shutdown);

    let result = handle.join();
    assert!(result.is_ok(), "Backend thread should exit cleanly");
}

#[test]
fn test_dropping_frontend_stops_backend() {
    let config = fast_config();
    let (frontend, handle) = spawn_backend(&config, ReplayTransport::new(Vec::<String>::new()));

    drop(frontend);
    assert!(handle.join().is_ok());
}

#[test]
fn test_replay_session_runs_to_completion() {
    let config = fast_config();
    let lines = session_lines();
    let (frontend, handle) = spawn_backend(&config, replay(&lines));

    frontend.start();
    let messages = wait_for(&frontend, is_transport_error);

    let statuses: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            BackendMessage::Status(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            AcquisitionStatus::Starting,
            AcquisitionStatus::Acquiring,
            AcquisitionStatus::Error
        ]
    );

    let updates = frontend.drain_updates();
    assert_eq!(updates.len(), lines.len());
    for (i, update) in updates.iter().enumerate() {
        assert_eq!(update.sequence, i as u64 + 1);
    }
    assert_eq!(updates[0].result, PipelineResult::Ignored);
    assert_eq!(updates[6].result, PipelineResult::Malformed);

    let labels = gesture_rs::config::ClassifierConfig::default().labels;
    let stable = updates[6].latest_stable;
    assert_eq!(stable.label().map(|id| labels[id.index()].as_str()), Some("Water"));
    assert_eq!(stable.votes(), 5);

    let stats = last_stats(&messages).expect("stats sent when the session ends");
    assert_eq!(stats.frames_total, 7);
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.decided, 5);
    assert_eq!(stats.dropped_updates, 0);

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_restart_clears_smoothing_history() {
    let config = fast_config();
    let lines = session_lines();
    let (frontend, handle) = spawn_backend(&config, replay(&lines));

    frontend.start();
    wait_for(&frontend, is_transport_error);
    let first = frontend.drain_updates();
    assert!(!first.last().unwrap().latest_stable.is_unknown());

    frontend.start();
    wait_for(&frontend, is_transport_error);
    let second = frontend.drain_updates();

    assert_eq!(second[0].sequence, 1);
    assert!(second[0].latest_stable.is_unknown());
    // Support has to build up again from scratch
    assert!(second[1].latest_stable.is_unknown());
    assert!(second[2].latest_stable.is_unknown());
    assert_eq!(second[3].latest_stable.votes(), 3);

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_threshold_set_from_frontend() {
    let config = fast_config();
    let lines = session_lines();
    let (frontend, handle) = spawn_backend(&config, replay(&lines));

    frontend.set_threshold_percent(100.0);
    frontend.start();
    wait_for(&frontend, is_transport_error);

    let decided: Vec<_> = frontend
        .drain_updates()
        .into_iter()
        .filter_map(|u| match u.result {
            PipelineResult::Decided { raw, stable } => Some((raw, stable)),
            _ => None,
        })
        .collect();
    assert_eq!(decided.len(), 5);
    for (raw, stable) in decided {
        assert!(raw.is_unknown());
        assert!(raw.confidence() > 0.75);
        assert!(stable.is_unknown());
    }

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_slow_consumer_gets_newest_updates() {
    let mut config = fast_config();
    config.acquisition.update_buffer = 2;
    let lines = session_lines();
    let (frontend, handle) = spawn_backend(&config, replay(&lines));

    frontend.start();
    let messages = wait_for(&frontend, is_transport_error);

    let updates = frontend.drain_updates();
    let sequences: Vec<u64> = updates.iter().map(|u| u.sequence).collect();
    assert_eq!(sequences, vec![6, 7]);

    let stats = last_stats(&messages).unwrap();
    assert_eq!(stats.dropped_updates, 5);

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_stop_halts_acquisition() {
    let config = fast_config();
    let line = FrameLineBuilder::pose("F").build();
    let transport =
        ReplayTransport::new(vec![line; 10_000]).with_pacing(Duration::from_millis(2));
    let (frontend, handle) = spawn_backend(&config, transport);

    frontend.start();
    wait_for(&frontend, |m| {
        *m == BackendMessage::Status(AcquisitionStatus::Acquiring)
    });
    thread::sleep(common::test_timeout());

    frontend.stop();
    wait_for(&frontend, |m| {
        *m == BackendMessage::Status(AcquisitionStatus::Stopped)
    });
    let received = frontend.drain_updates();
    assert!(!received.is_empty());

    thread::sleep(common::test_timeout());
    assert!(frontend.drain_updates().is_empty());

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_open_failure_reports_transport_error() {
    let config = fast_config();
    let (frontend, handle) = spawn_backend(
        &config,
        DeviceTransport::new("/nonexistent/gesture-rs/ttyUSB9"),
    );

    frontend.start();
    let messages = wait_for(&frontend, is_transport_error);
    assert!(messages.contains(&BackendMessage::Status(AcquisitionStatus::Error)));
    assert!(frontend.latest().is_none());

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_capture_file_session() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in session_lines() {
        writeln!(file, "{}\r", line).unwrap();
    }
    file.flush().unwrap();

    let config = fast_config();
    let (frontend, handle) = spawn_backend(&config, DeviceTransport::new(file.path()));

    frontend.start();
    wait_for(&frontend, is_transport_error);

    let latest = frontend.latest().unwrap();
    assert_eq!(latest.sequence, 7);
    assert_eq!(latest.latest_stable.votes(), 5);

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
#[cfg(feature = "mock-glove")]
fn test_mock_glove_produces_stable_labels() {
    use gesture_rs::backend::MockGloveTransport;

    let config = fast_config();
    let glove = MockGloveTransport::default()
        .with_frames_per_pose(20)
        .with_noise(5.0)
        .with_corruption_every(7);
    let (frontend, handle) = spawn_backend(&config, glove);

    frontend.start();
    let deadline = Instant::now() + backend_timeout();
    let mut stable_seen = false;
    while Instant::now() < deadline && !stable_seen {
        stable_seen = frontend
            .drain_updates()
            .iter()
            .any(|u| !u.latest_stable.is_unknown());
        thread::sleep(Duration::from_millis(5));
    }
    assert!(stable_seen, "mock glove should settle on a gesture");

    frontend.shutdown();
    handle.join().unwrap();
}

/// Wait for the backend thread to finish, at most `backend_timeout()`
fn join_within(handle: JoinHandle<()>) -> bool {
    let deadline = Instant::now() + backend_timeout();
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    handle.join().is_ok()
}

#[test]
#[cfg(unix)]
fn test_silent_device_does_not_block_stop_or_shutdown() {
    use std::fs::OpenOptions;

    let dir = tempfile::tempdir().unwrap();
    let fifo = dir.path().join("glove");
    let status = std::process::Command::new("mkfifo")
        .arg(&fifo)
        .status()
        .unwrap();
    assert!(status.success());

    // Writer holds the FIFO open and never writes
    let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
    let writer_path = fifo.clone();
    thread::spawn(move || {
        let _writer = OpenOptions::new().write(true).open(writer_path).unwrap();
        let _ = release_rx.recv();
    });

    let config = fast_config();
    let transport = DeviceTransport::from_config(&fifo, &config.acquisition)
        .with_read_timeout(Duration::from_millis(20));
    let (frontend, handle) = spawn_backend(&config, transport);

    frontend.start();
    wait_for(&frontend, |m| {
        *m == BackendMessage::Status(AcquisitionStatus::Acquiring)
    });
    thread::sleep(common::test_timeout());
    assert!(frontend.latest().is_none());

    frontend.stop();
    wait_for(&frontend, |m| {
        *m == BackendMessage::Status(AcquisitionStatus::Stopped)
    });
    frontend.shutdown();
    wait_for(&frontend, |m| *m == BackendMessage::Shutdown);
    assert!(join_within(handle), "worker should exit while the device is silent");

    drop(release_tx);
}

#[test]
fn test_undrained_status_queue_does_not_block_shutdown() {
    let mut config = fast_config();
    config.acquisition.stats_interval_ms = 1;
    let line = FrameLineBuilder::pose("U").build();
    let transport =
        ReplayTransport::new(vec![line; 100_000]).with_pacing(Duration::from_micros(500));
    let (frontend, handle) = spawn_backend(&config, transport);

    frontend.start();
    // Consumer only looks at the newest result, never at status messages
    let deadline = Instant::now() + Duration::from_millis(1500);
    let mut newest = None;
    while Instant::now() < deadline {
        if let Some(update) = frontend.latest() {
            newest = Some(update.sequence);
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert!(newest.is_some());
    assert!(frontend.receiver.is_full());

    frontend.shutdown();
    assert!(join_within(handle), "worker should exit with a full status queue");

    let messages = frontend.drain();
    assert_eq!(messages.last(), Some(&BackendMessage::Shutdown));
}

#[test]
fn test_overlong_device_line_is_malformed_and_resyncs() {
    use std::io::Write;

    let mut config = fast_config();
    config.acquisition.max_line_len = 256;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&vec![b'#'; 1 << 20]).unwrap();
    file.write_all(b"\n").unwrap();
    for _ in 0..3 {
        writeln!(file, "{}", FrameLineBuilder::pose("Water").build()).unwrap();
    }
    file.flush().unwrap();

    let (frontend, handle) = spawn_backend(
        &config,
        DeviceTransport::from_config(file.path(), &config.acquisition),
    );

    frontend.start();
    let messages = wait_for(&frontend, is_transport_error);

    let updates = frontend.drain_updates();
    assert_eq!(updates.len(), 4);
    assert_eq!(updates[0].result, PipelineResult::Malformed);
    assert!(updates[1..]
        .iter()
        .all(|u| matches!(u.result, PipelineResult::Decided { .. })));
    assert_eq!(updates[3].latest_stable.votes(), 3);

    let stats = last_stats(&messages).unwrap();
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.decided, 3);

    frontend.shutdown();
    handle.join().unwrap();
}
