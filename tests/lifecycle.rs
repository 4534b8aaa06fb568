// Manager lifecycle end to end.
//
// The producer path binds through process-global front-end state, so the
// whole sequence lives in a single test function.

use relaylog::{emit, Level, LogConfig, LoggerManager, RateLimitedLog, SinkKind};
use std::fs;
use std::path::Path;
use std::time::Duration;

fn async_file_config(dir: &Path, file_threshold: Level) -> LogConfig {
    LogConfig {
        app_id: "lifecycle".into(),
        sink_kind: SinkKind::AsyncFile,
        log_to_file: true,
        file_path: dir.to_path_buf(),
        file_threshold: Some(file_threshold),
        ..LogConfig::default()
    }
}

fn read_logs(dir: &Path) -> String {
    let mut contents = String::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            contents.push_str(&fs::read_to_string(entry.path()).unwrap_or_default());
        }
    }
    contents
}

#[test]
fn test_manager_lifecycle_roundtrip() {
    let root = tempfile::tempdir().unwrap();
    let manager = LoggerManager::new();

    // First run: warn-threshold async file pipeline. Records below the
    // threshold are rejected at the mask, before any counter moves.
    let run1 = root.path().join("run1");
    manager.setup(async_file_config(&run1, Level::Warn)).unwrap();
    manager.setup_logger().unwrap();

    emit(Level::Debug, b"masked debug");
    emit(Level::Info, b"masked info");
    emit(Level::Warn, b"kept warn");

    let m = manager.metrics().unwrap();
    assert_eq!(m.enqueued, 1);
    assert_eq!(m.dropped, 0);

    // Setup while running is refused
    assert!(manager.setup(async_file_config(&run1, Level::Warn)).is_err());

    manager.teardown();

    let logs = read_logs(&run1);
    assert!(logs.contains("kept warn"));
    assert!(!logs.contains("masked debug"));
    assert!(!logs.contains("masked info"));

    // Emits after teardown are no-ops
    emit(Level::Error, b"after teardown");
    assert_eq!(read_logs(&run1), logs);
    assert!(manager.metrics().is_none());

    // Second run proves setup after teardown works and starts the
    // counters from zero.
    let run2 = root.path().join("run2");
    manager.setup(async_file_config(&run2, Level::Info)).unwrap();
    manager.setup_logger().unwrap();
    assert_eq!(manager.metrics().unwrap().enqueued, 0);

    // A 100ms gate admits exactly one record of a fast burst
    let gate = RateLimitedLog::new(Duration::from_millis(100));
    for _ in 0..20 {
        gate.log(Level::Info, "rate limited ping");
    }
    assert_eq!(manager.metrics().unwrap().enqueued, 1);

    manager.teardown();

    let logs = read_logs(&run2);
    assert_eq!(logs.matches("rate limited ping").count(), 1);

    // Teardown twice is safe
    manager.teardown();
}
