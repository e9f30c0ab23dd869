use hotspot::config::PollConfig;
use hotspot::domain::{Frame, HotspotError, Pid, Sample, SessionError};
use hotspot::driver::PollingDriver;
use hotspot::render::RenderOptions;
use hotspot::session::{PmuEvent, ReplayBackend, ReplayFile, SessionConfig};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/foo_bar.json");

fn write_replay(file: &ReplayFile) -> tempfile::NamedTempFile {
    let mut tmp = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    serde_json::to_writer(&mut tmp, file).expect("Failed to write replay file");
    tmp.flush().unwrap();
    tmp
}

fn config() -> SessionConfig {
    SessionConfig::new(Pid(0), PmuEvent::Cycles, 4000, false).unwrap()
}

fn poll(count: u32) -> PollConfig {
    PollConfig { interval: Duration::from_millis(1), count }
}

#[tokio::test]
async fn test_replay_file_drives_reports() {
    let file = ReplayFile {
        batches: vec![vec![Sample {
            event_name: "cycles".to_string(),
            weight: 42,
            stack: vec![Frame {
                symbol_name: Some("compute".to_string()),
                module_name: Some("/usr/bin/app".to_string()),
                ..Frame::default()
            }],
        }]],
    };
    let tmp = write_replay(&file);

    let backend = ReplayBackend::from_path(tmp.path()).unwrap();
    assert_eq!(backend.batch_count(), 1);

    let mut driver = PollingDriver::new(backend, config(), poll(1), RenderOptions { color: false }, Vec::new());
    driver.run().await.unwrap();

    let out = String::from_utf8(driver.into_output()).unwrap();
    assert!(out.contains(&format!("  {:<78}{:<20}{:<40}100.00%", "compute", 42, "app")));
    assert!(out.contains("|——compute /usr/bin/app"));
}

#[tokio::test]
async fn test_more_cycles_than_batches() {
    let backend = ReplayBackend::from_path(Path::new(FIXTURE)).unwrap();
    assert_eq!(backend.batch_count(), 3);

    let mut driver = PollingDriver::new(backend, config(), poll(4), RenderOptions { color: false }, Vec::new());
    let err = driver.run().await.unwrap_err();
    assert!(matches!(err, HotspotError::Read { cycle: 4, source: SessionError::ReplayExhausted(3) }));
}

#[test]
fn test_invalid_json_rejected() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    write!(tmp, "{{\"batches\": [[{{\"weight\": 1}}]]}}").unwrap();
    let err = ReplayBackend::from_path(tmp.path()).unwrap_err();
    assert!(matches!(err, SessionError::Json(_)));
}

#[test]
fn test_missing_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = ReplayBackend::from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SessionError::Io(_)));
}

#[test]
fn test_cli_replay_run() {
    let output = Command::new(env!("CARGO_BIN_EXE_hotspot"))
        .args(["0.01", "3", "0", "--replay", FIXTURE, "--no-color", "-q"])
        .output()
        .expect("Failed to run hotspot");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("cycle 1/3: 3 samples, total weight 180\n"));
    assert!(stdout.contains("cycle 2/3: 0 samples, total weight 0"));
    assert!(stdout.contains("cycle 3/3: 2 samples, total weight 80"));
    assert!(!stdout.contains("\u{1b}["));
}

#[test]
fn test_cli_exhausted_replay_exits_with_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_hotspot"))
        .args(["0.01", "5", "0", "--replay", FIXTURE, "-q"])
        .output()
        .expect("Failed to run hotspot");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("read failed in cycle 4"));
    // Reports of the completed cycles were still printed
    assert!(String::from_utf8_lossy(&output.stdout).contains("cycle 3/5"));
}

#[test]
fn test_cli_usage_errors_exit_2() {
    for args in [&["0", "1", "0", "1"][..], &["1", "0", "0", "1"], &["1", "1", "2", "1"], &["1", "1", "0"]] {
        let output = Command::new(env!("CARGO_BIN_EXE_hotspot")).args(args).output().expect("Failed to run hotspot");
        assert_eq!(output.status.code(), Some(2), "{args:?}");
    }
}
