//! End-to-end eruptions over a real noise mapping file.
//!
//! Tokio's clock is paused, so multi-minute runs finish instantly.

use lavabomb::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// A sink the test can still read after a failed run.
#[derive(Clone, Default)]
struct SharedSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl SharedSink {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl NoiseSink for SharedSink {
    fn render(&mut self, line: &NoiseLine) -> lavabomb::error::Result<()> {
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

fn engine(budget_secs: u64) -> LavaEngine {
    LavaEngine::new(LavaConfig::default().with_run_budget(Duration::from_secs(budget_secs)))
        .unwrap()
}

fn write_mapping(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.json");
    fs::write(&path, content).unwrap();
    path
}

/// Pushes the file's mtime ahead so every poll sees it as changed.
fn touch_ahead(path: &Path) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(3600))
        .unwrap();
}

fn rumbles(range: std::ops::RangeInclusive<u64>) -> Vec<String> {
    range.map(|i| format!("{}  ...  rumble", i)).collect()
}

#[tokio::test(start_paused = true)]
async fn ten_seconds_with_an_untouched_mapping() {
    let temp_dir = TempDir::new().unwrap();
    // written before the run starts, so it is not a change
    let path = write_mapping(&temp_dir, r#"{"second": "hiss"}"#);

    let report = engine(10)
        .run(
            FileSource::new(&path),
            Vec::<String>::new(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.reason, ShutdownReason::BudgetExhausted);
    assert_eq!(report.reloads, 0);
    assert_eq!(report.sink, rumbles(1..=10));
}

#[tokio::test(start_paused = true)]
async fn sixty_one_seconds_hand_the_boundary_to_the_minute() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_mapping(&temp_dir, "{}");

    let report = engine(61)
        .run(
            FileSource::new(&path),
            Vec::<String>::new(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut expected = rumbles(1..=59);
    expected.push("60  ...  RUMBLE".to_string());
    expected.push("61  ...  rumble".to_string());
    assert_eq!(report.sink, expected);
}

#[tokio::test(start_paused = true)]
async fn minute_override_from_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_mapping(&temp_dir, r#"{"minute": "rrrumble"}"#);
    touch_ahead(&path);

    let report = engine(61)
        .run(
            FileSource::new(&path),
            Vec::<String>::new(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.reloads >= 1);
    assert_eq!(report.sink.len(), 61);
    assert_eq!(&report.sink[..59], rumbles(1..=59).as_slice());
    assert_eq!(report.sink[59], "60  ...  rrrumble");
    assert_eq!(report.sink[60], "61  ...  rumble");
}

#[tokio::test(start_paused = true)]
async fn malformed_mapping_ends_the_run_with_a_decode_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_mapping(&temp_dir, r#"{"second": "rumble", "minute": "#);
    touch_ahead(&path);
    let sink = SharedSink::default();

    let result = engine(61)
        .run(FileSource::new(&path), sink.clone(), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(LavaError::Decode { .. })));
    assert!(sink.lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn mistyped_mapping_is_not_a_partial_success() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_mapping(&temp_dir, r#"{"second": "hiss", "hour": 12}"#);
    touch_ahead(&path);
    let sink = SharedSink::default();

    let result = engine(61)
        .run(FileSource::new(&path), sink.clone(), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(LavaError::Decode { .. })));
    assert!(!sink.lines().iter().any(|line| line.ends_with("hiss")));
}

#[tokio::test(start_paused = true)]
async fn missing_mapping_ends_the_run_with_an_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let sink = SharedSink::default();

    let result = engine(61)
        .run(
            FileSource::new(temp_dir.path().join("config_missing.json")),
            sink.clone(),
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(LavaError::Io { .. })));
    assert!(sink.lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn skip_policy_rumbles_on_through_a_missing_mapping() {
    let temp_dir = TempDir::new().unwrap();
    let config = LavaConfig::default()
        .with_run_budget(Duration::from_secs(5))
        .with_reload_failure(ReloadFailurePolicy::Skip);

    let report = LavaEngine::new(config)
        .unwrap()
        .run(
            FileSource::new(temp_dir.path().join("config_missing.json")),
            Vec::<String>::new(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.reason, ShutdownReason::BudgetExhausted);
    assert_eq!(report.sink, rumbles(1..=5));
}

#[test]
fn zero_budget_is_a_construction_error() {
    let config = LavaConfig::default().with_run_budget(Duration::ZERO);
    assert!(matches!(
        LavaEngine::new(config),
        Err(LavaError::Construction(_))
    ));
}
