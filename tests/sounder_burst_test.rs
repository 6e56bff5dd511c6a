//! Integration tests running the full core with real worker threads.

use channel_sounder::config::SounderConfig;
use channel_sounder::data::FeedOutcome;
use channel_sounder::measurement::measurement_file_name;
use channel_sounder::source::SyntheticSource;
use channel_sounder::Sounder;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 2 channels at 200 kS/s; a 50-sample window every 200 samples; 20 windows per file.
fn create_test_config(dir: &Path) -> SounderConfig {
    let toml_str = format!(
        r#"
        [application]
        name = "Sounder Test"
        log_level = "debug"

        [radio]
        channels = 2
        bytes_per_sample = 4
        sample_rate = 200000
        max_burst_size = 100

        [rx]
        buffer_capacity = 1000

        [measurement]
        window_length = 50
        per_second = 1000
        windows_per_file = 20

        [tx]
        tone_hz = 10000

        [storage]
        save_path = "{}"
        "#,
        dir.join("out").display()
    );
    SounderConfig::from_toml_str(&toml_str).expect("Failed to parse test config")
}

fn measurement_file_sizes(dir: &Path) -> Vec<u64> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap())
        .filter(|e| e.file_name().to_string_lossy().starts_with("ch_measurement_"))
        .map(|e| e.metadata().unwrap().len())
        .collect()
}

#[test]
fn test_paced_burst_writes_complete_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut sounder = Sounder::new(create_test_config(dir.path())).unwrap();
    let mut source = SyntheticSource::new(100).paced(200_000);

    let summary = sounder
        .run_burst(
            &mut source,
            Duration::from_millis(400),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();

    assert!(summary.deliveries > 0);
    assert_eq!(summary.rx_samples, summary.deliveries * 100);
    assert!(summary.tx_samples > 0);
    assert!(summary.files_written >= 1, "{summary:?}");

    let sizes = measurement_file_sizes(sounder.save_path());
    assert_eq!(sizes.len() as u64, summary.files_written);
    assert!(sizes.iter().all(|&len| len == 2 * 20 * 50 * 4));

    let rx = &summary.stats[0];
    assert_eq!(rx.label, "Ringbuffer RX");
    assert_eq!(rx.buffers_full, summary.rx_handoffs + summary.rx_dropped);
    assert_eq!(summary.stats[1].write_errors, 0);
    assert!(sounder.save_path().join("seq.bin").exists());
}

#[test]
fn test_workers_pick_up_manual_deliveries() {
    let dir = tempfile::tempdir().unwrap();
    let mut sounder = Sounder::new(create_test_config(dir.path())).unwrap();
    let stop = Arc::new(AtomicBool::new(false));
    let workers = sounder.spawn_workers(Arc::clone(&stop)).unwrap();

    // one file needs 20 periods of 200 samples; keep delivering until it shows up
    let block = vec![vec![7u8; 100 * 4]; 2];
    let first = sounder.save_path().join(measurement_file_name(0));
    let deadline = Instant::now() + Duration::from_secs(5);
    while !first.exists() && Instant::now() < deadline {
        if let FeedOutcome::HandedOff(_) = sounder.rx().feed(&block, 100) {
            std::thread::sleep(Duration::from_millis(5));
        }
    }
    sounder.join_workers(workers).unwrap();
    assert!(stop.load(Ordering::Relaxed));

    let bytes = std::fs::read(first).unwrap();
    assert_eq!(bytes.len(), 8_000);
    assert!(bytes.iter().all(|&b| b == 7));
}

#[test]
fn test_workers_can_be_restarted() {
    let dir = tempfile::tempdir().unwrap();
    let mut sounder = Sounder::new(create_test_config(dir.path())).unwrap();

    for _ in 0..2 {
        let workers = sounder
            .spawn_workers(Arc::new(AtomicBool::new(false)))
            .unwrap();
        sounder.join_workers(workers).unwrap();
    }
}
