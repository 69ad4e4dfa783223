//! Driver-side metrics reporter.
//!
//! Emits one CSV row per second while the workload runs:
//! `elapsed_time_ms,executed_count,memory_kb,disk_kb,Tracking,Repartitioning`
//! with `o`/`x` flags for the last two columns.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::store::KvStore;

const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Background reporter sampling progress counters and store state.
pub struct MetricsReporter {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MetricsReporter {
    /// Starts sampling into `output`. `executed_counts` holds one slot per
    /// driver worker; slots are summed without synchronization, approximate
    /// values are fine here.
    pub fn spawn(
        output: &Path,
        store: Arc<dyn KvStore>,
        executed_counts: Arc<Vec<AtomicU64>>,
        disk_paths: Vec<PathBuf>,
    ) -> Result<Self> {
        let file = File::create(output)
            .with_context(|| format!("failed to create metrics file {output:?}"))?;
        let running = Arc::new(AtomicBool::new(true));
        let handle = {
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("metrics".to_string())
                .spawn(move || sample_loop(file, store, executed_counts, disk_paths, running))
                .context("failed to spawn metrics thread")?
        };
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stops sampling and flushes the file.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MetricsReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sample_loop(
    file: File,
    store: Arc<dyn KvStore>,
    executed_counts: Arc<Vec<AtomicU64>>,
    disk_paths: Vec<PathBuf>,
    running: Arc<AtomicBool>,
) {
    let mut out = BufWriter::new(file);
    if writeln!(
        out,
        "elapsed_time_ms,executed_count,memory_kb,disk_kb,Tracking,Repartitioning"
    )
    .is_err()
    {
        warn!(component = "metrics", event = "write_failed", "giving up");
        return;
    }

    let start = Instant::now();
    let mut prev_tracking = false;
    while running.load(Ordering::Relaxed) {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        let executed: u64 = executed_counts
            .iter()
            .map(|count| count.load(Ordering::Relaxed))
            .sum();

        let tracking = store.is_tracking();
        // A tracking window that just closed means a repartition is being
        // computed even before the store raises its flag.
        let repartitioning = store.is_repartitioning() || (prev_tracking && !tracking);
        prev_tracking = tracking;

        let row = format!(
            "{},{},{},{},{},{}",
            elapsed_ms,
            executed,
            memory_usage_kb(),
            disk_usage_kb(&disk_paths),
            flag(tracking),
            flag(repartitioning),
        );
        if writeln!(out, "{row}").is_err() || out.flush().is_err() {
            warn!(component = "metrics", event = "write_failed", "giving up");
            return;
        }

        thread::sleep(SAMPLE_INTERVAL);
    }
    let _ = out.flush();
}

fn flag(on: bool) -> char {
    if on {
        'o'
    } else {
        'x'
    }
}

/// Resident set size in KiB, from `/proc/self/status`; 0 where unavailable.
fn memory_usage_kb() -> u64 {
    let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
        return 0;
    };
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            return rest
                .trim()
                .trim_end_matches("kB")
                .trim()
                .parse()
                .unwrap_or(0);
        }
    }
    0
}

/// Total size of regular files under the given paths, in KiB.
fn disk_usage_kb(paths: &[PathBuf]) -> u64 {
    let mut total = 0u64;
    for path in paths {
        total += dir_size(path);
    }
    total / 1024
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    let mut total = 0u64;
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else { continue };
        if meta.is_file() {
            total += meta.len();
        } else if meta.is_dir() {
            total += dir_size(&entry.path());
        }
    }
    total
}
