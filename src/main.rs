// Main entrypoint for the adaptkv workload driver.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use adaptkv::config::{Config, EngineKind, StoreCfg, StoreFlavor};
use adaptkv::engine::{BTreeEngine, HashEngine, StorageEngine};
use adaptkv::metrics::MetricsReporter;
use adaptkv::store::{
    HardStore, HardThreadedStore, KvStore, SoftStore, SoftThreadedStore, StoreOptions,
};
use adaptkv::workload::{self, WorkloadOp};

const CONFIG_PATH: &str = "cfg/adaptkv.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/adaptkv.cfg.local.yaml";

/// adaptkv - partitioned key-value store with adaptive repartitioning
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Workload file, overriding the configured one
    #[arg(short, long, value_name = "FILE")]
    workload: Option<PathBuf>,

    /// Driver threads, overriding the configured count
    #[arg(short = 'j', long)]
    workers: Option<usize>,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to the default config.
fn load_cfg(path: Option<PathBuf>) -> Result<Config> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {custom_path:?}"))?;
        info!(
            component = "config",
            event = "load_success",
            path = ?custom_path,
            "config loaded"
        );
        return Ok(cfg);
    }

    match Config::load(&PathBuf::from(CONFIG_PATH_LOCAL)) {
        Ok(cfg) => {
            info!(
                component = "config",
                event = "load_success",
                path = CONFIG_PATH_LOCAL,
                "config loaded"
            );
            Ok(cfg)
        }
        Err(_) => {
            let cfg = Config::load(&PathBuf::from(CONFIG_PATH))
                .with_context(|| format!("failed to load config from {CONFIG_PATH}"))?;
            info!(
                component = "config",
                event = "load_success",
                path = CONFIG_PATH,
                "config loaded"
            );
            Ok(cfg)
        }
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs
        .as_ref()
        .and_then(|logs| logs.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let json = cfg
        .logs
        .as_ref()
        .and_then(|logs| logs.json)
        .unwrap_or(false);
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

fn store_options(cfg: &StoreCfg) -> StoreOptions {
    let mut options = StoreOptions::new(cfg.partitions);
    if let Some(paths) = &cfg.paths {
        options = options.with_paths(paths.clone());
    }
    if let Some(duration) = cfg.tracking_duration {
        options = options.with_tracking_duration(duration);
    }
    if let Some(interval) = cfg.repartition_interval {
        options = options.with_repartition_interval(interval);
    }
    if let Some(capacity) = cfg.queue_capacity {
        options = options.with_queue_capacity(capacity);
    }
    options
}

fn open_store<E: StorageEngine>(cfg: &StoreCfg) -> Result<Arc<dyn KvStore>> {
    let options = store_options(cfg);
    let store: Arc<dyn KvStore> = match cfg.flavor {
        StoreFlavor::Soft => Arc::new(SoftStore::<E>::new(options)?),
        StoreFlavor::Hard => Arc::new(HardStore::<E>::new(options)?),
        StoreFlavor::SoftThreaded => Arc::new(SoftThreadedStore::<E>::new(options)?),
        StoreFlavor::HardThreaded => Arc::new(HardThreadedStore::<E>::new(options)?),
    };
    Ok(store)
}

fn build_store(cfg: &StoreCfg) -> Result<Arc<dyn KvStore>> {
    match cfg.engine {
        EngineKind::Btree => open_store::<BTreeEngine>(cfg),
        EngineKind::Hash => open_store::<HashEngine>(cfg),
    }
}

fn execute_operation(op: &WorkloadOp, store: &dyn KvStore) {
    match op {
        WorkloadOp::Read { key } => {
            if let Err(e) = store.read(key) {
                debug!(component = "driver", event = "read_failed", key = %key, error = %e, "read failed");
            }
        }
        WorkloadOp::Write { key } => {
            if let Err(e) = store.write(key, &workload::default_value()) {
                warn!(component = "driver", event = "write_failed", key = %key, error = %e, "write failed");
            }
        }
        WorkloadOp::Scan { key, limit } => {
            if let Err(e) = store.scan(key, *limit) {
                debug!(component = "driver", event = "scan_failed", key = %key, error = %e, "scan failed");
            }
        }
    }
}

fn run_workload(
    operations: Vec<WorkloadOp>,
    workers: usize,
    store: Arc<dyn KvStore>,
    executed_counts: Arc<Vec<AtomicU64>>,
) {
    // Round-robin split so every driver thread sees a similar mix.
    let mut chunks: Vec<Vec<WorkloadOp>> = (0..workers).map(|_| Vec::new()).collect();
    for (i, op) in operations.into_iter().enumerate() {
        chunks[i % workers].push(op);
    }

    let mut handles = Vec::with_capacity(workers);
    for (worker_id, chunk) in chunks.into_iter().enumerate() {
        let store = Arc::clone(&store);
        let executed_counts = Arc::clone(&executed_counts);
        handles.push(thread::spawn(move || {
            for op in &chunk {
                execute_operation(op, store.as_ref());
                executed_counts[worker_id].fetch_add(1, Ordering::Relaxed);
            }
        }));
    }
    for handle in handles {
        let _ = handle.join();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = load_cfg(args.cfg)?;
    if let Some(path) = args.workload {
        cfg.workload.path = path;
    }
    if let Some(workers) = args.workers {
        cfg.workload.workers = Some(workers);
    }

    configure_logger(&cfg);

    let operations = workload::load(&cfg.workload.path)?;
    let workers = cfg
        .workload
        .workers
        .unwrap_or_else(num_cpus::get)
        .clamp(1, operations.len().max(1));
    info!(
        component = "driver",
        event = "workload_loaded",
        operations = operations.len(),
        workers,
        "workload ready"
    );

    let store = build_store(&cfg.store)?;
    let executed_counts: Arc<Vec<AtomicU64>> =
        Arc::new((0..workers).map(|_| AtomicU64::new(0)).collect());

    let reporter = match &cfg.metrics {
        Some(metrics) => Some(MetricsReporter::spawn(
            &metrics.path,
            Arc::clone(&store),
            Arc::clone(&executed_counts),
            cfg.store.paths.clone().unwrap_or_default(),
        )?),
        None => None,
    };

    let start = Instant::now();
    run_workload(
        operations,
        workers,
        Arc::clone(&store),
        Arc::clone(&executed_counts),
    );
    let elapsed = start.elapsed();

    if let Some(reporter) = reporter {
        reporter.stop();
    }

    let executed: u64 = executed_counts
        .iter()
        .map(|count| count.load(Ordering::Relaxed))
        .sum();
    info!(
        component = "driver",
        event = "workload_finished",
        executed,
        elapsed_ms = elapsed.as_millis() as u64,
        engine_operations = store.operation_count(),
        "workload finished"
    );

    Ok(())
}
