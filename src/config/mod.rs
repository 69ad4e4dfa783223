// Configuration loading for the workload driver.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Store flavor selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreFlavor {
    Soft,
    Hard,
    SoftThreaded,
    HardThreaded,
}

/// Engine selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Btree,
    Hash,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreCfg {
    pub flavor: StoreFlavor,
    pub engine: EngineKind,
    pub partitions: usize,
    pub paths: Option<Vec<PathBuf>>,
    #[serde(default, with = "humantime_serde")]
    pub tracking_duration: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub repartition_interval: Option<Duration>,
    pub queue_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkloadCfg {
    pub path: PathBuf,
    /// Driver threads replaying the workload; defaults to the core count.
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsCfg {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
    pub json: Option<bool>,
}

/// Driver configuration, loaded from YAML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub store: StoreCfg,
    pub workload: WorkloadCfg,
    pub metrics: Option<MetricsCfg>,
    pub logs: Option<Logs>,
}

impl Config {
    /// Loads the configuration struct from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path:?}"))?;
        let cfg: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {path:?}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.store.partitions >= 1,
            "store.partitions must be at least 1"
        );
        if let Some(paths) = &self.store.paths {
            anyhow::ensure!(!paths.is_empty(), "store.paths must not be empty");
        }
        if let Some(workers) = self.workload.workers {
            anyhow::ensure!(workers >= 1, "workload.workers must be at least 1");
        }
        Ok(())
    }
}
