//! Experiment files.
//!
//! ```toml
//! trace = "traces/loop.trace"   # synthetic trace when absent
//!
//! [[config]]
//! name = "2-Level (L1+L2)"
//! main_memory_latency = 100
//!
//! [[config.level]]
//! name = "L1"
//! total_size = 512
//! block_size = 32
//! associativity = 2
//! hit_latency = 1
//! replacement_policy = "LRU"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SimulatorError, SimulatorResult};
use crate::memory::HierarchyConfig;

fn default_trace_seed() -> u64 {
    42
}

/// A named hierarchy configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub name: String,
    #[serde(flatten)]
    pub hierarchy: HierarchyConfig,
}

impl Experiment {
    pub fn new(name: impl Into<String>, hierarchy: HierarchyConfig) -> Self {
        Self { name: name.into(), hierarchy }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<PathBuf>,

    /// Seed of the synthetic trace
    #[serde(default = "default_trace_seed")]
    pub trace_seed: u64,

    #[serde(rename = "config")]
    pub experiments: Vec<Experiment>,
}

impl FromStr for ExperimentFile {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl ExperimentFile {
    pub fn load(path: impl AsRef<Path>) -> SimulatorResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let file: Self = content.parse()?;
        log::debug!(
            "loaded {} configurations from {}",
            file.experiments.len(),
            path.as_ref().display()
        );
        Ok(file)
    }
}
