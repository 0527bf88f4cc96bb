use std::path::PathBuf;

use clap::Parser;

use crate::config::{Experiment, ExperimentFile};
use crate::error::SimulatorResult;
use crate::memory::{CacheConfig, HierarchyConfig, PolicyKind};

/// Set-associative cache and memory hierarchy simulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct SimArgs {
    /// Trace file with one `r|w <address>` entry per line.
    /// The synthetic trace is used when absent.
    #[arg(short, long, value_name = "TRACE")]
    pub trace: Option<PathBuf>,

    /// TOML file listing the hierarchies to simulate.
    /// Overrides the single-level options below.
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Total cache size in bytes
    #[arg(long, default_value_t = 1024)]
    pub size: u64,

    /// Block size in bytes
    #[arg(long, default_value_t = 32)]
    pub block: u64,

    /// Lines per set
    #[arg(long, default_value_t = 1)]
    pub assoc: u64,

    #[arg(long, default_value_t = 1)]
    pub hit_latency: u32,

    /// Replacement policy: LRU, FIFO, Random or LFU
    #[arg(short, long, default_value_t = PolicyKind::Lru)]
    pub policy: PolicyKind,

    /// Seed of the random replacement policy
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(short, long, default_value_t = 100)]
    pub memory_latency: u32,

    /// Seed of the synthetic trace
    #[arg(long, default_value_t = 42)]
    pub trace_seed: u64,

    /// Export one summary row per configuration to this CSV file
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl SimArgs {
    /// The configured experiments, with the trace file and seed they run on
    pub fn experiments(&self) -> SimulatorResult<ExperimentFile> {
        let mut file = match &self.config {
            Some(path) => ExperimentFile::load(path)?,
            None => {
                let mut level = CacheConfig::make(
                    "L1",
                    self.size,
                    self.block,
                    self.assoc,
                    self.hit_latency,
                )
                .with_policy(self.policy);
                level.seed = self.seed;
                let name = format!(
                    "{}B {}-way {}B blocks ({})",
                    self.size, self.assoc, self.block, self.policy
                );
                ExperimentFile {
                    trace: None,
                    trace_seed: self.trace_seed,
                    experiments: vec![Experiment::new(
                        name,
                        HierarchyConfig::single(level, self.memory_latency),
                    )],
                }
            }
        };
        if self.trace.is_some() {
            file.trace = self.trace.clone();
        }
        Ok(file)
    }
}

/// Initialise `env_logger`; `RUST_LOG` takes precedence over the verbosity
pub fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
