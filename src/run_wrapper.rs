//! A simulator wrapper

use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::error::SimulatorResult;
use crate::memory::{AccessType, CacheHierarchy, HierarchyConfig, HierarchyStats};
use crate::trace::{AccessRecord, TraceReader};

/// Read-only results of a completed run
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub config_name: String,
    pub stats: HierarchyStats,
    pub wallclock_seconds: f64,
}

impl RunReport {
    pub fn accesses(&self) -> u64 {
        self.stats.accesses()
    }

    pub fn amat(&self) -> f64 {
        self.stats.amat()
    }

    pub fn total_access_time(&self) -> f64 {
        self.stats.total_access_time()
    }

    pub fn l1_hit_ratio(&self) -> f64 {
        self.stats.levels.first().map_or(0.0, |l1| l1.hit_ratio())
    }
}

/// Run the trace through the hierarchy, starting from a cold state.
///
/// The first failing entry aborts the run: the hierarchy is reset and
/// the error is returned instead of the partial statistics.
pub fn run_trace(
    config_name: &str,
    mem: &mut CacheHierarchy,
    trace: impl IntoIterator<Item = SimulatorResult<AccessRecord>>,
) -> SimulatorResult<RunReport> {
    log::info!("running simulation: {}", config_name);
    let start = Instant::now();
    mem.reset();

    for record in trace {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::error!("{}: aborted: {}", config_name, e);
                mem.reset();
                return Err(e);
            }
        };
        let access = mem.access_record(&record);
        log::trace!(
            "{:#x} served by {:?} after {} cycles",
            record.address,
            access.served_by,
            access.latency
        );
    }

    let report = RunReport {
        config_name: config_name.to_string(),
        stats: mem.stats(),
        wallclock_seconds: start.elapsed().as_secs_f64(),
    };
    log::info!(
        "{}: {} accesses, AMAT = {:.4}",
        config_name,
        report.accesses(),
        report.amat()
    );
    for level in &report.stats.levels {
        log::debug!(
            "{}: {} hits, {} misses, hit ratio {:.2}%",
            level.name,
            level.hits,
            level.misses,
            level.hit_ratio() * 100.0
        );
    }
    Ok(report)
}

/// Run an infallible trace
pub fn run_records(
    config_name: &str,
    mem: &mut CacheHierarchy,
    trace: impl IntoIterator<Item = AccessRecord>,
) -> SimulatorResult<RunReport> {
    run_trace(config_name, mem, trace.into_iter().map(Ok))
}

/// Run a trace of signed read addresses; a negative one aborts the run.
/// Entries are numbered from 1 in the error.
pub fn run_addresses(
    config_name: &str,
    mem: &mut CacheHierarchy,
    addresses: impl IntoIterator<Item = i64>,
) -> SimulatorResult<RunReport> {
    let trace = addresses
        .into_iter()
        .enumerate()
        .map(|(i, address)| AccessRecord::from_signed(address, AccessType::Read, i + 1));
    run_trace(config_name, mem, trace)
}

/// Build a hierarchy from the configuration and run the records through it
pub fn run_simulation(
    config_name: &str,
    config: &HierarchyConfig,
    trace: impl IntoIterator<Item = AccessRecord>,
) -> SimulatorResult<RunReport> {
    let mut mem = CacheHierarchy::make(config)?;
    run_records(config_name, &mut mem, trace)
}

/// Run simulation on the given trace file
pub fn run_trace_file(
    config_name: &str,
    config: &HierarchyConfig,
    trace_path: impl AsRef<Path>,
) -> SimulatorResult<RunReport> {
    let mut mem = CacheHierarchy::make(config)?;
    run_trace(config_name, &mut mem, TraceReader::open(trace_path)?)
}
