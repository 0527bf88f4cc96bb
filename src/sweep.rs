//! Parameter sweeps over independent configurations.
//!
//! Every configuration builds its own hierarchy, so they run in parallel
//! without sharing any state.

use rayon::prelude::*;
use strum::IntoEnumIterator;

use crate::config::Experiment;
use crate::error::SimulatorResult;
use crate::memory::{CacheConfig, HierarchyConfig, PolicyKind};
use crate::report::SweepRow;
use crate::run_wrapper::{run_simulation, RunReport};
use crate::trace::AccessRecord;

/// Main-memory latency used by the single-level sweeps
pub const SWEEP_MEMORY_LATENCY: u32 = 100;

/// Run every experiment over the same trace, results in input order
pub fn run_all(
    experiments: &[Experiment],
    trace: &[AccessRecord],
) -> Vec<SimulatorResult<RunReport>> {
    experiments
        .par_iter()
        .map(|experiment| {
            run_simulation(&experiment.name, &experiment.hierarchy, trace.iter().copied())
        })
        .collect()
}

/// Simulate one single-level configuration per value.
/// Configurations that fail are reported and left out.
fn sweep<T: ToString>(
    parameter: &str,
    values: &[T],
    make: impl Fn(&T) -> CacheConfig,
    trace: &[AccessRecord],
) -> Vec<SweepRow> {
    let experiments: Vec<_> = values
        .iter()
        .map(|value| {
            Experiment::new(
                format!("{} {}", parameter, value.to_string()),
                HierarchyConfig::single(make(value), SWEEP_MEMORY_LATENCY),
            )
        })
        .collect();

    values
        .iter()
        .zip(run_all(&experiments, trace))
        .filter_map(|(value, result)| match result {
            Ok(report) => Some(SweepRow {
                value: value.to_string(),
                hit_ratio: report.l1_hit_ratio(),
                amat: report.amat(),
            }),
            Err(e) => {
                log::warn!("skipping {} = {}: {}", parameter, value.to_string(), e);
                None
            }
        })
        .collect()
}

pub fn sweep_associativity(
    cache_size: u64,
    block_size: u64,
    associativities: &[u64],
    trace: &[AccessRecord],
) -> Vec<SweepRow> {
    sweep(
        "associativity",
        associativities,
        |assoc| CacheConfig::make("L1", cache_size, block_size, *assoc, 1),
        trace,
    )
}

pub fn sweep_block_sizes(
    cache_size: u64,
    associativity: u64,
    block_sizes: &[u64],
    trace: &[AccessRecord],
) -> Vec<SweepRow> {
    sweep(
        "block_size",
        block_sizes,
        |block| CacheConfig::make("L1", cache_size, *block, associativity, 1),
        trace,
    )
}

pub fn sweep_cache_sizes(
    block_size: u64,
    associativity: u64,
    cache_sizes: &[u64],
    trace: &[AccessRecord],
) -> Vec<SweepRow> {
    sweep(
        "cache_size",
        cache_sizes,
        |size| CacheConfig::make("L1", *size, block_size, associativity, 1),
        trace,
    )
}

/// Run the base configuration once per replacement policy
pub fn compare_policies(base: &CacheConfig, trace: &[AccessRecord]) -> Vec<SweepRow> {
    let policies: Vec<PolicyKind> = PolicyKind::iter().collect();
    sweep(
        "policy",
        &policies,
        |policy| base.clone().with_policy(*policy),
        trace,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::init_logging;
    use crate::trace;

    fn synthetic() -> Vec<AccessRecord> {
        trace::synthetic(42).collect()
    }

    #[test]
    fn test_run_all_keeps_order_and_isolates_failures() {
        init_logging();
        let experiments = vec![
            Experiment::new("ok", HierarchyConfig::default()),
            Experiment::new(
                "bad",
                HierarchyConfig::single(CacheConfig::make("L1", 1000, 32, 1, 1), 100),
            ),
            Experiment::new(
                "direct",
                HierarchyConfig::single(CacheConfig::default(), 100),
            ),
        ];
        let results = run_all(&experiments, &synthetic());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().config_name, "ok");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().config_name, "direct");
    }

    #[test]
    fn test_parallel_runs_match_sequential() {
        init_logging();
        let trace = synthetic();
        let experiments: Vec<_> = (0..8)
            .map(|i| {
                let level = CacheConfig::make("L1", 1024, 32, 4, 1)
                    .with_policy(PolicyKind::Random)
                    .with_seed(i);
                Experiment::new(format!("seed {i}"), HierarchyConfig::single(level, 100))
            })
            .collect();
        let parallel = run_all(&experiments, &trace);
        for (experiment, result) in experiments.iter().zip(parallel) {
            let sequential =
                run_simulation(&experiment.name, &experiment.hierarchy, trace.iter().copied())
                    .unwrap();
            assert_eq!(result.unwrap().stats, sequential.stats);
        }
    }

    #[test]
    fn test_sweeps() {
        init_logging();
        let trace = synthetic();
        let rows = sweep_associativity(2048, 64, &[1, 2, 4, 8, 16], &trace);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].value, "1");
        for row in &rows {
            assert!(row.hit_ratio > 0.0 && row.hit_ratio < 1.0);
            assert!((row.amat - (1.0 + (1.0 - row.hit_ratio) * 100.0)).abs() < 1e-9);
        }

        // 48-byte blocks are rejected and skipped
        let rows = sweep_block_sizes(1024, 2, &[8, 16, 48, 64], &trace);
        let values: Vec<_> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["8", "16", "64"]);

        let rows = sweep_cache_sizes(32, 2, &[256, 1024, 4096], &trace);
        assert_eq!(rows.len(), 3);

        let base = CacheConfig::make("L1", 1024, 32, 4, 1).with_seed(42);
        let rows = compare_policies(&base, &trace);
        let values: Vec<_> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["LRU", "FIFO", "Random", "LFU"]);
    }
}
