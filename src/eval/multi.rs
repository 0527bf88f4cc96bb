use std::fs::File;
use std::path::{Path, PathBuf};

use sim_lib::config::Experiment;
use sim_lib::memory::{CacheConfig, HierarchyConfig};
use sim_lib::report::{self, ComparisonRow, SweepRow};
use sim_lib::sweep;
use sim_lib::trace::{self, AccessRecord};

fn write_sweep(
    dir: &Path,
    name: &str,
    parameter: &str,
    rows: &[SweepRow],
) -> Result<(), Box<dyn std::error::Error>> {
    let path = dir.join(name);
    report::write_sweep(File::create(&path)?, parameter, rows)?;
    eprintln!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    sim_lib::flags::init_logger(1);

    // Optional trace file, synthetic trace otherwise
    let param_tokens: Vec<String> = std::env::args().collect();
    let trace: Vec<AccessRecord> = match param_tokens.get(1) {
        Some(trace_path) => trace::fetch_operations(trace_path)?,
        None => trace::synthetic(42).collect(),
    };
    let output_dir = PathBuf::from("eval");
    std::fs::create_dir_all(&output_dir)?;
    eprintln!("Loaded memory trace with {} accesses", trace.len());

    // Compare levels, associativity and block sizes
    let single = |level: CacheConfig| HierarchyConfig::single(level, 100);
    let experiments = vec![
        Experiment::new(
            "1-Level Direct-Mapped",
            single(CacheConfig::make("L1 (Direct)", 1024, 32, 1, 1)),
        ),
        Experiment::new(
            "1-Level 4-Way (LRU)",
            single(CacheConfig::make("L1 (4-way)", 1024, 32, 4, 1)),
        ),
        Experiment::new("2-Level (L1+L2)", HierarchyConfig::default()),
        Experiment::new(
            "1-Level 16B Blocks",
            single(CacheConfig::make("L1 (16B blocks)", 1024, 16, 2, 1)),
        ),
        Experiment::new(
            "1-Level 64B Blocks",
            single(CacheConfig::make("L1 (64B blocks)", 1024, 64, 2, 1)),
        ),
    ];

    let mut rows = Vec::new();
    for (experiment, result) in experiments.iter().zip(sweep::run_all(&experiments, &trace)) {
        match result {
            Ok(run_report) => {
                println!("{}", report::summary_text(&run_report));
                rows.push(ComparisonRow::from(&run_report));
            }
            Err(e) => eprintln!("Warning: Failed to run '{}': {}", experiment.name, e),
        }
    }
    let comparison_path = output_dir.join("simulation_comparison.csv");
    report::write_rows(File::create(&comparison_path)?, &rows)?;
    eprintln!("Exported {} rows to {}", rows.len(), comparison_path.display());

    write_sweep(
        &output_dir,
        "associativity_analysis.csv",
        "associativity",
        &sweep::sweep_associativity(2048, 64, &[1, 2, 4, 8, 16], &trace),
    )?;
    write_sweep(
        &output_dir,
        "blocksize_analysis.csv",
        "block_size",
        &sweep::sweep_block_sizes(1024, 2, &[8, 16, 32, 64, 128], &trace),
    )?;
    write_sweep(
        &output_dir,
        "cachesize_analysis.csv",
        "cache_size",
        &sweep::sweep_cache_sizes(32, 2, &[256, 512, 1024, 2048, 4096, 8192], &trace),
    )?;
    let base = CacheConfig::make("L1", 1024, 32, 4, 1).with_seed(42);
    write_sweep(
        &output_dir,
        "policy_comparison.csv",
        "policy",
        &sweep::compare_policies(&base, &trace),
    )?;

    Ok(())
}
