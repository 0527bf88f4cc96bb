use std::process;

use clap::Parser;
use sim_lib::config::{Experiment, ExperimentFile};
use sim_lib::error::SimulatorResult;
use sim_lib::flags::{init_logger, SimArgs};
use sim_lib::memory::CacheHierarchy;
use sim_lib::report::{self, ComparisonRow};
use sim_lib::run_wrapper::{run_records, run_trace, RunReport};
use sim_lib::trace::{self, TraceReader};

fn main() {
    let args = SimArgs::parse();
    init_logger(args.verbose);

    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_experiment(
    experiment: &Experiment,
    file: &ExperimentFile,
) -> SimulatorResult<RunReport> {
    let mut mem = CacheHierarchy::make(&experiment.hierarchy)?;
    match &file.trace {
        // Re-read the file for every configuration
        Some(path) => run_trace(&experiment.name, &mut mem, TraceReader::open(path)?),
        None => run_records(&experiment.name, &mut mem, trace::synthetic(file.trace_seed)),
    }
}

/// Returns whether every configuration completed
fn run(args: &SimArgs) -> SimulatorResult<bool> {
    let file = args.experiments()?;
    let mut rows = Vec::new();
    let mut all_ok = true;

    for experiment in &file.experiments {
        match run_experiment(experiment, &file) {
            Ok(run_report) => {
                println!("{}", report::summary_text(&run_report));
                rows.push(ComparisonRow::from(&run_report));
            }
            Err(e) => {
                eprintln!("Warning: configuration '{}' failed: {}", experiment.name, e);
                all_ok = false;
            }
        }
    }

    if let Some(path) = &args.csv {
        report::write_rows(std::fs::File::create(path)?, &rows)?;
        log::info!("exported {} rows to {}", rows.len(), path.display());
    }
    Ok(all_ok)
}
