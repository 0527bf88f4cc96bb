//! CSV export and text summaries of finished runs

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::error::SimulatorResult;
use crate::run_wrapper::RunReport;

/// One row per simulated configuration
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub config_name: String,
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
    pub amat: f64,
    pub total_access_time: f64,
    pub l1_hit_ratio: f64,
    pub wallclock_seconds: f64,
}

impl From<&RunReport> for ComparisonRow {
    fn from(report: &RunReport) -> Self {
        let misses = report.stats.memory_accesses();
        Self {
            config_name: report.config_name.clone(),
            hits: report.accesses() - misses,
            misses,
            hit_ratio: report.stats.hit_ratio(),
            amat: report.amat(),
            total_access_time: report.total_access_time(),
            l1_hit_ratio: report.l1_hit_ratio(),
            wallclock_seconds: report.wallclock_seconds,
        }
    }
}

/// One point of a parameter sweep
#[derive(Clone, Debug, PartialEq)]
pub struct SweepRow {
    pub value: String,
    pub hit_ratio: f64,
    pub amat: f64,
}

/// Serialize rows with a header derived from their field names
pub fn write_rows<T: Serialize>(writer: impl Write, rows: &[T]) -> SimulatorResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write sweep rows, naming the first column after the swept parameter
pub fn write_sweep(
    writer: impl Write,
    parameter: &str,
    rows: &[SweepRow],
) -> SimulatorResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([parameter, "hit_ratio", "amat"])?;
    for row in rows {
        writer.write_record([
            row.value.as_str(),
            &row.hit_ratio.to_string(),
            &row.amat.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

impl fmt::Display for RunReport {
    /// Human-readable statistics of a run, one block per level
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation: {} ---", self.config_name)?;
        for level in &self.stats.levels {
            writeln!(f, "[{}]", level.name)?;
            writeln!(f, "  accesses:   {}", level.accesses())?;
            writeln!(f, "  hits:       {}", level.hits)?;
            writeln!(f, "  misses:     {}", level.misses)?;
            writeln!(f, "  reads:      {}", level.reads)?;
            writeln!(f, "  writes:     {}", level.writes)?;
            writeln!(f, "  hit ratio:  {:.2}%", level.hit_ratio() * 100.0)?;
            writeln!(f, "  miss ratio: {:.2}%", level.miss_ratio() * 100.0)?;
        }
        writeln!(f, "[Overall hierarchy]")?;
        writeln!(f, "  hit ratio:         {:.2}%", self.stats.hit_ratio() * 100.0)?;
        writeln!(f, "  AMAT:              {:.4} time units", self.amat())?;
        writeln!(f, "  total access time: {:.0} time units", self.total_access_time())?;
        writeln!(f, "  wall-clock time:   {:.4} s", self.wallclock_seconds)
    }
}

pub fn summary_text(report: &RunReport) -> String {
    report.to_string()
}
