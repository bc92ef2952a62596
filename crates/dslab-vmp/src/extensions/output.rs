//! Writers of run outputs.
//!
//! Per-run files are named after the scenario, aggregate files collect one line per run and are
//! only appended to.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::VmpError;
use crate::orchestrator::results::RunResults;

pub const POWER_FILE: &str = "power.txt";
pub const REVENUE_FILE: &str = "revenue.txt";
pub const WASTED_FILE: &str = "wasted.txt";
pub const SCENARIO_SCORE_FILE: &str = "scenario_score.txt";
pub const RECONFIGURATION_CALLS_FILE: &str = "reconfiguration_calls.txt";
pub const PENALTIES_FILE: &str = "economical_penalties.txt";
pub const LEASING_COSTS_FILE: &str = "leasing_costs.txt";

/// Writes outputs of runs into one directory.
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, VmpError> {
        create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the score trajectory (one score per line) and the metric CSV of the run.
    pub fn write_run(&self, results: &RunResults) -> Result<(), VmpError> {
        let stem = scenario_stem(&results.scenario);

        let mut scores = BufWriter::new(File::create(self.dir.join(format!("{}_scores.txt", stem)))?);
        for score in results.scores.iter() {
            writeln!(scores, "{}", score)?;
        }
        scores.flush()?;

        let mut metrics = csv::Writer::from_path(self.dir.join(format!("{}_metrics.csv", stem)))?;
        for m in results.series.iter() {
            metrics.serialize(m)?;
        }
        metrics.flush()?;
        Ok(())
    }

    /// Appends the aggregates of the run to the aggregate files.
    pub fn append_aggregates(&self, results: &RunResults) -> Result<(), VmpError> {
        let calls = results
            .reconfiguration_calls
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.append(POWER_FILE, &results.scenario, &results.avg_power.to_string())?;
        self.append(REVENUE_FILE, &results.scenario, &results.avg_revenue.to_string())?;
        self.append(WASTED_FILE, &results.scenario, &results.avg_wasted.to_string())?;
        self.append(SCENARIO_SCORE_FILE, &results.scenario, &results.scenario_score.to_string())?;
        self.append(RECONFIGURATION_CALLS_FILE, &results.scenario, &calls)?;
        self.append(PENALTIES_FILE, &results.scenario, &results.economical_penalties.to_string())?;
        self.append(LEASING_COSTS_FILE, &results.scenario, &results.leasing_costs.to_string())?;
        Ok(())
    }

    /// Writes the summary of all runs as JSON.
    pub fn write_summary<T: serde::Serialize>(&self, summary: &T) -> Result<(), VmpError> {
        let mut file = File::create(self.dir.join("results.json"))?;
        serde_json::to_writer_pretty(&mut file, summary)?;
        Ok(())
    }

    fn append(&self, file_name: &str, scenario: &str, value: &str) -> Result<(), VmpError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file_name))?;
        writeln!(file, "{}\t{}", scenario, value)?;
        Ok(())
    }
}

/// File name of the scenario without directories and extension.
fn scenario_stem(scenario: &str) -> String {
    Path::new(scenario)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| scenario.to_string())
}
