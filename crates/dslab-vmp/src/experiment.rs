//! Tools for running experiments with multiple scenario runs.

use std::sync::{Arc, Mutex};

use log::{error, info};
use serde::Serialize;
use threadpool::ThreadPool;

use crate::core::config::exp_config::ExperimentConfig;
use crate::core::config::sim_config::SimulationConfig;
use crate::core::physical_machine::PhysicalMachine;
use crate::error::VmpError;
use crate::extensions::host_config_reader::read_hosts;
use crate::extensions::output::OutputWriter;
use crate::extensions::trace_reader::read_trace;
use crate::orchestrator::results::RunResults;
use crate::orchestrator::Orchestrator;

/// Entry of the experiment summary.
#[derive(Serialize, Clone, Debug)]
pub struct RunSummary {
    pub id: usize,
    pub scenario: String,
    pub config: SimulationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<RunResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Implements execution of experiment.
pub struct Experiment {
    pub config: ExperimentConfig,
    /// Overrides the output directory of the config.
    pub output_dir: Option<String>,
}

impl Experiment {
    pub fn new(config: ExperimentConfig, output_dir: Option<String>) -> Self {
        Self { config, output_dir }
    }

    /// Runs every scenario using the specified number of threads.
    ///
    /// Each run owns its simulation context, so runs are independent. A failed run is reported
    /// in the summary and does not stop the others.
    pub fn run(&mut self, num_threads: usize) -> Result<Vec<RunSummary>, VmpError> {
        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| self.config.config.output_dir.clone());
        let writer = OutputWriter::new(&output_dir)?;
        let hosts = read_hosts(self.config.config.pm_config_path())?;
        info!("loaded {} hosts from {}", hosts.len(), self.config.config.pm_config_path());

        let summaries = Arc::new(Mutex::new(Vec::new()));
        let pool = ThreadPool::new(num_threads.max(1));
        let mut run_id: usize = 1;

        while let Some((scenario, run_config)) = self.config.get() {
            let trace_path = self.config.scenario_path(&scenario);
            let hosts = hosts.clone();
            let summaries = summaries.clone();

            pool.execute(move || {
                info!("RUN {}: {}", run_id, scenario);
                let outcome = run_scenario(&scenario, run_config.clone(), hosts, &trace_path);
                let summary = match outcome {
                    Ok(results) => RunSummary {
                        id: run_id,
                        scenario,
                        config: run_config,
                        results: Some(results),
                        error: None,
                    },
                    Err(e) => {
                        error!("run {} ({}) failed: {}", run_id, scenario, e);
                        RunSummary {
                            id: run_id,
                            scenario,
                            config: run_config,
                            results: None,
                            error: Some(e.to_string()),
                        }
                    }
                };
                if let Ok(mut summaries) = summaries.lock() {
                    summaries.push(summary);
                }
            });

            run_id += 1;
        }

        pool.join();
        let mut summaries = match summaries.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        summaries.sort_by_key(|s| s.id);

        for summary in summaries.iter() {
            if let Some(results) = &summary.results {
                writer.write_run(results)?;
                writer.append_aggregates(results)?;
            }
        }
        writer.write_summary(&summaries)?;
        info!("results saved to {}", writer.dir().display());
        Ok(summaries)
    }
}

/// Runs one scenario trace over the hosts.
pub fn run_scenario(
    name: &str,
    config: SimulationConfig,
    hosts: Vec<PhysicalMachine>,
    trace_path: &str,
) -> Result<RunResults, VmpError> {
    let requests = read_trace(trace_path)?;
    Orchestrator::new(name, config, hosts).run(requests)
}
