//! Forecast-driven reconfiguration.
//!
//! The optimizer is launched when the forecast of the online score trends upwards. Arrivals
//! during an optimization either cancel it or are replayed onto its result.

use crate::core::forecast::call_to_reconfiguration;
use crate::error::VmpError;
use crate::log_debug;
use crate::orchestrator::{Orchestrator, OrchestratorState, RecoveringMethod};

impl Orchestrator {
    pub(super) fn clever_step(&mut self, actual: u32, next: Option<u32>, has_admissions: bool) -> Result<(), VmpError> {
        match self.state {
            OrchestratorState::Serving => {
                let Some(next) = next else {
                    return Ok(());
                };
                let history = self.ctx.config().historical_data_size;
                if self.results.series.len() <= history || next < self.trigger_time || self.live.vms.is_empty() {
                    return Ok(());
                }
                let series = self.score_window(actual, next, history);
                if call_to_reconfiguration(&series, self.ctx.config().forecast_size) {
                    self.reconfiguration_end = actual + self.ctx.config().execution_duration;
                    self.migration_start = self.reconfiguration_end + 1;
                    self.launch_reconfiguration(actual);
                } else {
                    log_debug!(self.ctx, "score forecast is not increasing");
                }
            }
            OrchestratorState::Reconfiguring => {
                if self.ctx.config().recovering_method == RecoveringMethod::Cancellation
                    && has_admissions
                    && actual > self.snapshot_time
                    && actual < self.reconfiguration_end
                {
                    self.cancel_reconfiguration();
                    self.trigger_time = actual + self.ctx.config().execution_interval;
                    return Ok(());
                }
                if next.map_or(true, |next| next >= self.migration_start) {
                    self.begin_migration(actual)?;
                }
            }
            OrchestratorState::Migrating => {
                if actual >= self.migration_end {
                    self.finish_migration(actual);
                }
            }
        }
        Ok(())
    }
}
