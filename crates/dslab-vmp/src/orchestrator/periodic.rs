//! Optimizer launched at a fixed interval.

use crate::error::VmpError;
use crate::log_debug;
use crate::orchestrator::{Orchestrator, OrchestratorState};

impl Orchestrator {
    pub(super) fn periodic_step(&mut self, actual: u32, next: Option<u32>) -> Result<(), VmpError> {
        match self.state {
            OrchestratorState::Serving => {
                if let Some(next) = next {
                    if next >= self.trigger_time {
                        if self.live.vms.is_empty() {
                            log_debug!(self.ctx, "nothing to reconfigure, trigger postponed");
                            self.advance_trigger(next);
                        } else {
                            self.schedule_reconfiguration(actual);
                        }
                    }
                }
            }
            OrchestratorState::Reconfiguring => {
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

    /// Launches the optimizer and plans when its result is collected and when it fires next.
    pub(super) fn schedule_reconfiguration(&mut self, actual: u32) {
        let config = self.ctx.config();
        let (interval, duration) = (config.execution_interval, config.execution_duration);
        let start = self.trigger_time.max(actual);
        self.reconfiguration_end = start + duration;
        self.migration_start = self.reconfiguration_end + 1;
        self.trigger_time = self.reconfiguration_end + interval;
        self.advance_trigger(actual);
        self.launch_reconfiguration(actual);
    }

    /// Moves the trigger forward by whole intervals until it is after `time`.
    pub(super) fn advance_trigger(&mut self, time: u32) {
        let interval = self.ctx.config().execution_interval.max(1);
        while self.trigger_time <= time {
            self.trigger_time += interval;
        }
    }
}
