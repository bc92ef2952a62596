//! Periodic optimizer whose result replaces the live placement right away when it is better.
//!
//! A launch is skipped when a new VM is known to arrive while the optimizer would run.

use crate::core::objectives::vms_to_migrate;
use crate::core::placement::Placement;
use crate::core::request::new_vm_arrives;
use crate::error::VmpError;
use crate::orchestrator::{merge_if_better, Orchestrator, OrchestratorState};
use crate::{log_debug, log_info};

impl Orchestrator {
    pub(super) fn state_of_art_step(&mut self, actual: u32, next: Option<u32>) -> Result<(), VmpError> {
        match self.state {
            OrchestratorState::Serving => {
                if let Some(next) = next {
                    if next >= self.trigger_time {
                        let window_end = actual + self.ctx.config().execution_duration + 1;
                        if self.live.vms.is_empty() {
                            self.advance_trigger(next);
                        } else if new_vm_arrives(&self.requests, actual, window_end) {
                            log_debug!(self.ctx, "arrivals expected before {}, launch skipped", window_end);
                            self.advance_trigger(next);
                        } else {
                            self.schedule_reconfiguration(actual);
                        }
                    }
                }
            }
            OrchestratorState::Reconfiguring => {
                if next.map_or(true, |next| next > self.reconfiguration_end) {
                    self.adopt_if_better(actual)?;
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

    /// Collects the optimizer result and switches to it immediately if it beats the live placement.
    /// VMs whose host changed are then migrated.
    fn adopt_if_better(&mut self, actual: u32) -> Result<(), VmpError> {
        self.state = OrchestratorState::Serving;
        let Some(result) = self.worker.await_result()? else {
            return Ok(());
        };
        self.snapshot = None;
        let mut candidate = self.catch_up(result, actual);
        self.rescore(&mut candidate, actual);
        let mut live = std::mem::replace(&mut self.live, Placement::new(Vec::new()));
        self.rescore(&mut live, actual);
        let previous = live.vms.clone();
        let adopted = merge_if_better(&mut live, candidate);
        self.live = live;
        if adopted {
            self.results.merges += 1;
            let to_migrate = vms_to_migrate(&previous, &self.live.vms);
            log_info!(self.ctx, "reconfiguration adopted, {} VMs to migrate", to_migrate.len());
            self.schedule_migrations(&to_migrate, actual);
            if self.migration_end <= actual {
                self.finish_migration(actual);
            }
        } else {
            log_info!(self.ctx, "reconfiguration discarded");
        }
        Ok(())
    }
}
