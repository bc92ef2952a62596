//! Threshold-based consolidation without the optimizer.
//!
//! VMs leave hosts whose realized utilization is above the overload threshold until the host
//! drops under it, and underloaded hosts are evacuated completely.

use std::cmp::Ordering;

use crate::core::constraints::{is_pm_overloaded, is_pm_underloaded};
use crate::core::resources::RAM;
use crate::core::virtual_machine::VirtualMachine;
use crate::log_debug;
use crate::orchestrator::{Orchestrator, OrchestratorState};

impl Orchestrator {
    pub(super) fn threshold_step(&mut self, actual: u32) {
        if self.state == OrchestratorState::Migrating {
            if actual >= self.migration_end {
                self.finish_migration(actual);
            }
            return;
        }

        let (overload, underload) = (self.ctx.config().overload_threshold, self.ctx.config().underload_threshold);
        let mut picked: Vec<usize> = Vec::new();
        let mut evacuated: Vec<u32> = Vec::new();
        for host in self.live.hosts.iter() {
            let mut hosted: Vec<usize> = (0..self.live.vms.len())
                .filter(|&i| self.live.vms[i].host_id == host.id)
                .collect();
            if hosted.is_empty() {
                continue;
            }
            if is_pm_overloaded(host, overload) {
                hosted.sort_by(|&a, &b| {
                    let (a, b) = (&self.live.vms[a], &self.live.vms[b]);
                    b.resources[RAM].partial_cmp(&a.resources[RAM]).unwrap_or(Ordering::Equal)
                });
                let mut simulated = host.clone();
                for i in hosted {
                    if !is_pm_overloaded(&simulated, overload) {
                        break;
                    }
                    simulated.release(&self.live.vms[i].load());
                    picked.push(i);
                }
            } else if is_pm_underloaded(host, underload) {
                picked.extend(hosted);
                evacuated.push(host.id);
            }
        }
        if picked.is_empty() {
            return;
        }

        picked.sort_by(|&a, &b| {
            let (a, b) = (&self.live.vms[a], &self.live.vms[b]);
            b.total_revenue().partial_cmp(&a.total_revenue()).unwrap_or(Ordering::Equal)
        });
        let mut moved: Vec<VirtualMachine> = Vec::new();
        for i in picked {
            let source = self.live.vms[i].host_id;
            let target = self
                .live
                .hosts
                .iter()
                .find(|h| {
                    h.id != source
                        && !evacuated.contains(&h.id)
                        && self
                            .ctx
                            .constraints()
                            .fits(h, None, &self.live.vms[i], &self.live.vms, true)
                })
                .map(|h| h.id);
            if let Some(target) = target {
                self.live.move_vm(i, target);
                moved.push(self.live.vms[i].clone());
                log_debug!(self.ctx, "{} moves from host {} to host {}", self.live.vms[i].key(), source, target);
            }
        }
        if moved.is_empty() {
            return;
        }
        self.schedule_migrations(&moved, actual);
        if self.migration_end <= actual {
            self.finish_migration(actual);
        }
    }
}
