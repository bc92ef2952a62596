//! Physical host state.

use serde::Serialize;

use crate::core::resources::{Resources, RESOURCES};

/// Requested amount below this value is treated as zero (host is idle).
pub const LOAD_EPSILON: f64 = 0.0001;

/// Physical host with fixed capacity.
///
/// `requested` holds the sum of realized demand of hosted VMs and `utilization` is always
/// `requested / capacity`. Both are private and change only together through [`apply`](Self::apply)
/// and [`release`](Self::release).
#[derive(Clone, Debug, Serialize)]
pub struct PhysicalMachine {
    pub id: u32,
    pub power_max: f64,
    pub capacity: Resources,
    requested: Resources,
    utilization: Resources,
}

impl PhysicalMachine {
    /// Creates idle host.
    pub fn new(id: u32, capacity: Resources, power_max: f64) -> Self {
        Self {
            id,
            power_max,
            capacity,
            requested: Resources::zero(),
            utilization: Resources::zero(),
        }
    }

    pub fn requested(&self) -> Resources {
        self.requested
    }

    pub fn utilization(&self) -> Resources {
        self.utilization
    }

    /// Adds demand to the host.
    pub fn apply(&mut self, amount: &Resources) {
        self.set_requested(self.requested + *amount);
    }

    /// Removes demand from the host, never going below zero.
    pub fn release(&mut self, amount: &Resources) {
        self.set_requested((self.requested - *amount).map(|v| v.max(0.)));
    }

    /// Drops all demand.
    pub fn reset(&mut self) {
        self.set_requested(Resources::zero());
    }

    fn set_requested(&mut self, requested: Resources) {
        self.requested = requested;
        for i in 0..RESOURCES {
            self.utilization[i] = if self.capacity[i] > 0. {
                self.requested[i] / self.capacity[i]
            } else {
                0.
            };
        }
    }

    /// Free capacity share summed over resources, used to order hosts by fullness.
    pub fn weight(&self) -> f64 {
        self.utilization.map(|u| 1. - u).total()
    }

    /// Whether the host runs any load.
    pub fn is_working(&self) -> bool {
        self.requested.any(|v| v > LOAD_EPSILON)
    }
}
