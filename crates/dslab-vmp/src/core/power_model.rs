//! Physical host power consumption models.

use dyn_clone::{clone_trait_object, DynClone};

/// Power model is a function, which computes the power consumption of a physical host
/// based on its maximum power and current CPU utilization.
pub trait PowerModel: DynClone + Send {
    /// Returns the current power consumption of a physical host.
    ///
    /// - `power_max` - host power when CPU is fully loaded.
    /// - `cpu_load` - current host CPU utilization in `[0, 1]`.
    fn get_power(&self, power_max: f64, cpu_load: f64) -> f64;
}

clone_trait_object!(PowerModel);

/// Share of the maximum power consumed by a running idle host.
pub const MIN_POWER_PERCENTAGE: f64 = 0.6;

/// Simple linear power model.
///
/// Computes host power consumption as `idle + cpu_load * (power_max - idle)`,
/// where `idle = power_max * idle_share`.
#[derive(Clone)]
pub struct LinearPowerModel {
    idle_share: f64,
}

impl LinearPowerModel {
    /// Default constructor, idle host consumes 60% of maximum power.
    pub fn new() -> Self {
        Self {
            idle_share: MIN_POWER_PERCENTAGE,
        }
    }

    pub fn new_with_idle_share(idle_share: f64) -> Self {
        Self { idle_share }
    }
}

impl Default for LinearPowerModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerModel for LinearPowerModel {
    fn get_power(&self, power_max: f64, cpu_load: f64) -> f64 {
        let idle_power = power_max * self.idle_share;
        idle_power + cpu_load * (power_max - idle_power)
    }
}
