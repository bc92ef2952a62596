//! Multi-resource quantities.

use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Number of resource dimensions (CPU, RAM, network).
pub const RESOURCES: usize = 3;

/// Index of CPU dimension.
pub const CPU: usize = 0;
/// Index of RAM dimension.
pub const RAM: usize = 1;
/// Index of network dimension.
pub const NET: usize = 2;

/// A (cpu, ram, net) triple.
///
/// Used for host capacity, workload demand, utilization percentages and per-unit revenue rates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu: f64,
    pub ram: f64,
    pub net: f64,
}

/// Price per unit of each resource.
pub type Revenue = Resources;

impl Resources {
    pub fn new(cpu: f64, ram: f64, net: f64) -> Self {
        Self { cpu, ram, net }
    }

    /// Same value in every dimension.
    pub fn splat(value: f64) -> Self {
        Self::new(value, value, value)
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_array(values: [f64; RESOURCES]) -> Self {
        Self::new(values[CPU], values[RAM], values[NET])
    }

    pub fn to_array(self) -> [f64; RESOURCES] {
        [self.cpu, self.ram, self.net]
    }

    /// Sum over all dimensions.
    pub fn total(&self) -> f64 {
        self.cpu + self.ram + self.net
    }

    /// Dot product, e.g. demand priced by revenue rates.
    pub fn dot(&self, other: &Resources) -> f64 {
        self.cpu * other.cpu + self.ram * other.ram + self.net * other.net
    }

    /// Component-wise product.
    pub fn scale(&self, other: &Resources) -> Resources {
        Resources::new(self.cpu * other.cpu, self.ram * other.ram, self.net * other.net)
    }

    /// Applies `f` to every dimension.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Resources {
        Resources::new(f(self.cpu), f(self.ram), f(self.net))
    }

    pub fn any<F: Fn(f64) -> bool>(&self, f: F) -> bool {
        f(self.cpu) || f(self.ram) || f(self.net)
    }

    pub fn all<F: Fn(f64) -> bool>(&self, f: F) -> bool {
        f(self.cpu) && f(self.ram) && f(self.net)
    }
}

impl Index<usize> for Resources {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        match index {
            CPU => &self.cpu,
            RAM => &self.ram,
            NET => &self.net,
            _ => panic!("resource index out of range: {}", index),
        }
    }
}

impl IndexMut<usize> for Resources {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        match index {
            CPU => &mut self.cpu,
            RAM => &mut self.ram,
            NET => &mut self.net,
            _ => panic!("resource index out of range: {}", index),
        }
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        Resources::new(self.cpu + rhs.cpu, self.ram + rhs.ram, self.net + rhs.net)
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Resources) {
        *self = *self + rhs;
    }
}

impl Sub for Resources {
    type Output = Resources;

    fn sub(self, rhs: Resources) -> Resources {
        Resources::new(self.cpu - rhs.cpu, self.ram - rhs.ram, self.net - rhs.net)
    }
}

impl SubAssign for Resources {
    fn sub_assign(&mut self, rhs: Resources) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Resources {
    type Output = Resources;

    fn mul(self, rhs: f64) -> Resources {
        self.map(|v| v * rhs)
    }
}

impl Display for Resources {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.cpu, self.ram, self.net)
    }
}
