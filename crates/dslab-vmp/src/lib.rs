#![doc = include_str!("../readme.md")]

pub mod core;
pub mod error;
pub mod experiment;
pub mod extensions;
pub mod log;
pub mod orchestrator;
pub mod reconfiguration;

pub use crate::core::context::SimulationContext;
pub use crate::error::{VmpError, VmpResult};
