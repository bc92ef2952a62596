pub mod config;
pub mod constraints;
pub mod context;
pub mod forecast;
pub mod objectives;
pub mod physical_machine;
pub mod placement;
pub mod placement_algorithm;
pub mod placement_algorithms;
pub mod power_model;
pub mod request;
pub mod resources;
pub mod scalarization;
pub mod violation;
pub mod virtual_machine;
