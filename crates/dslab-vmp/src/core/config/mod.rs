pub mod exp_config;
pub mod options;
pub mod sim_config;
