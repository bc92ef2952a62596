//! Readers of input files and writers of run outputs.

pub mod host_config_reader;
pub mod output;
pub mod trace_reader;
