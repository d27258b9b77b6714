//! Command handlers, one module per command group

pub mod apptainer;
pub mod config;
