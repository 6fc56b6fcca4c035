// aquiss-usage library crate
// Exposes modules for integration testing

pub mod alerts;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod output;
pub mod storage;
pub mod usage;
pub mod utils;
