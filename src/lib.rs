pub mod cli;
pub mod config;
pub mod engine;
pub mod job;
pub mod orchestrator;
pub mod policy;
pub mod report;
pub mod util;
