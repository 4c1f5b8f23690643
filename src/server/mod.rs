//! Server assembly: configuration and background jobs.

pub mod config;
pub mod jobs;
