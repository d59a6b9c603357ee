// Shared library for the job info service: scheduler metadata models,
// sources and the job trigger query

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod job_info;
pub mod models;
pub mod schedule;
pub mod source;
pub mod telemetry;
