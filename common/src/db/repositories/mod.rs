// Repository layer for job store reads

pub mod quartz;

pub use quartz::{QuartzRepository, QuartzTables};
