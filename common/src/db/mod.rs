// Database layer: read-only access to the scheduler's Quartz job store

pub mod pool;
pub mod repositories;

pub use pool::DbPool;
