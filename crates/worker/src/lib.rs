//! Runtime pieces of the catalog worker: environment configuration and the
//! periodic background jobs.

pub mod background;
pub mod config;

pub use config::{ConfigError, WorkerConfig};
