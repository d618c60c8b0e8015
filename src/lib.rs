pub mod config;
pub mod demo;
pub mod scheduling;
pub mod store;

pub use config::{ConfigError, SchedulerConfig};
pub use store::{SqliteStore, StoreError};
