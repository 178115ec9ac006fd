//! Statistics for producer sessions and the relay as a whole

pub mod metrics;

pub use metrics::{ProducerStats, RelayStats};
