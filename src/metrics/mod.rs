// Metrics module
// Routing counters and the optional JSONL decision log

mod logger;
mod stats;
mod types;

pub use logger::{DecisionLogger, DecisionSummary};
pub use stats::{RouterStats, StatsSnapshot};
pub use types::RoutingMetric;
