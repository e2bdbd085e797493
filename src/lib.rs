// intent-router - query routing for a retail chat assistant
// Library exports

pub mod assistant;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod router;

pub use errors::{RouterError, RouterResult};
pub use router::{IntentRouter, Route, RoutingDecision};
