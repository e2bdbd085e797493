// Metrics data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::router::{FallbackReason, Route, RoutingDecision, RoutingMethod};

/// One routed query, as written to the decision log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingMetric {
    pub timestamp: DateTime<Utc>,
    pub query_hash: String,
    pub route: Route,
    pub method: RoutingMethod,
    pub score: Option<f32>,
    pub fallback: Option<FallbackReason>,
    pub latency_us: u64,
}

impl RoutingMetric {
    pub fn new(query_hash: String, decision: &RoutingDecision, latency_us: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            query_hash,
            route: decision.route,
            method: decision.method,
            score: decision.score,
            fallback: decision.fallback,
            latency_us,
        }
    }
}
