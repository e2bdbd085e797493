// Routing decision types
//
// `Route` says where a query goes. `RoutingDecision` says why it went there.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Handler category a query can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Faq,
    ProductSearch,
    SmallTalk,
}

impl Route {
    /// Every route, in tie-break priority order.
    ///
    /// Misrouting a product query to small talk costs more than the reverse,
    /// so product search wins ties in both classifiers.
    pub const PRIORITY: [Route; 3] = [Route::ProductSearch, Route::Faq, Route::SmallTalk];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Faq => "faq",
            Route::ProductSearch => "product_search",
            Route::SmallTalk => "small_talk",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "faq" => Ok(Route::Faq),
            // "sql" is what the chat front end historically called product search
            "product_search" | "product-search" | "sql" => Ok(Route::ProductSearch),
            "small_talk" | "small-talk" => Ok(Route::SmallTalk),
            other => Err(format!("unknown route '{}'", other)),
        }
    }
}

/// Which classifier produced the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMethod {
    /// Embedding similarity cleared the threshold
    Semantic,
    /// At least one keyword matched
    Keyword,
    /// No signal at all; the keyword classifier's default heuristics decided
    Default,
}

impl RoutingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMethod::Semantic => "semantic",
            RoutingMethod::Keyword => "keyword",
            RoutingMethod::Default => "default",
        }
    }
}

/// Why the semantic layer did not decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    LowConfidence,
    EncodingError,
    Timeout,
    BackendFailure,
    Degraded,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::LowConfidence => "low_confidence",
            FallbackReason::EncodingError => "encoding_error",
            FallbackReason::Timeout => "timeout",
            FallbackReason::BackendFailure => "backend_failure",
            FallbackReason::Degraded => "degraded",
        }
    }

    /// Whether this fallback was caused by an error rather than a weak match.
    pub fn is_error(&self) -> bool {
        !matches!(self, FallbackReason::LowConfidence | FallbackReason::Degraded)
    }
}

/// Outcome of routing one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub route: Route,
    pub method: RoutingMethod,
    /// Cosine similarity of the winning route, when the semantic layer scored the query
    pub score: Option<f32>,
    /// Set whenever the keyword classifier had to decide
    pub fallback: Option<FallbackReason>,
}

impl RoutingDecision {
    pub fn semantic(route: Route, score: f32) -> Self {
        Self {
            route,
            method: RoutingMethod::Semantic,
            score: Some(score),
            fallback: None,
        }
    }
}
