// In-process routing counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::router::{RoutingDecision, RoutingMethod};

#[derive(Debug, Default)]
pub struct RouterStats {
    semantic: AtomicU64,
    keyword: AtomicU64,
    default: AtomicU64,
    low_confidence_fallbacks: AtomicU64,
    error_fallbacks: AtomicU64,
    init_attempts: AtomicU64,
    degradations: AtomicU64,
}

impl RouterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_decision(&self, decision: &RoutingDecision) {
        let counter = match decision.method {
            RoutingMethod::Semantic => &self.semantic,
            RoutingMethod::Keyword => &self.keyword,
            RoutingMethod::Default => &self.default,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Some(reason) = decision.fallback {
            if reason.is_error() {
                self.error_fallbacks.fetch_add(1, Ordering::Relaxed);
            } else if reason == crate::router::FallbackReason::LowConfidence {
                self.low_confidence_fallbacks.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_init_attempt(&self) {
        self.init_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degradation(&self) {
        self.degradations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let semantic = self.semantic.load(Ordering::Relaxed);
        let keyword = self.keyword.load(Ordering::Relaxed);
        let default = self.default.load(Ordering::Relaxed);

        StatsSnapshot {
            total: semantic + keyword + default,
            semantic,
            keyword,
            default,
            low_confidence_fallbacks: self.low_confidence_fallbacks.load(Ordering::Relaxed),
            error_fallbacks: self.error_fallbacks.load(Ordering::Relaxed),
            init_attempts: self.init_attempts.load(Ordering::Relaxed),
            degradations: self.degradations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub semantic: u64,
    pub keyword: u64,
    pub default: u64,
    pub low_confidence_fallbacks: u64,
    pub error_fallbacks: u64,
    pub init_attempts: u64,
    pub degradations: u64,
}

impl StatsSnapshot {
    /// Share of queries the semantic layer decided
    pub fn semantic_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.semantic as f64 / self.total as f64
        }
    }
}
