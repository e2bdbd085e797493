// Router orchestrator
//
// Owns the semantic layer's lifecycle (Uninitialized → Initializing →
// Ready | Degraded) and the policy for falling back to keywords.
// `route` and `decide` never fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::corpus::Corpus;
use super::decision::{FallbackReason, Route, RoutingDecision, RoutingMethod};
use super::keyword::{KeywordBasis, KeywordClassifier, KeywordTable};
use super::retry::{with_retry, RetryPolicy, Sleeper, TokioSleeper};
use super::semantic::{SemanticClassifier, SemanticOutcome};
use crate::config::RouterConfig;
use crate::embeddings::{loader_for, EngineLoader};
use crate::errors::{RouterError, RouterResult};
use crate::metrics::{DecisionLogger, RouterStats, RoutingMetric, StatsSnapshot};

/// Lifecycle of the semantic layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Uninitialized,
    Initializing,
    /// Semantic classification is live
    Ready,
    /// Keyword-only until `reinitialize`
    Degraded,
}

impl RouterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouterState::Uninitialized => "uninitialized",
            RouterState::Initializing => "initializing",
            RouterState::Ready => "ready",
            RouterState::Degraded => "degraded",
        }
    }
}

enum SemanticLayer {
    Uninitialized,
    Ready(Arc<SemanticClassifier>),
    Degraded { reason: String },
}

pub struct IntentRouter {
    corpus: Arc<Corpus>,
    keywords: KeywordClassifier,
    loader: Arc<dyn EngineLoader>,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryPolicy,
    threshold: f32,
    encode_timeout: Duration,
    layer: RwLock<SemanticLayer>,
    /// Held for the whole of an initialization run
    init_gate: Mutex<()>,
    initializing: AtomicBool,
    stats: RouterStats,
    decision_log: Option<DecisionLogger>,
}

impl IntentRouter {
    /// Router with the configured backend and the built-in corpus and keywords.
    pub fn new(config: &RouterConfig) -> Result<Self> {
        Self::with_loader(config, loader_for(config))
    }

    pub fn with_loader(config: &RouterConfig, loader: Arc<dyn EngineLoader>) -> Result<Self> {
        let decision_log = match &config.metrics_dir {
            Some(dir) => Some(DecisionLogger::new(dir.clone())?),
            None => None,
        };

        Ok(Self {
            corpus: Arc::new(Corpus::builtin()),
            keywords: KeywordClassifier::builtin(),
            loader,
            sleeper: Arc::new(TokioSleeper),
            retry: config.retry_policy(),
            threshold: config.similarity_threshold,
            encode_timeout: config.encode_timeout(),
            layer: RwLock::new(SemanticLayer::Uninitialized),
            init_gate: Mutex::new(()),
            initializing: AtomicBool::new(false),
            stats: RouterStats::new(),
            decision_log,
        })
    }

    /// Replace the backoff sleeper (tests use one that returns immediately).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_corpus(mut self, corpus: Corpus) -> Self {
        self.corpus = Arc::new(corpus);
        self
    }

    pub fn with_keywords(mut self, table: KeywordTable) -> Self {
        self.keywords = KeywordClassifier::new(table);
        self
    }

    /// Route a query. Always returns a route.
    pub async fn route(&self, query: &str) -> Route {
        self.decide(query).await.route
    }

    /// Route a query and report how the route was chosen.
    pub async fn decide(&self, query: &str) -> RoutingDecision {
        let started = Instant::now();
        self.ensure_initialized().await;

        let classifier = match &*self.layer.read().await {
            SemanticLayer::Ready(classifier) => Some(classifier.clone()),
            _ => None,
        };

        let decision = match classifier {
            None => self.keyword_decision(query, FallbackReason::Degraded),
            Some(classifier) => match self.classify_bounded(classifier.clone(), query).await {
                Ok(SemanticOutcome::Matched { route, score }) => {
                    RoutingDecision::semantic(route, score)
                }
                Ok(SemanticOutcome::Unmatched { best }) => {
                    debug!("Semantic match below threshold (best: {:?})", best);
                    self.keyword_decision(query, FallbackReason::LowConfidence)
                }
                Err(e) => {
                    let reason = match e {
                        RouterError::Encoding(_) => FallbackReason::EncodingError,
                        RouterError::Timeout(_) => FallbackReason::Timeout,
                        _ => FallbackReason::BackendFailure,
                    };
                    if e.is_fatal_to_backend() {
                        self.degrade(&classifier, &e).await;
                    } else {
                        warn!("Semantic routing failed for this query: {}", e);
                    }
                    self.keyword_decision(query, reason)
                }
            },
        };

        debug!(
            "Routed to {} via {} (score: {:?}, fallback: {:?})",
            decision.route,
            decision.method.as_str(),
            decision.score,
            decision.fallback.map(|f| f.as_str())
        );

        self.stats.record_decision(&decision);
        self.log_decision(query, &decision, started.elapsed());
        decision
    }

    /// Initialize the semantic layer now instead of on the first query.
    pub async fn warm_up(&self) -> RouterState {
        self.ensure_initialized().await;
        self.state().await
    }

    /// Run initialization again, whatever the current state. The current
    /// layer keeps serving until the new attempt finishes.
    pub async fn reinitialize(&self) -> RouterState {
        {
            let _gate = self.init_gate.lock().await;
            let next = self.initialize_layer().await;
            *self.layer.write().await = next;
        }
        self.state().await
    }

    /// Release the semantic layer; routing continues on keywords.
    pub async fn shutdown(&self) {
        let _gate = self.init_gate.lock().await;
        *self.layer.write().await = SemanticLayer::Degraded {
            reason: "shut down".to_string(),
        };
        info!("Semantic layer shut down; keyword routing only");
    }

    pub async fn state(&self) -> RouterState {
        if self.initializing.load(Ordering::SeqCst) {
            return RouterState::Initializing;
        }
        match &*self.layer.read().await {
            SemanticLayer::Uninitialized => RouterState::Uninitialized,
            SemanticLayer::Ready(_) => RouterState::Ready,
            SemanticLayer::Degraded { .. } => RouterState::Degraded,
        }
    }

    /// Why the router is degraded, if it is.
    pub async fn degraded_reason(&self) -> Option<String> {
        match &*self.layer.read().await {
            SemanticLayer::Degraded { reason } => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn keyword_classifier(&self) -> &KeywordClassifier {
        &self.keywords
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn decision_log(&self) -> Option<&DecisionLogger> {
        self.decision_log.as_ref()
    }

    pub fn backend_name(&self) -> &str {
        self.loader.name()
    }

    async fn ensure_initialized(&self) {
        if !matches!(*self.layer.read().await, SemanticLayer::Uninitialized) {
            return;
        }

        let _gate = self.init_gate.lock().await;
        // Another caller may have finished while we waited for the gate
        if !matches!(*self.layer.read().await, SemanticLayer::Uninitialized) {
            return;
        }

        let next = self.initialize_layer().await;
        *self.layer.write().await = next;
    }

    /// Caller must hold `init_gate`.
    async fn initialize_layer(&self) -> SemanticLayer {
        self.initializing.store(true, Ordering::SeqCst);
        let started = Instant::now();

        let result = with_retry(&self.retry, self.sleeper.as_ref(), |attempt| {
            self.build_classifier(attempt)
        })
        .await;

        self.initializing.store(false, Ordering::SeqCst);

        match result {
            Ok(classifier) => {
                info!(
                    "Semantic router ready: backend={}, {} utterances, threshold={} ({:?})",
                    classifier.backend_name(),
                    classifier.index_len(),
                    classifier.threshold(),
                    started.elapsed()
                );
                SemanticLayer::Ready(Arc::new(classifier))
            }
            Err(exhausted) => {
                let err = RouterError::InitializationExhausted {
                    attempts: exhausted.attempts,
                    last_error: exhausted.last_error.to_string(),
                };
                warn!("{}. Falling back to keyword routing.", err);
                self.stats.record_degradation();
                SemanticLayer::Degraded {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn build_classifier(&self, attempt: u32) -> RouterResult<SemanticClassifier> {
        self.stats.record_init_attempt();
        info!(
            "Creating semantic router (attempt {}/{}, backend {})",
            attempt,
            self.retry.max_attempts.max(1),
            self.loader.name()
        );

        let engine = self
            .loader
            .load()
            .await
            .map_err(|e| RouterError::Initialization {
                backend: self.loader.name().to_string(),
                message: format!("{:#}", e),
            })?;

        // Corpus encoding and the self-test can take seconds on a real model
        let corpus = self.corpus.clone();
        let threshold = self.threshold;
        tokio::task::spawn_blocking(move || {
            let classifier = SemanticClassifier::build(&corpus, engine, threshold)?;
            classifier.self_test(&corpus.probes())?;
            Ok::<_, RouterError>(classifier)
        })
        .await
        .map_err(|e| RouterError::TaskAborted(e.to_string()))?
    }

    async fn classify_bounded(
        &self,
        classifier: Arc<SemanticClassifier>,
        query: &str,
    ) -> RouterResult<SemanticOutcome> {
        let query = query.to_string();
        let task = tokio::task::spawn_blocking(move || classifier.classify(&query));

        match tokio::time::timeout(self.encode_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(RouterError::TaskAborted(join_error.to_string())),
            // The blocking encode keeps running; only its result is abandoned
            Err(_) => Err(RouterError::Timeout(self.encode_timeout)),
        }
    }

    /// Degrade only if `failed` is still the live classifier; a layer
    /// installed by `reinitialize` meanwhile is left alone.
    async fn degrade(&self, failed: &Arc<SemanticClassifier>, cause: &RouterError) {
        let mut layer = self.layer.write().await;
        let is_current = match &*layer {
            SemanticLayer::Ready(current) => Arc::ptr_eq(current, failed),
            _ => false,
        };
        if !is_current {
            debug!("Ignoring failure from a replaced semantic layer: {}", cause);
            return;
        }

        warn!(
            "Semantic backend failed ({}); degrading to keyword routing",
            cause
        );
        *layer = SemanticLayer::Degraded {
            reason: cause.to_string(),
        };
        self.stats.record_degradation();
    }

    fn keyword_decision(&self, query: &str, reason: FallbackReason) -> RoutingDecision {
        let keyword = self.keywords.decide(query);
        let method = match keyword.basis {
            KeywordBasis::Matched => RoutingMethod::Keyword,
            KeywordBasis::DigitHeuristic | KeywordBasis::Default => RoutingMethod::Default,
        };

        RoutingDecision {
            route: keyword.route,
            method,
            score: None,
            fallback: Some(reason),
        }
    }

    fn log_decision(&self, query: &str, decision: &RoutingDecision, elapsed: Duration) {
        if let Some(logger) = &self.decision_log {
            let metric = RoutingMetric::new(
                DecisionLogger::hash_query(query),
                decision,
                elapsed.as_micros() as u64,
            );
            if let Err(e) = logger.log(&metric) {
                warn!("Failed to write decision log: {:#}", e);
            }
        }
    }
}
