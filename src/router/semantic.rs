// Embedding similarity classifier
//
// Scores each route by the best cosine similarity between the query and any
// of the route's utterances. The corpus is encoded once, at build time.

use std::sync::Arc;

use super::corpus::{Corpus, UtteranceExample};
use super::decision::Route;
use crate::embeddings::{cosine_similarity, EmbeddingEngine};
use crate::errors::{RouterError, RouterResult};

/// Default minimum similarity for a semantic match.
pub const DEFAULT_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SemanticOutcome {
    Matched { route: Route, score: f32 },
    /// Best score fell below the threshold, or no route had examples
    Unmatched { best: Option<(Route, f32)> },
}

impl SemanticOutcome {
    pub fn route(&self) -> Option<Route> {
        match self {
            SemanticOutcome::Matched { route, .. } => Some(*route),
            SemanticOutcome::Unmatched { .. } => None,
        }
    }
}

struct IndexedUtterance {
    route: Route,
    embedding: Vec<f32>,
}

pub struct SemanticClassifier {
    engine: Arc<dyn EmbeddingEngine>,
    index: Vec<IndexedUtterance>,
    dimension: usize,
    threshold: f32,
}

impl SemanticClassifier {
    /// Encode the whole corpus and build the index.
    pub fn build(
        corpus: &Corpus,
        engine: Arc<dyn EmbeddingEngine>,
        threshold: f32,
    ) -> RouterResult<Self> {
        if corpus.is_empty() {
            return Err(RouterError::EmptyCorpus);
        }

        let texts: Vec<&str> = corpus.examples().iter().map(|e| e.text).collect();
        let vectors = engine
            .embed_batch(&texts)
            .map_err(|e| RouterError::Initialization {
                backend: engine.name().to_string(),
                message: format!("{:#}", e),
            })?;

        if vectors.len() != texts.len() {
            return Err(RouterError::IndexSize {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }

        let dimension = vectors[0].len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(RouterError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let index = corpus
            .examples()
            .iter()
            .zip(vectors)
            .map(|(example, embedding)| IndexedUtterance {
                route: example.route,
                embedding,
            })
            .collect();

        tracing::debug!(
            "Semantic index built: {} utterances, dim={}, backend={}",
            texts.len(),
            dimension,
            engine.name()
        );

        Ok(Self {
            engine,
            index,
            dimension,
            threshold,
        })
    }

    /// Best similarity per route, in `Route::PRIORITY` order.
    /// Routes without utterances score negative infinity.
    pub fn scores(&self, query: &str) -> RouterResult<Vec<(Route, f32)>> {
        let vector = self
            .engine
            .embed(query)
            .map_err(|e| RouterError::Encoding(format!("{:#}", e)))?;

        if vector.len() != self.dimension {
            return Err(RouterError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        Ok(Route::PRIORITY
            .iter()
            .map(|route| {
                let best = self
                    .index
                    .iter()
                    .filter(|u| u.route == *route)
                    .map(|u| cosine_similarity(&vector, &u.embedding))
                    .fold(f32::NEG_INFINITY, f32::max);
                (*route, best)
            })
            .collect())
    }

    /// Classify a query. A score equal to the threshold counts as a match.
    pub fn classify(&self, query: &str) -> RouterResult<SemanticOutcome> {
        let scores = self.scores(query)?;

        // Strict `>` over PRIORITY order: equal scores keep the earlier route
        let mut best: Option<(Route, f32)> = None;
        for (route, score) in scores {
            if score.is_nan() || score == f32::NEG_INFINITY {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((route, score)),
            }
        }

        let outcome = match best {
            Some((route, score)) if score >= self.threshold => {
                SemanticOutcome::Matched { route, score }
            }
            other => SemanticOutcome::Unmatched { best: other },
        };

        tracing::debug!("Semantic outcome for query: {:?}", outcome);
        Ok(outcome)
    }

    /// Each probe must classify back to its own route.
    pub fn self_test(&self, probes: &[UtteranceExample]) -> RouterResult<()> {
        for probe in probes {
            let outcome = self.classify(probe.text)?;
            if outcome.route() != Some(probe.route) {
                return Err(RouterError::SelfTest {
                    probe: probe.text.to_string(),
                    expected: probe.route.to_string(),
                    actual: outcome
                        .route()
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "unmatched".to_string()),
                });
            }
        }
        Ok(())
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn backend_name(&self) -> &str {
        self.engine.name()
    }
}
