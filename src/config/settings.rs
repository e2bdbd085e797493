// Configuration structs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::constants::{
    DEFAULT_ENCODE_TIMEOUT_MS, DEFAULT_INIT_ATTEMPTS, DEFAULT_INIT_BACKOFF_MS,
};
use crate::router::{RetryPolicy, DEFAULT_THRESHOLD};

/// Which embedding backend powers the semantic classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// sentence-transformers/all-MiniLM-L6-v2 over ONNX Runtime
    #[default]
    #[serde(rename = "minilm")]
    MiniLm,
    /// Hashed bag-of-words vectors, no model files
    #[serde(rename = "lexical")]
    Lexical,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::MiniLm => f.write_str("minilm"),
            BackendKind::Lexical => f.write_str("lexical"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minilm" => Ok(BackendKind::MiniLm),
            "lexical" => Ok(BackendKind::Lexical),
            other => Err(format!(
                "unknown backend '{}' (expected 'minilm' or 'lexical')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Embedding backend (default: minilm)
    pub backend: BackendKind,

    /// Local MiniLM model directory; None = HuggingFace cache, downloading if needed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,

    /// Minimum cosine similarity for a semantic match (inclusive)
    pub similarity_threshold: f32,

    /// Initialization attempts before the router degrades to keywords
    pub max_init_attempts: u32,

    /// Fixed delay between initialization attempts
    pub init_backoff_ms: u64,

    /// Upper bound on a single query encode
    pub encode_timeout_ms: u64,

    /// Directory for the JSONL decision log; None disables it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_dir: Option<PathBuf>,

    /// Initialize the semantic layer at startup instead of on the first query
    pub warm_up_on_start: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            model_dir: None,
            similarity_threshold: DEFAULT_THRESHOLD,
            max_init_attempts: DEFAULT_INIT_ATTEMPTS,
            init_backoff_ms: DEFAULT_INIT_BACKOFF_MS,
            encode_timeout_ms: DEFAULT_ENCODE_TIMEOUT_MS,
            metrics_dir: None,
            warm_up_on_start: true,
        }
    }
}

impl RouterConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_init_attempts,
            backoff: Duration::from_millis(self.init_backoff_ms),
        }
    }

    pub fn encode_timeout(&self) -> Duration {
        Duration::from_millis(self.encode_timeout_ms)
    }

    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.similarity_threshold.is_finite()
            || !(-1.0..=1.0).contains(&self.similarity_threshold)
        {
            anyhow::bail!(
                "similarity_threshold must be within [-1.0, 1.0] (got {})",
                self.similarity_threshold
            );
        }

        if self.max_init_attempts == 0 {
            anyhow::bail!("max_init_attempts must be at least 1");
        }

        if self.encode_timeout_ms == 0 {
            anyhow::bail!("encode_timeout_ms must be greater than 0");
        }

        if let Some(dir) = &self.model_dir {
            if self.backend == BackendKind::Lexical {
                tracing::warn!(
                    "model_dir {:?} is ignored by the lexical backend",
                    dir
                );
            }
        }

        Ok(())
    }
}
