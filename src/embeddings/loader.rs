// Embedding backend loaders
//
// Loading is the expensive, fallible step (model files, downloads). The
// router calls `load` once per initialization attempt.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use super::engine::{EmbeddingEngine, LexicalEmbedding};
use super::minilm::MiniLmEngine;
use crate::config::{BackendKind, RouterConfig};

#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// Produce a ready engine or fail.
    async fn load(&self) -> Result<Arc<dyn EmbeddingEngine>>;

    /// Backend name for logs and errors
    fn name(&self) -> &str;
}

/// Loads the hashed bag-of-words engine. Never fails.
pub struct LexicalLoader {
    dimension: usize,
}

impl LexicalLoader {
    pub fn new() -> Self {
        Self { dimension: 384 }
    }
}

impl Default for LexicalLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineLoader for LexicalLoader {
    async fn load(&self) -> Result<Arc<dyn EmbeddingEngine>> {
        Ok(Arc::new(LexicalEmbedding::with_dimension(self.dimension)))
    }

    fn name(&self) -> &str {
        "lexical"
    }
}

/// Loads all-MiniLM-L6-v2, downloading it on first use unless `model_dir`
/// points at a local copy.
pub struct MiniLmLoader {
    model_dir: Option<PathBuf>,
}

impl MiniLmLoader {
    pub fn new(model_dir: Option<PathBuf>) -> Self {
        Self { model_dir }
    }
}

#[async_trait]
impl EngineLoader for MiniLmLoader {
    async fn load(&self) -> Result<Arc<dyn EmbeddingEngine>> {
        let model_dir = self.model_dir.clone();
        let engine = tokio::task::spawn_blocking(move || {
            let dir = MiniLmEngine::locate(model_dir.as_deref())?;
            MiniLmEngine::load(&dir)
        })
        .await
        .context("MiniLM load task panicked")??;

        Ok(Arc::new(engine))
    }

    fn name(&self) -> &str {
        "minilm"
    }
}

/// Pick the loader the configuration asks for.
pub fn loader_for(config: &RouterConfig) -> Arc<dyn EngineLoader> {
    match config.backend {
        BackendKind::Lexical => Arc::new(LexicalLoader::new()),
        BackendKind::MiniLm => Arc::new(MiniLmLoader::new(config.model_dir.clone())),
    }
}
