// Fakes shared by the integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use intent_router::config::{BackendKind, RouterConfig};
use intent_router::embeddings::{EmbeddingEngine, EngineLoader, LexicalEmbedding};
use intent_router::router::{IntentRouter, Sleeper};

/// Records requested backoffs and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    pub slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Fails the first `failures` loads, then hands out `engine`.
pub struct FlakyLoader {
    failures: u32,
    calls: AtomicU32,
    engine: Arc<dyn EmbeddingEngine>,
}

impl FlakyLoader {
    pub fn new(failures: u32, engine: Arc<dyn EmbeddingEngine>) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            engine,
        }
    }

    pub fn lexical(failures: u32) -> Self {
        Self::new(failures, Arc::new(LexicalEmbedding::new()))
    }

    pub fn always_failing() -> Self {
        Self::lexical(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineLoader for FlakyLoader {
    async fn load(&self) -> Result<Arc<dyn EmbeddingEngine>> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            bail!("model files unavailable (load #{})", attempt);
        }
        Ok(self.engine.clone())
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Hands out `engines` in order, repeating the last one.
pub struct SequenceLoader {
    engines: Vec<Arc<dyn EmbeddingEngine>>,
    calls: AtomicU32,
}

impl SequenceLoader {
    pub fn new(engines: Vec<Arc<dyn EmbeddingEngine>>) -> Self {
        assert!(!engines.is_empty());
        Self {
            engines,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl EngineLoader for SequenceLoader {
    async fn load(&self) -> Result<Arc<dyn EmbeddingEngine>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        Ok(self.engines[call.min(self.engines.len() - 1)].clone())
    }

    fn name(&self) -> &str {
        "sequence"
    }
}

/// Lexical engine with injectable faults keyed on markers in the text:
/// `[boom]` fails the encode, `[panic]` panics, `[mismatch]` returns a
/// vector of the wrong size. `stall` makes every encode sleep.
pub struct FaultyEngine {
    inner: LexicalEmbedding,
    pub stall: AtomicBool,
    stall_for: Duration,
}

impl FaultyEngine {
    pub fn new(stall_for: Duration) -> Self {
        Self {
            inner: LexicalEmbedding::new(),
            stall: AtomicBool::new(false),
            stall_for,
        }
    }
}

impl EmbeddingEngine for FaultyEngine {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("[boom]") {
            bail!("tokenizer rejected input");
        }
        if text.contains("[panic]") {
            panic!("backend crashed");
        }
        if text.contains("[mismatch]") {
            return Ok(vec![0.5; 3]);
        }
        if self.stall.load(Ordering::SeqCst) {
            std::thread::sleep(self.stall_for);
        }
        self.inner.embed(text)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        "faulty"
    }
}

pub fn lexical_config() -> RouterConfig {
    RouterConfig {
        backend: BackendKind::Lexical,
        ..Default::default()
    }
}

pub fn router_with(loader: Arc<dyn EngineLoader>, sleeper: Arc<RecordingSleeper>) -> IntentRouter {
    IntentRouter::with_loader(&lexical_config(), loader)
        .unwrap()
        .with_sleeper(sleeper)
}

pub const SCENARIOS: &[(&str, intent_router::Route)] = &[
    (
        "What is your policy on defective product?",
        intent_router::Route::Faq,
    ),
    (
        "Pink Puma shoes in price range 1000 to 5000",
        intent_router::Route::ProductSearch,
    ),
    ("How are you?", intent_router::Route::SmallTalk),
    (
        "asdkjashdkjh random gibberish 12345",
        intent_router::Route::ProductSearch,
    ),
];
