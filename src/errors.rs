// Router error types
//
// Everything here stays inside the router: `IntentRouter::route` turns each
// variant into a keyword fallback and never hands one to its caller.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    /// The embedding backend could not be loaded
    #[error("embedding backend '{backend}' failed to initialize: {message}")]
    Initialization { backend: String, message: String },

    /// Every initialization attempt failed
    #[error("semantic layer unavailable after {attempts} attempt(s): {last_error}")]
    InitializationExhausted { attempts: u32, last_error: String },

    /// The backend failed to encode one query
    #[error("failed to encode query: {0}")]
    Encoding(String),

    #[error("embedding call exceeded {0:?}")]
    Timeout(Duration),

    #[error("embedding dimension mismatch: index has {expected}, backend returned {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("corpus encode returned {actual} vectors for {expected} utterances")]
    IndexSize { expected: usize, actual: usize },

    #[error("utterance corpus is empty")]
    EmptyCorpus,

    #[error("self-test failed: probe '{probe}' expected {expected}, got {actual}")]
    SelfTest {
        probe: String,
        expected: String,
        actual: String,
    },

    /// The blocking encode task panicked or was cancelled
    #[error("embedding task aborted: {0}")]
    TaskAborted(String),
}

impl RouterError {
    /// Errors that mean the backend itself is broken, as opposed to one bad query.
    pub fn is_fatal_to_backend(&self) -> bool {
        !matches!(self, RouterError::Encoding(_))
    }
}

pub type RouterResult<T> = std::result::Result<T, RouterError>;
