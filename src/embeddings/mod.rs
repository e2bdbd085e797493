// Embedding backends
//
// Sentence embeddings for the semantic classifier: the MiniLM model in
// production, a hashed bag-of-words engine when no model is wanted.

mod engine;
mod loader;
mod minilm;

pub use engine::{cosine_similarity, normalize, EmbeddingEngine, LexicalEmbedding};
pub use loader::{loader_for, EngineLoader, LexicalLoader, MiniLmLoader};
pub use minilm::MiniLmEngine;
