// MiniLM sentence embeddings over ONNX Runtime
//
// sentence-transformers/all-MiniLM-L6-v2, the model the retail assistant's
// routes were tuned against. ONNX export from Xenova/all-MiniLM-L6-v2-ONNX,
// kept in the standard HuggingFace cache after the first download.

use super::engine::{normalize, EmbeddingEngine};
use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array2;
use ort::{
    memory::MemoryInfo,
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

const HUB_REPO: &str = "Xenova/all-MiniLM-L6-v2-ONNX";

/// Queries are short; routing never needs the model's full 512-token window.
const MAX_SEQ_LEN: usize = 128;

const EMBEDDING_DIM: usize = 384;

/// all-MiniLM-L6-v2 embedding engine.
///
/// Mean-pools `last_hidden_state` over the attention mask and L2-normalizes,
/// matching what sentence-transformers does for this model. `run_binding`
/// needs `&mut Session`, hence the mutex.
pub struct MiniLmEngine {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    has_token_type_ids: bool,
}

impl MiniLmEngine {
    /// Load model and tokenizer from a directory holding
    /// `model_quantized.onnx` (or `model.onnx`) and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        info!("Loading MiniLM encoder from {:?}", model_dir);

        let model_path = ["model_quantized.onnx", "model.onnx"]
            .iter()
            .map(|name| model_dir.join(name))
            .find(|p| p.exists())
            .ok_or_else(|| anyhow!("No ONNX model in {:?}", model_dir))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        if !tokenizer_path.exists() {
            bail!("Tokenizer not found: {:?}", tokenizer_path);
        }
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(2)
            .context("Failed to set thread count")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {:?}", model_path))?;

        let has_token_type_ids = session
            .inputs()
            .iter()
            .any(|i| i.name() == "token_type_ids");

        debug!(
            "MiniLM session ready: model={:?}, token_type_ids={}",
            model_path, has_token_type_ids
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            has_token_type_ids,
        })
    }

    /// Resolve the model directory: explicit override, then the HF cache,
    /// then a download. Blocking; call from `spawn_blocking` in async code.
    pub fn locate(model_dir: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = model_dir {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = Self::find_in_cache() {
            return Ok(dir);
        }
        Self::download()
    }

    fn download() -> Result<PathBuf> {
        use hf_hub::{api::sync::Api, Repo, RepoType};

        info!("Downloading {} from the HuggingFace hub", HUB_REPO);

        let api = Api::new().context("Failed to create HuggingFace Hub API")?;
        let repo = api.repo(Repo::new(HUB_REPO.to_string(), RepoType::Model));

        let model_path = repo
            .get("model_quantized.onnx")
            .or_else(|_| repo.get("model.onnx"))
            .context("Failed to download MiniLM ONNX model")?;
        repo.get("tokenizer.json")
            .context("Failed to download tokenizer.json")?;

        model_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("Model path has no parent directory"))
    }

    /// Look for a complete snapshot in `~/.cache/huggingface/hub` without
    /// touching the network.
    pub fn find_in_cache() -> Option<PathBuf> {
        let snapshots = dirs::home_dir()?
            .join(".cache/huggingface/hub")
            .join(format!("models--{}", HUB_REPO.replace('/', "--")))
            .join("snapshots");

        let entries = std::fs::read_dir(&snapshots).ok()?;
        entries.flatten().map(|e| e.path()).find(|snapshot| {
            let has_model = snapshot.join("model_quantized.onnx").exists()
                || snapshot.join("model.onnx").exists();
            has_model && snapshot.join("tokenizer.json").exists()
        })
    }

    fn tokenize(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>)> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let ids = encoding
            .get_ids()
            .iter()
            .take(MAX_SEQ_LEN)
            .map(|&id| id as i64)
            .collect();
        let mask = encoding
            .get_attention_mask()
            .iter()
            .take(MAX_SEQ_LEN)
            .map(|&m| m as i64)
            .collect();

        Ok((ids, mask))
    }

    fn tensor(data: Vec<i64>, what: &str) -> Result<Value> {
        let len = data.len();
        let arr = Array2::from_shape_vec((1, len), data)
            .with_context(|| format!("Failed to shape {}", what))?;
        Ok(Value::from_array(arr)
            .with_context(|| format!("Failed to create {} tensor", what))?
            .into_dyn())
    }
}

impl EmbeddingEngine for MiniLmEngine {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) = self.tokenize(text)?;
        let seq_len = input_ids.len();
        if seq_len == 0 {
            return Ok(vec![0.0; EMBEDDING_DIM]);
        }

        let ids_val = Self::tensor(input_ids, "input_ids")?;
        let mask_val = Self::tensor(attention_mask.clone(), "attention_mask")?;
        let tti_val = if self.has_token_type_ids {
            Some(Self::tensor(vec![0; seq_len], "token_type_ids")?)
        } else {
            None
        };

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session mutex poisoned"))?;

        let mut binding = session
            .create_binding()
            .context("Failed to create IoBinding")?;
        binding
            .bind_input("input_ids", &ids_val)
            .context("Failed to bind input_ids")?;
        binding
            .bind_input("attention_mask", &mask_val)
            .context("Failed to bind attention_mask")?;
        if let Some(tti) = &tti_val {
            binding
                .bind_input("token_type_ids", tti)
                .context("Failed to bind token_type_ids")?;
        }

        let mem_info = MemoryInfo::default();
        binding
            .bind_output_to_device("last_hidden_state", &mem_info)
            .context("Failed to bind last_hidden_state")?;
        // Some exports refuse to run unless every output is bound
        for out in session.outputs().iter() {
            if out.name() != "last_hidden_state" {
                let _ = binding.bind_output_to_device(out.name(), &mem_info);
            }
        }

        let outputs = session
            .run_binding(&binding)
            .context("ONNX inference failed")?;
        let hidden = outputs
            .get("last_hidden_state")
            .ok_or_else(|| anyhow!("Model produced no last_hidden_state"))?;

        let (shape, data) = hidden
            .try_extract_tensor::<f32>()
            .context("Failed to extract last_hidden_state")?;
        if shape.len() != 3 {
            bail!("Expected [1, seq, dim] hidden state, got {:?}", shape);
        }

        let mut pooled = mean_pool(data, shape[1] as usize, shape[2] as usize, &attention_mask);
        normalize(&mut pooled);
        Ok(pooled)
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn name(&self) -> &str {
        "minilm"
    }
}

/// Average the token vectors whose mask is 1.
fn mean_pool(data: &[f32], seq_len: usize, hidden_dim: usize, mask: &[i64]) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut count = 0.0f32;

    for (i, &m) in mask.iter().enumerate().take(seq_len.min(mask.len())) {
        if m != 1 {
            continue;
        }
        let row = &data[i * hidden_dim..(i + 1) * hidden_dim];
        for (acc, v) in pooled.iter_mut().zip(row) {
            *acc += v;
        }
        count += 1.0;
    }

    if count > 0.0 {
        for v in &mut pooled {
            *v /= count;
        }
    }
    pooled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    #[test]
    fn test_mean_pool_respects_mask() {
        // Two tokens of dim 2; only the first is attended
        let data = [1.0, 3.0, 100.0, 100.0];
        assert_eq!(mean_pool(&data, 2, 2, &[1, 0]), vec![1.0, 3.0]);
        assert_eq!(mean_pool(&data, 2, 2, &[1, 1]), vec![50.5, 51.5]);
    }

    #[test]
    fn test_mean_pool_all_masked_is_zero() {
        let data = [1.0, 2.0];
        assert_eq!(mean_pool(&data, 1, 2, &[0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_find_in_cache_does_not_panic() {
        let _ = MiniLmEngine::find_in_cache();
    }

    /// Needs the model in the local HF cache.
    #[test]
    #[ignore]
    fn test_minilm_routes_paraphrases() {
        let dir = MiniLmEngine::find_in_cache().expect("model not cached");
        let engine = MiniLmEngine::load(&dir).unwrap();

        let refund = engine.embed("How long does it take to process a refund?").unwrap();
        let paraphrase = engine.embed("When do I get my money back?").unwrap();
        let shoes = engine.embed("Black formal shoes size 8").unwrap();

        assert_eq!(refund.len(), 384);
        assert!(cosine_similarity(&refund, &paraphrase) > cosine_similarity(&refund, &shoes));
    }
}
