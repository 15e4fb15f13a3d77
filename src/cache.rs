//! # Semantic answer cache
//!
//! In-memory embedding store for previously answered questions. This module
//! wraps a [HNSW](https://arxiv.org/abs/1603.09320) approximate
//! nearest-neighbor index (`hora` crate) plus a sentence embedding model
//! using Candle (pure Rust ML framework). Questions are embedded into 384-d
//! vectors and stored alongside their answers; lookups return the single
//! nearest cached question and its squared Euclidean distance.
//!
//! ## Responsibilities
//! - **Embedding**: the [`Embedder`] seam; production code uses
//!   [`MiniLmEmbedder`] (all-MiniLM-L6-v2 via Candle).
//! - **Indexing**: maintains a HNSW index for nearest-neighbor queries.
//! - **Association**: links each vector slot to a [`CacheEntry`].
//!
//! Entries are immutable once written, never evicted, and not persisted
//! across restarts. Whether a match is close enough to reuse is decided by
//! the resolver, not here.
//!
//! ## Quick example
//! ```no_run
//! use wonder_why::cache::{MiniLmEmbedder, SemanticCache};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = MiniLmEmbedder::load()?;
//! let mut cache = SemanticCache::new(384, Box::new(embedder));
//! cache.insert("why is the sky blue", "Sunlight scatters in the air...")?;
//! let hit = cache.lookup("why is the sky so blue")?;
//! println!("nearest: {hit:?}");
//! # Ok(()) }
//! ```

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use hora::core::ann_index::ANNIndex;
use hora::core::metrics::Metric;
use hora::core::node::Node;
use hora::index::hnsw_idx::HNSWIndex;
use hora::index::hnsw_params::HNSWParams;
use std::collections::HashMap;
use std::error::Error;
use tokenizers::Tokenizer;
use uuid::Uuid;

/// Vector dimensionality produced by the MiniLM sentence embedding model.
pub const EMBEDDING_DIMENSION: usize = 384;

/// Seam to the sentence-embedding collaborator.
///
/// Production code uses [`MiniLmEmbedder`]; tests substitute deterministic
/// embedders so distances can be controlled exactly.
pub trait Embedder {
    /// Embed text into a dense vector of the cache's dimensionality.
    fn embed(&self, text: &str) -> Result<Vec<f32>, Box<dyn Error>>;
}

/// Sentence embeddings model using Candle (pure Rust).
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl MiniLmEmbedder {
    /// Load all-MiniLM-L6-v2 from the Hugging Face Hub.
    pub fn load() -> Result<Self, Box<dyn Error>> {
        let device = Device::Cpu;
        let model_id = "sentence-transformers/all-MiniLM-L6-v2";
        let revision = "main";

        let repo = Repo::with_revision(model_id.to_string(), RepoType::Model, revision.to_string());
        let api = Api::new()?;
        let api_repo = api.repo(repo);

        let config_filename = api_repo.get("config.json")?;
        let tokenizer_filename = api_repo.get("tokenizer.json")?;
        let weights_filename = api_repo.get("model.safetensors")?;

        let config = std::fs::read_to_string(config_filename)?;
        let config: Config = serde_json::from_str(&config)?;

        let tokenizer = Tokenizer::from_file(tokenizer_filename)
            .map_err(|e| format!("Failed to load tokenizer: {}", e))?;

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_filename], DTYPE, &device)? };
        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Mean pooling over token embeddings, weighted by the attention mask.
    fn mean_pooling(
        &self,
        embeddings: &Tensor,
        attention_mask: &[u32],
    ) -> Result<Tensor, Box<dyn Error>> {
        // embeddings: [1, seq_len, hidden]; mask must broadcast as [1, seq_len, 1]
        let mask = Tensor::new(attention_mask, &self.device)?
            .to_dtype(DType::F32)?
            .unsqueeze(0)?
            .unsqueeze(2)?;

        let masked = embeddings.broadcast_mul(&mask)?;
        let sum = masked.sum(1)?;
        let count = mask.sum(1)?.clamp(1f32, f32::INFINITY)?;
        let mean = sum.broadcast_div(&count)?;

        Ok(mean.squeeze(0)?)
    }

    /// L2-normalize the embedding vector.
    fn normalize(&self, tensor: &Tensor) -> Result<Tensor, Box<dyn Error>> {
        let norm = tensor.sqr()?.sum_all()?.sqrt()?;
        Ok(tensor.broadcast_div(&norm)?)
    }
}

impl Embedder for MiniLmEmbedder {
    /// Tokenize (truncating at 512 tokens), run the model, mean-pool, and
    /// normalize into a 384-d vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, Box<dyn Error>> {
        let tokens = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| format!("Tokenization error: {}", e))?;

        let token_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(tokens.get_type_ids(), &self.device)?.unsqueeze(0)?;

        let output = self.model.forward(&token_ids, &token_type_ids, None)?;

        let embedding = self.mean_pooling(&output, tokens.get_attention_mask())?;
        let embedding = self.normalize(&embedding)?;

        Ok(embedding.to_vec1::<f32>()?)
    }
}

/// One cached question/answer pair.
///
/// Created on every resolver invocation that did not hit an existing
/// near-duplicate. Immutable once written; there is no update or delete path.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Freshly generated unique identifier (UUID v4).
    pub id: String,
    /// The raw question as the user asked it.
    pub question: String,
    /// The answer that was resolved for it.
    pub answer: String,
}

/// Result of a nearest-neighbor lookup. Ephemeral, produced per query.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheMatch {
    /// The nearest previously cached question.
    pub question: String,
    /// Its stored answer.
    pub answer: String,
    /// Squared Euclidean distance between the query and the cached question
    /// (lower = more similar). Hora's `Metric::Euclidean` skips the final
    /// square root, so this is the sum of squared component differences.
    pub distance: f32,
}

/// In-memory semantic cache over previously answered questions.
///
/// Internally holds a HNSW index, the embedding model behind the
/// [`Embedder`] seam, and a slot → [`CacheEntry`] map for recall.
pub struct SemanticCache {
    index: HNSWIndex<f32, usize>,
    dimension: usize,
    embedder: Box<dyn Embedder>,
    next_slot: usize,
    slot_to_entry: HashMap<usize, CacheEntry>,
}

impl SemanticCache {
    /// Create an empty cache with a fresh HNSW index.
    ///
    /// # Parameters
    /// - `dimension`: Dimensionality of the vectors the embedder produces
    ///   ([`EMBEDDING_DIMENSION`] for MiniLM).
    /// - `embedder`: The sentence-embedding implementation to use.
    pub fn new(dimension: usize, embedder: Box<dyn Embedder>) -> Self {
        Self {
            index: HNSWIndex::new(dimension, &HNSWParams::default()),
            dimension,
            embedder,
            next_slot: 0,
            slot_to_entry: HashMap::new(),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.slot_to_entry.len()
    }

    /// `true` when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.slot_to_entry.is_empty()
    }

    /// Query the cache for the single nearest previously cached question.
    ///
    /// Returns `Ok(None)` when the cache is empty. The caller decides whether
    /// the returned distance is close enough to reuse the stored answer.
    ///
    /// # Errors
    /// Propagates embedding failures and rejects vectors of the wrong
    /// dimensionality.
    pub fn lookup(&self, question: &str) -> Result<Option<CacheMatch>, Box<dyn Error>> {
        if self.is_empty() {
            return Ok(None);
        }

        let vector = self.embedder.embed(question)?;
        if vector.len() != self.dimension {
            return Err("dimension mismatch".into());
        }

        let neighbors = self.index.search_nodes(&vector, 1);
        let nearest = neighbors.first().map(|pair| {
            let (node, distance): &(Node<f32, usize>, f32) = pair;
            (*node.idx(), *distance)
        });

        match nearest {
            Some((Some(slot), distance)) => {
                let entry = self
                    .slot_to_entry
                    .get(&slot)
                    .ok_or("cache slot missing its entry")?;

                Ok(Some(CacheMatch {
                    question: entry.question.clone(),
                    answer: entry.answer.clone(),
                    distance,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Persist a question/answer pair as a new cache entry.
    ///
    /// Embeds the question, assigns a fresh UUID, adds the vector to the
    /// index, and rebuilds the index so subsequent lookups see the new entry.
    ///
    /// # Returns
    /// The generated entry identifier.
    ///
    /// # Errors
    /// Propagates embedding failures; `"index add failed"` / `"index build
    /// failed"` if the HNSW index rejects the insert (rare).
    pub fn insert(&mut self, question: &str, answer: &str) -> Result<String, Box<dyn Error>> {
        let vector = self.embedder.embed(question)?;
        if vector.len() != self.dimension {
            return Err("dimension mismatch".into());
        }

        let slot = self.next_slot;
        self.index.add(&vector, slot).map_err(|_| "index add failed")?;
        self.index
            .build(Metric::Euclidean)
            .map_err(|_| "index build failed")?;

        let id = Uuid::new_v4().to_string();
        self.slot_to_entry.insert(
            slot,
            CacheEntry {
                id: id.clone(),
                question: question.to_string(),
                answer: answer.to_string(),
            },
        );
        self.next_slot += 1;

        Ok(id)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FixtureEmbedder;
    use super::*;

    fn small_cache() -> SemanticCache {
        let embedder = FixtureEmbedder::new(4)
            .with("why is the sky blue", vec![1.0, 0.0, 0.0, 0.0])
            .with("why is the sky so blue", vec![0.95, 0.0, 0.0, 0.0])
            .with("what do pandas eat", vec![0.0, 1.0, 0.0, 0.0]);
        SemanticCache::new(4, Box::new(embedder))
    }

    #[test]
    fn lookup_on_empty_cache_returns_none() {
        let cache = small_cache();
        let hit = cache.lookup("why is the sky blue").unwrap();
        assert!(hit.is_none());
    }

    #[test]
    fn lookup_finds_the_nearest_question_and_distance() {
        let mut cache = small_cache();
        cache
            .insert("why is the sky blue", "Sunlight scatters in the air.")
            .unwrap();
        cache.insert("what do pandas eat", "Mostly bamboo.").unwrap();

        let hit = cache.lookup("why is the sky so blue").unwrap().unwrap();
        assert_eq!(hit.question, "why is the sky blue");
        assert_eq!(hit.answer, "Sunlight scatters in the air.");
        // Vectors differ by 0.05 in one component; the squared metric
        // reports 0.05^2 = 0.0025.
        assert!((hit.distance - 0.0025).abs() < 1e-4);
    }

    #[test]
    fn insert_assigns_distinct_ids() {
        let mut cache = small_cache();
        let a = cache.insert("why is the sky blue", "answer a").unwrap();
        let b = cache.insert("what do pandas eat", "answer b").unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn entries_accumulate_without_eviction() {
        let mut cache = small_cache();
        cache.insert("why is the sky blue", "a").unwrap();
        cache.insert("what do pandas eat", "b").unwrap();
        cache.insert("why is the sky so blue", "c").unwrap();
        assert_eq!(cache.len(), 3);
        assert!(!cache.is_empty());
    }
}
