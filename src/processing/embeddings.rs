//! Dense text embeddings and the semantic similarity score built on them

use crate::error::{MatcherError, Result};
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// Maximum number of tokens any backend looks at per text.
pub const MAX_SEQUENCE_LENGTH: usize = 512;

/// Cached embeddings kept before the cache is emptied and refilled.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// A model that turns text into a fixed-size dense vector.
///
/// Implementations are shared between threads behind an `Arc` and must be
/// deterministic for a given model and input.
pub trait EmbeddingBackend: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn name(&self) -> &str;
}

/// Model2Vec static embeddings, mean pooled over the token vectors.
pub struct StaticEmbedder {
    model: StaticModel,
    model_name: String,
}

impl StaticEmbedder {
    pub fn load(model_path: &Path) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(model_path, None, None, None).map_err(|e| {
            MatcherError::ResourceInitialization(format!(
                "Failed to load Model2Vec model from {}: {}",
                model_path.display(),
                e
            ))
        })?;

        info!("Model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: model_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "model2vec".to_string()),
        })
    }
}

impl EmbeddingBackend for StaticEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.model.encode_with_args(
            &[text.to_string()],
            Some(MAX_SEQUENCE_LENGTH),
            1,
        );
        embeddings
            .pop()
            .ok_or_else(|| MatcherError::Embedding("Model2Vec returned no embedding".to_string()))
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub enabled: bool,
    pub cache_size: usize,
    pub model_name: String,
}

/// A backend plus an optional text -> embedding cache.
///
/// The cache only ever stores what the backend returned for the exact same
/// text, so it never changes results. It holds at most `capacity` entries and
/// is emptied when an insert would exceed that.
pub struct EmbeddingEngine {
    backend: Arc<dyn EmbeddingBackend>,
    cache: Option<RwLock<HashMap<String, Vec<f32>>>>,
    capacity: usize,
}

impl EmbeddingEngine {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, enable_caching: bool) -> Self {
        Self {
            backend,
            cache: enable_caching.then(|| RwLock::new(HashMap::new())),
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let Some(cache) = &self.cache else {
            return self.backend.embed(text);
        };

        if let Some(hit) = cache.read().unwrap_or_else(PoisonError::into_inner).get(text) {
            return Ok(hit.clone());
        }

        let start_time = Instant::now();
        let embedding = self.backend.embed(text)?;
        debug!(
            "Embedded {} chars with {} in {:.2?}",
            text.len(),
            self.backend.name(),
            start_time.elapsed()
        );

        let mut entries = cache.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.capacity {
            debug!("Embedding cache reached {} entries, clearing it", entries.len());
            entries.clear();
        }
        entries.insert(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.cache.is_some(),
            cache_size: self
                .cache
                .as_ref()
                .map(|c| c.read().unwrap_or_else(PoisonError::into_inner).len())
                .unwrap_or(0),
            model_name: self.backend.name().to_string(),
        }
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }
}

/// Cosine similarity of two vectors; zero-norm input gives 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(MatcherError::Computation(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot_product / (norm_a * norm_b))
}

/// Research-alignment score: cosine similarity of two texts' embeddings, clipped to [0, 1].
pub struct SemanticScorer {
    engine: EmbeddingEngine,
}

impl SemanticScorer {
    pub fn new(engine: EmbeddingEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EmbeddingEngine {
        &self.engine
    }

    /// Embedding of `text`, or `None` when it is blank
    pub fn embed_text(&self, text: &str) -> Result<Option<Vec<f32>>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.engine.embed(text).map(Some)
    }

    pub fn score(&self, a: &str, b: &str) -> Result<f32> {
        let a = self.embed_text(a)?;
        self.score_against(a.as_deref(), b)
    }

    /// Score `text` against an embedding computed earlier with [`Self::embed_text`]
    pub fn score_against(&self, embedding: Option<&[f32]>, text: &str) -> Result<f32> {
        let Some(embedding) = embedding else {
            return Ok(0.0);
        };
        let Some(other) = self.embed_text(text)? else {
            return Ok(0.0);
        };

        let similarity = cosine_similarity(embedding, &other)?;
        if !similarity.is_finite() {
            return Err(MatcherError::Computation(format!(
                "Non-finite cosine similarity: {}",
                similarity
            )));
        }
        Ok(similarity.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and maps each text to a vector of its letter frequencies
    struct LetterBackend {
        calls: AtomicUsize,
    }

    impl EmbeddingBackend for LetterBackend {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0; 26];
            for c in text.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
            Ok(v)
        }

        fn name(&self) -> &str {
            "letters"
        }
    }

    fn letter_backend() -> Arc<LetterBackend> {
        Arc::new(LetterBackend {
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap() - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_cache_avoids_repeat_backend_calls() {
        let backend = letter_backend();
        let engine = EmbeddingEngine::new(backend.clone(), true);

        let first = engine.embed("neural networks").unwrap();
        let second = engine.embed("neural networks").unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.cache_stats().cache_size, 1);

        engine.clear_cache();
        assert_eq!(engine.cache_stats().cache_size, 0);
    }

    #[test]
    fn test_cache_never_exceeds_capacity() {
        let backend = letter_backend();
        let engine = EmbeddingEngine::new(backend.clone(), true).with_cache_capacity(2);

        for text in ["alpha", "beta", "gamma", "delta", "epsilon"] {
            engine.embed(text).unwrap();
            assert!(engine.cache_stats().cache_size <= 2);
        }

        engine.embed("epsilon").unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_cache_disabled_calls_backend_each_time() {
        let backend = letter_backend();
        let engine = EmbeddingEngine::new(backend.clone(), false);

        engine.embed("vision").unwrap();
        engine.embed("vision").unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(!engine.cache_stats().enabled);
    }

    #[test]
    fn test_blank_text_scores_zero() {
        let scorer = SemanticScorer::new(EmbeddingEngine::new(letter_backend(), true));

        assert_eq!(scorer.score("", "robotics").unwrap(), 0.0);
        assert_eq!(scorer.score("robotics", "   ").unwrap(), 0.0);
    }

    #[test]
    fn test_identical_text_scores_one() {
        let scorer = SemanticScorer::new(EmbeddingEngine::new(letter_backend(), true));
        let score = scorer.score("protein folding", "protein folding").unwrap();

        assert!((score - 1.0).abs() < 1e-6);
    }
}
