//! Shared helpers for integration tests

use std::sync::Arc;
use supervisor_matcher::processing::embeddings::EmbeddingBackend;
use supervisor_matcher::{Result, SupervisorMatcher, SupervisorProfile};

const DIMENSIONS: usize = 64;

/// Hashes lowercase word tokens into a fixed number of buckets.
///
/// Identical texts get identical vectors and texts with shared words get a
/// positive cosine, which is all the ranking tests rely on.
pub struct BagOfWordsBackend;

impl EmbeddingBackend for BagOfWordsBackend {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) as usize % DIMENSIONS;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

pub fn matcher() -> SupervisorMatcher {
    SupervisorMatcher::builder()
        .backend(Arc::new(BagOfWordsBackend))
        .build()
        .unwrap()
}

pub fn deep_learning_and_blockchain() -> Vec<SupervisorProfile> {
    vec![
        SupervisorProfile::new("b", "Dr. Blake", "blockchain, solidity"),
        SupervisorProfile::new("a", "Dr. Adams", "deep learning, pytorch, tensorflow"),
    ]
}
