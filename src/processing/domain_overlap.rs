//! Domain-term overlap via a TF-IDF representation fitted on each text pair

use crate::processing::text_processor::TextProcessor;
use std::collections::{BTreeMap, BTreeSet};

/// Score used when either text has no weighted terms.
pub const NEUTRAL_DOMAIN_SCORE: f32 = 0.5;

/// Sparse TF-IDF row: term -> L2-normalised weight.
pub type TermVector = BTreeMap<String, f32>;

/// Smooth-idf TF-IDF vectorizer over stop-word filtered tokens.
///
/// The vocabulary and document frequencies come from the documents passed to
/// [`TfIdfVectorizer::fit_transform`] and nothing else.
pub struct TfIdfVectorizer<'a> {
    processor: &'a TextProcessor,
    idf: BTreeMap<String, f32>,
}

impl<'a> TfIdfVectorizer<'a> {
    pub fn new(processor: &'a TextProcessor) -> Self {
        Self {
            processor,
            idf: BTreeMap::new(),
        }
    }

    pub fn fit_transform(&mut self, documents: &[&str]) -> Vec<TermVector> {
        let term_counts: Vec<BTreeMap<String, usize>> = documents
            .iter()
            .map(|doc| {
                let mut counts = BTreeMap::new();
                for term in self.processor.content_terms(doc) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for counts in &term_counts {
            for term in counts.keys() {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f32;
        self.idf = document_frequency
            .into_iter()
            .map(|(term, df)| {
                let idf = ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0;
                (term.to_string(), idf)
            })
            .collect();

        term_counts
            .into_iter()
            .map(|counts| self.weigh(counts))
            .collect()
    }

    fn weigh(&self, counts: BTreeMap<String, usize>) -> TermVector {
        let mut row: TermVector = counts
            .into_iter()
            .map(|(term, tf)| {
                let idf = self.idf.get(&term).copied().unwrap_or(1.0);
                (term, tf as f32 * idf)
            })
            .collect();

        let norm = row.values().map(|w| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for weight in row.values_mut() {
                *weight /= norm;
            }
        }
        row
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }
}

pub struct DomainOverlapScorer {
    processor: TextProcessor,
}

impl Default for DomainOverlapScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainOverlapScorer {
    pub fn new() -> Self {
        Self {
            processor: TextProcessor::new(),
        }
    }

    /// Jaccard similarity of the weighted term sets of the two texts
    pub fn score(&self, student_text: &str, supervisor_text: &str) -> f32 {
        let mut vectorizer = TfIdfVectorizer::new(&self.processor);
        let rows = vectorizer.fit_transform(&[student_text, supervisor_text]);

        let student_terms = weighted_terms(&rows[0]);
        let supervisor_terms = weighted_terms(&rows[1]);

        if student_terms.is_empty() || supervisor_terms.is_empty() {
            return NEUTRAL_DOMAIN_SCORE;
        }

        let shared = student_terms.intersection(&supervisor_terms).count();
        let union = student_terms.union(&supervisor_terms).count();
        shared as f32 / union as f32
    }
}

fn weighted_terms(row: &TermVector) -> BTreeSet<&str> {
    row.iter()
        .filter(|(_, weight)| **weight > 0.0)
        .map(|(term, _)| term.as_str())
        .collect()
}
