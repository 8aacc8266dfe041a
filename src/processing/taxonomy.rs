//! Static keyword taxonomies compiled into Aho-Corasick automata

use crate::error::{MatcherError, Result};
use aho_corasick::{AhoCorasick, MatchKind};

/// Category name paired with its ordered keyword list.
pub type TaxonomyTable = &'static [(&'static str, &'static [&'static str])];

pub const TECHNICAL_SKILLS: TaxonomyTable = &[
    ("programming", &["python", "java", "c++", "r", "matlab"]),
    ("machine_learning", &["tensorflow", "pytorch", "scikit-learn", "keras"]),
    ("data_analysis", &["pandas", "numpy", "data mining", "statistical analysis"]),
    ("cloud", &["aws", "azure", "google cloud", "cloud computing"]),
];

pub const RESEARCH_METHODOLOGIES: TaxonomyTable = &[
    ("quantitative", &["statistical analysis", "empirical study", "quantitative methods"]),
    ("qualitative", &["qualitative analysis", "case study", "ethnography"]),
    ("mixed_methods", &["mixed methods", "triangulation", "multi-method"]),
    ("experimental", &["experimental design", "controlled study", "randomized trial"]),
];

/// A keyword that occurs somewhere in a scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyHit {
    pub category_index: usize,
    pub category: &'static str,
    pub keyword: &'static str,
}

/// Immutable lookup over one taxonomy table.
///
/// Matching is literal substring containment, case-insensitive, with
/// overlapping occurrences reported, so a short keyword such as `r` is found
/// inside longer words exactly as a plain `contains` check would find it.
pub struct KeywordTaxonomy {
    table: TaxonomyTable,
    automaton: AhoCorasick,
    pattern_owner: Vec<(usize, &'static str)>,
}

impl KeywordTaxonomy {
    pub fn new(table: TaxonomyTable) -> Result<Self> {
        let mut patterns = Vec::new();
        let mut pattern_owner = Vec::new();
        for (category_index, (_, keywords)) in table.iter().enumerate() {
            for keyword in keywords.iter() {
                patterns.push(*keyword);
                pattern_owner.push((category_index, *keyword));
            }
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| {
                MatcherError::ResourceInitialization(format!("Failed to build keyword taxonomy: {}", e))
            })?;

        Ok(Self {
            table,
            automaton,
            pattern_owner,
        })
    }

    /// Every distinct keyword present in `text`, in taxonomy order.
    pub fn scan(&self, text: &str) -> Vec<TaxonomyHit> {
        let lowered = text.to_lowercase();
        let mut seen = vec![false; self.pattern_owner.len()];
        for mat in self.automaton.find_overlapping_iter(&lowered) {
            seen[mat.pattern().as_usize()] = true;
        }

        seen.iter()
            .enumerate()
            .filter(|(_, found)| **found)
            .map(|(pattern_id, _)| {
                let (category_index, keyword) = self.pattern_owner[pattern_id];
                TaxonomyHit {
                    category_index,
                    category: self.table[category_index].0,
                    keyword,
                }
            })
            .collect()
    }

    pub fn categories(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.iter().map(|(name, _)| *name)
    }

    pub fn keyword_count(&self) -> usize {
        self.pattern_owner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_substrings_are_all_reported() {
        let taxonomy = KeywordTaxonomy::new(TECHNICAL_SKILLS).unwrap();
        let hits = taxonomy.scan("Cloud Computing on Google Cloud");
        let keywords: Vec<_> = hits.iter().map(|h| h.keyword).collect();

        assert!(keywords.contains(&"google cloud"));
        assert!(keywords.contains(&"cloud computing"));
        assert!(!keywords.contains(&"r"));
    }

    #[test]
    fn test_single_letter_keyword_is_substring_match() {
        let taxonomy = KeywordTaxonomy::new(TECHNICAL_SKILLS).unwrap();
        let hits = taxonomy.scan("PyTorch");

        assert!(hits.iter().any(|h| h.keyword == "pytorch"));
        assert!(hits.iter().any(|h| h.keyword == "r" && h.category == "programming"));
    }

    #[test]
    fn test_hits_follow_taxonomy_order() {
        let taxonomy = KeywordTaxonomy::new(RESEARCH_METHODOLOGIES).unwrap();
        let hits = taxonomy.scan("a randomized trial then a case study");
        let categories: Vec<_> = hits.iter().map(|h| h.category).collect();

        assert_eq!(categories, vec!["qualitative", "experimental"]);
        assert_eq!(taxonomy.keyword_count(), 12);
    }
}
