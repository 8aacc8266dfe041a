//! Research methodology detection and methodology-match scoring

use crate::error::Result;
use crate::processing::taxonomy::{KeywordTaxonomy, TaxonomyTable, RESEARCH_METHODOLOGIES};
use std::collections::BTreeSet;

/// Score used when either side declares no recognisable methodology.
pub const NEUTRAL_METHODOLOGY_SCORE: f32 = 0.5;

pub struct MethodologyExtractor {
    taxonomy: KeywordTaxonomy,
}

impl MethodologyExtractor {
    pub fn new() -> Result<Self> {
        Self::with_taxonomy(RESEARCH_METHODOLOGIES)
    }

    pub fn with_taxonomy(table: TaxonomyTable) -> Result<Self> {
        Ok(Self {
            taxonomy: KeywordTaxonomy::new(table)?,
        })
    }

    /// Categories present in `text`, in taxonomy order, each at most once
    pub fn extract_methodology(&self, text: &str) -> Vec<&'static str> {
        let mut categories: Vec<&'static str> = Vec::new();
        for hit in self.taxonomy.scan(text) {
            if categories.last() != Some(&hit.category) {
                categories.push(hit.category);
            }
        }
        categories
    }

    pub fn score(&self, student_text: &str, supervisor_text: &str) -> f32 {
        methodology_score(
            &self.extract_methodology(student_text),
            &self.extract_methodology(supervisor_text),
        )
    }
}

/// Either side empty -> neutral, else |S ∩ P| / max(|S|, |P|)
pub fn methodology_score(student: &[&'static str], supervisor: &[&'static str]) -> f32 {
    let student: BTreeSet<_> = student.iter().collect();
    let supervisor: BTreeSet<_> = supervisor.iter().collect();

    if student.is_empty() || supervisor.is_empty() {
        return NEUTRAL_METHODOLOGY_SCORE;
    }

    let common = student.intersection(&supervisor).count();
    common as f32 / student.len().max(supervisor.len()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_recorded_once() {
        let extractor = MethodologyExtractor::new().unwrap();
        let methods = extractor.extract_methodology(
            "An empirical study using statistical analysis and quantitative methods",
        );

        assert_eq!(methods, vec!["quantitative"]);
    }

    #[test]
    fn test_taxonomy_order_is_kept() {
        let extractor = MethodologyExtractor::new().unwrap();
        let methods = extractor.extract_methodology(
            "Experimental design with triangulation, plus Case Study work and statistical analysis",
        );

        assert_eq!(methods, vec!["quantitative", "qualitative", "mixed_methods", "experimental"]);
    }

    #[test]
    fn test_unspecified_methodology_is_neutral() {
        let extractor = MethodologyExtractor::new().unwrap();

        assert_eq!(extractor.score("a case study of hospitals", ""), 0.5);
        assert_eq!(extractor.score("no method here", "ethnography"), 0.5);
    }

    #[test]
    fn test_overlap_divides_by_larger_set() {
        let extractor = MethodologyExtractor::new().unwrap();
        let score = extractor.score(
            "statistical analysis and a case study",
            "quantitative methods only",
        );

        assert!((score - 0.5).abs() < 1e-6);
        assert_eq!(extractor.score("randomized trial", "controlled study"), 1.0);
    }
}
