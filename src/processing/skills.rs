//! Technical skill extraction and skill-overlap scoring

use crate::error::Result;
use crate::processing::taxonomy::{KeywordTaxonomy, TaxonomyTable, TECHNICAL_SKILLS};
use std::collections::{BTreeMap, BTreeSet};

/// Skills found in a text, grouped by taxonomy category. Empty categories are absent.
pub type ExtractedSkills = BTreeMap<&'static str, BTreeSet<&'static str>>;

pub struct SkillExtractor {
    taxonomy: KeywordTaxonomy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillOverlap {
    pub score: f32,
    pub shared: BTreeSet<&'static str>,
}

impl SkillOverlap {
    pub fn between(student: &BTreeSet<&'static str>, supervisor: &BTreeSet<&'static str>) -> Self {
        let shared: BTreeSet<&'static str> = student.intersection(supervisor).copied().collect();
        let union = student.union(supervisor).count().max(1);

        Self {
            score: shared.len() as f32 / union as f32,
            shared,
        }
    }
}

impl SkillExtractor {
    pub fn new() -> Result<Self> {
        Self::with_taxonomy(TECHNICAL_SKILLS)
    }

    pub fn with_taxonomy(table: TaxonomyTable) -> Result<Self> {
        Ok(Self {
            taxonomy: KeywordTaxonomy::new(table)?,
        })
    }

    pub fn extract_skills(&self, text: &str) -> ExtractedSkills {
        let mut found = ExtractedSkills::new();
        for hit in self.taxonomy.scan(text) {
            found.entry(hit.category).or_default().insert(hit.keyword);
        }
        found
    }

    pub fn flatten(skills: &ExtractedSkills) -> BTreeSet<&'static str> {
        skills.values().flatten().copied().collect()
    }

    /// |S ∩ P| / max(|S ∪ P|, 1) over the flattened skill sets of both texts
    pub fn overlap(&self, student_text: &str, supervisor_text: &str) -> SkillOverlap {
        let student = Self::flatten(&self.extract_skills(student_text));
        let supervisor = Self::flatten(&self.extract_skills(supervisor_text));
        SkillOverlap::between(&student, &supervisor)
    }

    pub fn skill_count(&self) -> usize {
        self.taxonomy.keyword_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_groups_by_category() {
        let extractor = SkillExtractor::new().unwrap();
        let skills = extractor.extract_skills("Experienced in PyTorch, TensorFlow and AWS; some NumPy.");

        assert!(skills["machine_learning"].contains("pytorch"));
        assert!(skills["machine_learning"].contains("tensorflow"));
        assert!(skills["cloud"].contains("aws"));
        assert!(skills["data_analysis"].contains("numpy"));
    }

    #[test]
    fn test_empty_categories_are_omitted() {
        let extractor = SkillExtractor::new().unwrap();
        let skills = extractor.extract_skills("blockchain, solidity");

        assert!(skills.is_empty());
    }

    #[test]
    fn test_no_shared_skills_scores_zero() {
        let extractor = SkillExtractor::new().unwrap();
        let overlap = extractor.overlap("python, pytorch, tensorflow", "blockchain, solidity");

        assert_eq!(overlap.score, 0.0);
        assert!(overlap.shared.is_empty());
    }

    #[test]
    fn test_identical_skill_sets_score_one() {
        let extractor = SkillExtractor::new().unwrap();
        let overlap = extractor.overlap("keras and pandas", "Pandas, Keras");

        assert_eq!(overlap.score, 1.0);
    }

    #[test]
    fn test_both_empty_scores_zero() {
        let extractor = SkillExtractor::new().unwrap();
        let overlap = extractor.overlap("", "");

        assert_eq!(overlap.score, 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        let extractor = SkillExtractor::new().unwrap();
        // student: python, pytorch, tensorflow, r ; supervisor: pytorch, tensorflow, r
        let overlap = extractor.overlap("python pytorch tensorflow", "deep learning, pytorch, tensorflow");

        assert!(overlap.shared.contains("pytorch"));
        assert!(overlap.shared.contains("tensorflow"));
        assert!((overlap.score - 0.75).abs() < 1e-6);
    }
}
