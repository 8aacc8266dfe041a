//! Weighted aggregation of the four matching signals

use crate::error::{MatcherError, Result};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

/// Relative importance of each signal in the final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainWeights {
    pub research_alignment: f32,
    pub methodology_match: f32,
    pub technical_skills: f32,
    pub domain_knowledge: f32,
}

impl Default for DomainWeights {
    fn default() -> Self {
        Self {
            research_alignment: 0.4,
            methodology_match: 0.3,
            technical_skills: 0.2,
            domain_knowledge: 0.1,
        }
    }
}

impl DomainWeights {
    pub fn new(
        research_alignment: f32,
        methodology_match: f32,
        technical_skills: f32,
        domain_knowledge: f32,
    ) -> Result<Self> {
        let weights = Self {
            research_alignment,
            methodology_match,
            technical_skills,
            domain_knowledge,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Each weight must lie in [0, 1] and together they must sum to 1
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.iter() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(MatcherError::Configuration(format!(
                    "Weight '{}' must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatcherError::Configuration(format!(
                "Weights must sum to 1.0, got {:.4}",
                sum
            )));
        }
        Ok(())
    }

    pub fn sum(&self) -> f32 {
        self.research_alignment + self.methodology_match + self.technical_skills + self.domain_knowledge
    }

    pub fn combine(&self, scores: &DetailedScores) -> f32 {
        self.research_alignment * scores.research_alignment
            + self.methodology_match * scores.methodology_match
            + self.technical_skills * scores.technical_skills
            + self.domain_knowledge * scores.domain_knowledge
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> {
        [
            ("research_alignment", self.research_alignment),
            ("methodology_match", self.methodology_match),
            ("technical_skills", self.technical_skills),
            ("domain_knowledge", self.domain_knowledge),
        ]
        .into_iter()
    }

    /// Set a single weight by name without re-validating the total
    pub fn set(&mut self, name: &str, value: f32) -> Result<()> {
        let slot = match name {
            "research_alignment" => &mut self.research_alignment,
            "methodology_match" => &mut self.methodology_match,
            "technical_skills" => &mut self.technical_skills,
            "domain_knowledge" => &mut self.domain_knowledge,
            other => {
                return Err(MatcherError::Configuration(format!(
                    "Unknown weight '{}'",
                    other
                )))
            }
        };
        *slot = value;
        Ok(())
    }
}

/// The four sub-scores of one match, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetailedScores {
    pub research_alignment: f32,
    pub methodology_match: f32,
    pub technical_skills: f32,
    pub domain_knowledge: f32,
}

impl DetailedScores {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> {
        [
            ("research_alignment", self.research_alignment),
            ("methodology_match", self.methodology_match),
            ("technical_skills", self.technical_skills),
            ("domain_knowledge", self.domain_knowledge),
        ]
        .into_iter()
    }
}

/// Human-readable label for a sub-score key, e.g. `research_alignment` -> `Research Alignment`
pub fn display_label(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        let weights = DomainWeights::default();
        assert!(weights.validate().is_ok());
        assert!((weights.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        assert!(DomainWeights::new(0.5, 0.5, 0.5, 0.0).is_err());
        assert!(DomainWeights::new(0.25, 0.25, 0.25, 0.25).is_ok());
    }

    #[test]
    fn test_weights_out_of_range_rejected() {
        assert!(DomainWeights::new(1.2, -0.2, 0.0, 0.0).is_err());
        assert!(DomainWeights::new(f32::NAN, 0.3, 0.2, 0.1).is_err());
    }

    #[test]
    fn test_combine_is_weighted_sum() {
        let weights = DomainWeights::default();
        let scores = DetailedScores {
            research_alignment: 0.8,
            methodology_match: 0.5,
            technical_skills: 0.25,
            domain_knowledge: 1.0,
        };

        let expected = 0.4 * 0.8 + 0.3 * 0.5 + 0.2 * 0.25 + 0.1 * 1.0;
        assert!((weights.combine(&scores) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_set_by_name() {
        let mut weights = DomainWeights::default();
        weights.set("domain_knowledge", 0.2).unwrap();
        weights.set("technical_skills", 0.1).unwrap();

        assert!(weights.validate().is_ok());
        assert!(weights.set("novelty", 0.1).is_err());
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("research_alignment"), "Research Alignment");
        assert_eq!(display_label("technical_skills"), "Technical Skills");
    }
}
