//! Report structures built from ranked match results

use crate::processing::profile::{MatchResult, ProjectDescription};
use crate::processing::scoring::DomainWeights;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version tag carried by exported matching data.
pub const MATCHING_VERSION: &str = "2.0";

/// Everything needed to render one matching run in any output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub student: ProjectDescription,
    /// Matches selected for display, best first
    pub matches: Vec<MatchResult>,
    pub timestamp: DateTime<Utc>,
    pub matching_version: String,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub embedding_model: String,
    pub weights: DomainWeights,
    /// Number of supervisors scored, before any display filtering
    pub total_candidates: usize,
    pub processing_time_ms: u64,
    pub tool_version: String,
}

/// Which ranked matches make it into the report.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// 0 keeps every match
    pub top_n: usize,
    pub min_score: f32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { top_n: 0, min_score: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrength {
    Strong,
    Good,
    Moderate,
    Weak,
}

impl MatchStrength {
    pub fn from_score(score: f32) -> Self {
        match score {
            s if s >= 0.7 => MatchStrength::Strong,
            s if s >= 0.5 => MatchStrength::Good,
            s if s >= 0.3 => MatchStrength::Moderate,
            _ => MatchStrength::Weak,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchStrength::Strong => "STRONG",
            MatchStrength::Good => "GOOD",
            MatchStrength::Moderate => "MODERATE",
            MatchStrength::Weak => "WEAK",
        }
    }
}

impl MatchReport {
    pub fn new(
        student: ProjectDescription,
        ranked: Vec<MatchResult>,
        options: ReportOptions,
        embedding_model: impl Into<String>,
        weights: DomainWeights,
        processing_time_ms: u64,
    ) -> Self {
        let total_candidates = ranked.len();
        let limit = if options.top_n == 0 { usize::MAX } else { options.top_n };

        let matches = ranked
            .into_iter()
            .filter(|m| m.final_score >= options.min_score)
            .take(limit)
            .collect();

        Self {
            student,
            matches,
            timestamp: Utc::now(),
            matching_version: MATCHING_VERSION.to_string(),
            metadata: ReportMetadata {
                embedding_model: embedding_model.into(),
                weights,
                total_candidates,
                processing_time_ms,
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn best_match(&self) -> Option<&MatchResult> {
        self.matches.first()
    }

    /// File name suggestion like `matching_data_ada_lovelace.json`
    pub fn suggested_file_stem(&self) -> String {
        format!(
            "matching_data_{}",
            self.student.student_name.trim().to_lowercase().replace(' ', "_")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::scoring::DetailedScores;
    use std::collections::BTreeSet;

    fn result(id: &str, score: f32) -> MatchResult {
        MatchResult {
            supervisor_id: id.to_string(),
            supervisor_name: format!("Dr. {}", id),
            department: None,
            final_score: score,
            detailed_scores: DetailedScores {
                research_alignment: score,
                methodology_match: 0.5,
                technical_skills: 0.0,
                domain_knowledge: 0.5,
            },
            matching_skills: BTreeSet::new(),
            methodology_overlap: Vec::new(),
        }
    }

    fn project() -> ProjectDescription {
        ProjectDescription::new("Ada Lovelace", "Engines", "Analytical engines")
    }

    #[test]
    fn test_top_n_and_min_score_filtering() {
        let ranked = vec![result("a", 0.8), result("b", 0.6), result("c", 0.2), result("d", 0.1)];
        let report = MatchReport::new(
            project(),
            ranked,
            ReportOptions { top_n: 3, min_score: 0.15 },
            "bert-base-uncased",
            DomainWeights::default(),
            12,
        );

        let ids: Vec<_> = report.matches.iter().map(|m| m.supervisor_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(report.metadata.total_candidates, 4);
        assert_eq!(report.best_match().unwrap().supervisor_id, "a");
    }

    #[test]
    fn test_zero_top_n_keeps_all() {
        let report = MatchReport::new(
            project(),
            vec![result("a", 0.8), result("b", 0.6)],
            ReportOptions::default(),
            "m",
            DomainWeights::default(),
            0,
        );

        assert_eq!(report.matches.len(), 2);
        assert_eq!(report.matching_version, "2.0");
        assert_eq!(report.suggested_file_stem(), "matching_data_ada_lovelace");
    }

    #[test]
    fn test_match_strength_bands() {
        assert_eq!(MatchStrength::from_score(0.75), MatchStrength::Strong);
        assert_eq!(MatchStrength::from_score(0.5), MatchStrength::Good);
        assert_eq!(MatchStrength::from_score(0.31), MatchStrength::Moderate);
        assert_eq!(MatchStrength::from_score(0.0), MatchStrength::Weak);
    }
}
