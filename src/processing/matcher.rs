//! Supervisor ranking: runs the four scorers per supervisor and orders the results

use crate::error::{MatcherError, Result};
use crate::processing::domain_overlap::{DomainOverlapScorer, NEUTRAL_DOMAIN_SCORE};
use crate::processing::embeddings::{EmbeddingBackend, EmbeddingEngine, SemanticScorer};
use crate::processing::methodology::{methodology_score, MethodologyExtractor, NEUTRAL_METHODOLOGY_SCORE};
use crate::processing::profile::{MatchResult, ProjectDescription, SupervisorProfile};
use crate::processing::scoring::{DetailedScores, DomainWeights};
use crate::processing::skills::{SkillExtractor, SkillOverlap};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Research alignment when it cannot be computed.
pub const NEUTRAL_RESEARCH_SCORE: f32 = 0.0;
/// Technical skills when they cannot be computed.
pub const NEUTRAL_TECHNICAL_SCORE: f32 = 0.0;

/// Everything derived from the student text once per matching run.
struct StudentSignals {
    text: String,
    embedding: Option<Vec<f32>>,
    skills: BTreeSet<&'static str>,
    methodology: Vec<&'static str>,
}

pub struct SupervisorMatcher {
    semantic: SemanticScorer,
    skills: SkillExtractor,
    methodology: MethodologyExtractor,
    domain: DomainOverlapScorer,
    weights: DomainWeights,
}

pub struct MatcherBuilder {
    backend: Option<Arc<dyn EmbeddingBackend>>,
    weights: DomainWeights,
    enable_caching: bool,
}

impl Default for MatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatcherBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            weights: DomainWeights::default(),
            enable_caching: true,
        }
    }

    pub fn backend(mut self, backend: Arc<dyn EmbeddingBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn weights(mut self, weights: DomainWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Keep embeddings of texts seen before, across calls on the built matcher.
    ///
    /// The cache lives as long as the matcher and holds at most
    /// [`DEFAULT_CACHE_CAPACITY`](crate::processing::embeddings::DEFAULT_CACHE_CAPACITY) texts; see [`EmbeddingEngine`].
    pub fn enable_caching(mut self, enable_caching: bool) -> Self {
        self.enable_caching = enable_caching;
        self
    }

    pub fn build(self) -> Result<SupervisorMatcher> {
        let backend = self.backend.ok_or_else(|| {
            MatcherError::ResourceInitialization("No embedding backend configured".to_string())
        })?;
        self.weights.validate()?;

        Ok(SupervisorMatcher {
            semantic: SemanticScorer::new(EmbeddingEngine::new(backend, self.enable_caching)),
            skills: SkillExtractor::new()?,
            methodology: MethodologyExtractor::new()?,
            domain: DomainOverlapScorer::new(),
            weights: self.weights,
        })
    }
}

impl SupervisorMatcher {
    pub fn builder() -> MatcherBuilder {
        MatcherBuilder::new()
    }

    pub fn weights(&self) -> &DomainWeights {
        &self.weights
    }

    pub fn engine(&self) -> &EmbeddingEngine {
        self.semantic.engine()
    }

    /// Rank `supervisors` for `project`, best first.
    ///
    /// Returns one result per supervisor. Ties keep their input order.
    pub fn match_supervisors(
        &self,
        project: &ProjectDescription,
        supervisors: &[SupervisorProfile],
    ) -> Vec<MatchResult> {
        self.match_text(&project.matching_text(), supervisors)
    }

    /// Rank `supervisors` against raw student text
    pub fn match_text(&self, student_text: &str, supervisors: &[SupervisorProfile]) -> Vec<MatchResult> {
        if supervisors.is_empty() {
            return Vec::new();
        }

        let start_time = Instant::now();
        let student = self.student_signals(student_text);

        let mut results: Vec<MatchResult> = supervisors
            .iter()
            .map(|supervisor| self.score_supervisor(&student, supervisor))
            .collect();

        results.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

        info!(
            "Matched {} supervisors in {:.2?}",
            results.len(),
            start_time.elapsed()
        );
        results
    }

    fn student_signals(&self, text: &str) -> StudentSignals {
        let embedding = match self.semantic.embed_text(text) {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Could not embed student text, research alignment falls back to neutral: {}", e);
                None
            }
        };

        StudentSignals {
            text: text.to_string(),
            embedding,
            skills: SkillExtractor::flatten(&self.skills.extract_skills(text)),
            methodology: self.methodology.extract_methodology(text),
        }
    }

    fn score_supervisor(&self, student: &StudentSignals, supervisor: &SupervisorProfile) -> MatchResult {
        if !supervisor.has_interests() {
            debug!("Supervisor '{}' has no research interests, using neutral scores", supervisor.name);
            let detailed_scores = DetailedScores {
                research_alignment: NEUTRAL_RESEARCH_SCORE,
                methodology_match: NEUTRAL_METHODOLOGY_SCORE,
                technical_skills: NEUTRAL_TECHNICAL_SCORE,
                domain_knowledge: NEUTRAL_DOMAIN_SCORE,
            };
            return self.assemble(supervisor, detailed_scores, BTreeSet::new(), Vec::new());
        }

        let interests = supervisor.interests_text();

        let research_alignment = guarded(
            "research_alignment",
            &supervisor.name,
            NEUTRAL_RESEARCH_SCORE,
            self.semantic.score_against(student.embedding.as_deref(), interests),
        );

        let supervisor_methodology = self.methodology.extract_methodology(interests);
        let methodology_match = guarded(
            "methodology_match",
            &supervisor.name,
            NEUTRAL_METHODOLOGY_SCORE,
            Ok(methodology_score(&student.methodology, &supervisor_methodology)),
        );

        let supervisor_skills = SkillExtractor::flatten(&self.skills.extract_skills(interests));
        let overlap = SkillOverlap::between(&student.skills, &supervisor_skills);
        let technical_skills = guarded(
            "technical_skills",
            &supervisor.name,
            NEUTRAL_TECHNICAL_SCORE,
            Ok(overlap.score),
        );

        let domain_knowledge = guarded(
            "domain_knowledge",
            &supervisor.name,
            NEUTRAL_DOMAIN_SCORE,
            Ok(self.domain.score(&student.text, interests)),
        );

        let detailed_scores = DetailedScores {
            research_alignment,
            methodology_match,
            technical_skills,
            domain_knowledge,
        };

        self.assemble(
            supervisor,
            detailed_scores,
            overlap.shared.iter().map(|s| s.to_string()).collect(),
            supervisor_methodology.iter().map(|m| m.to_string()).collect(),
        )
    }

    fn assemble(
        &self,
        supervisor: &SupervisorProfile,
        detailed_scores: DetailedScores,
        matching_skills: BTreeSet<String>,
        methodology_overlap: Vec<String>,
    ) -> MatchResult {
        let final_score = self.weights.combine(&detailed_scores).clamp(0.0, 1.0);

        MatchResult {
            supervisor_id: supervisor.id.clone(),
            supervisor_name: supervisor.name.clone(),
            department: supervisor.department.clone(),
            final_score,
            detailed_scores,
            matching_skills,
            methodology_overlap,
        }
    }
}

/// A sub-score in [0, 1], or `neutral` with a warning when it failed or is not finite
fn guarded(signal: &str, supervisor: &str, neutral: f32, outcome: Result<f32>) -> f32 {
    match outcome {
        Ok(value) if value.is_finite() => value.clamp(0.0, 1.0),
        Ok(value) => {
            warn!(
                "Non-finite {} for '{}' ({}), using {}",
                signal, supervisor, value, neutral
            );
            neutral
        }
        Err(e) => {
            warn!("{} failed for '{}': {}, using {}", signal, supervisor, e, neutral);
            neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    impl EmbeddingBackend for FailingBackend {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(MatcherError::Embedding("backend offline".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct NanBackend;

    impl EmbeddingBackend for NanBackend {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![f32::NAN, 1.0])
        }

        fn name(&self) -> &str {
            "nan"
        }
    }

    fn supervisors() -> Vec<SupervisorProfile> {
        vec![
            SupervisorProfile::new("a", "Dr. A", "deep learning, pytorch, tensorflow"),
            SupervisorProfile::new("b", "Dr. B", "blockchain, solidity"),
        ]
    }

    #[test]
    fn test_builder_requires_backend() {
        let err = SupervisorMatcher::builder().build().err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_builder_rejects_invalid_weights() {
        let weights = DomainWeights {
            research_alignment: 0.9,
            methodology_match: 0.9,
            technical_skills: 0.0,
            domain_knowledge: 0.0,
        };
        let result = SupervisorMatcher::builder()
            .backend(Arc::new(FailingBackend))
            .weights(weights)
            .build();

        assert!(matches!(result, Err(MatcherError::Configuration(_))));
    }

    #[test]
    fn test_failing_backend_falls_back_to_neutral_research() {
        let matcher = SupervisorMatcher::builder()
            .backend(Arc::new(FailingBackend))
            .build()
            .unwrap();
        let results = matcher.match_text("python, pytorch, tensorflow", &supervisors());

        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.detailed_scores.research_alignment, NEUTRAL_RESEARCH_SCORE);
        }
        assert_eq!(results[0].supervisor_id, "a");
    }

    #[test]
    fn test_non_finite_similarity_is_replaced() {
        let matcher = SupervisorMatcher::builder()
            .backend(Arc::new(NanBackend))
            .build()
            .unwrap();
        let results = matcher.match_text("python", &supervisors());

        for result in &results {
            assert_eq!(result.detailed_scores.research_alignment, NEUTRAL_RESEARCH_SCORE);
            assert!(result.final_score.is_finite());
        }
    }

    #[test]
    fn test_guarded_clamps_and_defaults() {
        assert_eq!(guarded("x", "s", 0.5, Ok(1.7)), 1.0);
        assert_eq!(guarded("x", "s", 0.5, Ok(f32::INFINITY)), 0.5);
        assert_eq!(
            guarded("x", "s", 0.5, Err(MatcherError::Computation("boom".into()))),
            0.5
        );
    }
}
