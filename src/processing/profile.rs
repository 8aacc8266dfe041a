//! Project, supervisor and match result structures

use crate::processing::scoring::DetailedScores;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// A student's project submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescription {
    #[serde(default)]
    pub student_id: Option<String>,
    pub student_name: String,
    pub project_title: String,
    pub description: String,
    #[serde(default)]
    pub technical_requirements: Vec<String>,
    #[serde(default)]
    pub methodology: Option<String>,
}

impl ProjectDescription {
    pub fn new(student_name: impl Into<String>, project_title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            student_id: None,
            student_name: student_name.into(),
            project_title: project_title.into(),
            description: description.into(),
            technical_requirements: Vec::new(),
            methodology: None,
        }
    }

    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.technical_requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_methodology(mut self, methodology: impl Into<String>) -> Self {
        self.methodology = Some(methodology.into());
        self
    }

    pub fn with_student_id(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    /// The text every scorer sees for this project.
    ///
    /// Declared requirements and methodology are appended as their own lines
    /// so keyword extractors pick them up; undeclared ones are left out.
    pub fn matching_text(&self) -> String {
        let mut text = self.description.trim().to_string();

        let requirements: Vec<&str> = self
            .technical_requirements
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect();
        if !requirements.is_empty() {
            text.push_str(&format!("\nTechnical requirements: {}.", requirements.join(", ")));
        }

        if let Some(methodology) = self.methodology.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            text.push_str(&format!("\nResearch methodology: {}.", methodology));
        }

        text
    }

    /// Identifier used in history records, falling back to the student name
    pub fn student_key(&self) -> &str {
        self.student_id.as_deref().unwrap_or(&self.student_name)
    }
}

/// Read-only snapshot of a supervisor's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default, alias = "research_interests")]
    pub interests: Option<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
}

impl SupervisorProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, interests: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            department: None,
            interests: Some(interests.into()),
            expertise: Vec::new(),
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Research interests, or an empty string when none were recorded
    pub fn interests_text(&self) -> &str {
        self.interests.as_deref().unwrap_or("")
    }

    pub fn has_interests(&self) -> bool {
        !self.interests_text().trim().is_empty()
    }
}

/// Accepts `"42"` as well as `42`, since directory exports use both
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Ranked outcome for one supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub supervisor_id: String,
    pub supervisor_name: String,
    pub department: Option<String>,
    pub final_score: f32,
    pub detailed_scores: DetailedScores,
    pub matching_skills: BTreeSet<String>,
    /// Methodology categories found in the supervisor's interests, taxonomy order
    pub methodology_overlap: Vec<String>,
}

/// A match the student chose to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub student_id: String,
    pub supervisor_id: String,
    pub supervisor_name: String,
    pub final_score: f32,
    pub research_alignment: f32,
    pub methodology_match: f32,
    pub technical_skills: f32,
    pub domain_knowledge: f32,
    pub matching_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn from_result(student_id: &str, result: &MatchResult) -> Self {
        Self {
            student_id: student_id.to_string(),
            supervisor_id: result.supervisor_id.clone(),
            supervisor_name: result.supervisor_name.clone(),
            final_score: result.final_score,
            research_alignment: result.detailed_scores.research_alignment,
            methodology_match: result.detailed_scores.methodology_match,
            technical_skills: result.detailed_scores.technical_skills,
            domain_knowledge: result.detailed_scores.domain_knowledge,
            matching_skills: result.matching_skills.iter().cloned().collect(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_text_with_all_fields() {
        let project = ProjectDescription::new("Ada", "Imaging", "Segment tumours in MRI scans.")
            .with_requirements(["Python", "PyTorch"])
            .with_methodology("Experimental");

        assert_eq!(
            project.matching_text(),
            "Segment tumours in MRI scans.\nTechnical requirements: Python, PyTorch.\nResearch methodology: Experimental."
        );
    }

    #[test]
    fn test_matching_text_omits_undeclared_lines() {
        let project = ProjectDescription::new("Ada", "Imaging", "  Segment tumours.  ");

        assert_eq!(project.matching_text(), "Segment tumours.");
        assert_eq!(project.student_key(), "Ada");
    }

    #[test]
    fn test_supervisor_without_interests_deserializes() {
        let supervisor: SupervisorProfile =
            serde_json::from_str(r#"{"id": "s1", "name": "Dr. Grey"}"#).unwrap();

        assert_eq!(supervisor.interests_text(), "");
        assert!(!supervisor.has_interests());
        assert!(supervisor.expertise.is_empty());
    }

    #[test]
    fn test_research_interests_alias() {
        let supervisor: SupervisorProfile = serde_json::from_str(
            r#"{"id": "s2", "name": "Dr. Blue", "research_interests": "robotics"}"#,
        )
        .unwrap();

        assert_eq!(supervisor.interests_text(), "robotics");
    }

    #[test]
    fn test_numeric_supervisor_id() {
        let supervisor: SupervisorProfile =
            serde_json::from_str(r#"{"id": 12, "name": "Dr. Red", "interests": "optics"}"#).unwrap();

        assert_eq!(supervisor.id, "12");
    }
}
