//! Loading project descriptions from files

use crate::error::{MatcherError, Result};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{
    MarkdownDocument, MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor,
};
use crate::processing::profile::ProjectDescription;
use crate::processing::text_processor::TextProcessor;
use log::{debug, info};
use std::path::Path;
use tokio::fs;

/// Project fields supplied alongside a description file, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct ProjectOverrides {
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub project_title: Option<String>,
    pub technical_requirements: Vec<String>,
    pub methodology: Option<String>,
}

pub struct InputManager {
    processor: TextProcessor,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            processor: TextProcessor::new(),
        }
    }

    /// Plain text of a PDF, Markdown or text file
    pub async fn extract_text(&self, path: &Path) -> Result<String> {
        Self::ensure_exists(path)?;

        let text = match FileType::from_path(path)? {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            }
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Json | FileType::Unknown => {
                return Err(MatcherError::UnsupportedFormat(format!(
                    "Cannot extract text from: {}",
                    path.display()
                )));
            }
        };

        Ok(self.processor.clean_text(&text))
    }

    /// Build a project from a JSON project file or a free-text description file.
    ///
    /// For JSON files the overrides replace the stored fields they set. For
    /// text files the description is the file's text and the title falls back
    /// to the first Markdown heading, then to the file name.
    pub async fn load_project(&self, path: &Path, overrides: ProjectOverrides) -> Result<ProjectDescription> {
        Self::ensure_exists(path)?;

        let mut project = match FileType::from_path(path)? {
            FileType::Json => {
                let content = fs::read_to_string(path).await?;
                serde_json::from_str::<ProjectDescription>(&content).map_err(|e| {
                    MatcherError::InputData(format!("Invalid project file {}: {}", path.display(), e))
                })?
            }
            FileType::Markdown => {
                let markdown = fs::read_to_string(path).await?;
                let doc = MarkdownDocument::parse(&markdown);
                let title = doc.title.unwrap_or_else(|| file_stem(path));
                ProjectDescription::new("", title, self.processor.clean_text(&doc.text))
            }
            _ => {
                let text = self.extract_text(path).await?;
                ProjectDescription::new("", file_stem(path), text)
            }
        };

        apply_overrides(&mut project, overrides);

        if project.student_name.trim().is_empty() {
            return Err(MatcherError::InvalidInput(
                "A student name is required (use --student)".to_string(),
            ));
        }
        if project.description.trim().is_empty() {
            return Err(MatcherError::InputData(format!(
                "Project description in {} is empty",
                path.display()
            )));
        }

        let stats = self.processor.process(&project.description)?;
        info!(
            "Loaded project '{}' for {}: {} words in {} sentences",
            project.project_title,
            project.student_name,
            stats.word_count,
            stats.sentences.len()
        );
        debug!("Description: {}", self.processor.preview(&project.description, 120));
        Ok(project)
    }

    fn ensure_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(MatcherError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }
        Ok(())
    }
}

fn apply_overrides(project: &mut ProjectDescription, overrides: ProjectOverrides) {
    if let Some(id) = overrides.student_id {
        project.student_id = Some(id);
    }
    if let Some(name) = overrides.student_name {
        project.student_name = name;
    }
    if let Some(title) = overrides.project_title {
        project.project_title = title;
    }
    if !overrides.technical_requirements.is_empty() {
        project.technical_requirements = overrides.technical_requirements;
    }
    if let Some(methodology) = overrides.methodology {
        project.methodology = Some(methodology);
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default()
}
