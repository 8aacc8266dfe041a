//! Text extraction from project description files

use crate::error::{MatcherError, Result};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await?;

        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
            MatcherError::PdfExtraction(format!(
                "Failed to extract text from PDF '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path).await?)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown = fs::read_to_string(path).await?;
        Ok(MarkdownDocument::parse(&markdown).text)
    }
}

/// Plain text of a Markdown file plus its first top-level heading.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownDocument {
    pub title: Option<String>,
    pub text: String,
}

impl MarkdownDocument {
    pub fn parse(markdown: &str) -> Self {
        let mut title = None;
        let mut in_h1 = false;
        let mut heading = String::new();
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Heading(HeadingLevel::H1, ..)) if title.is_none() => {
                    in_h1 = true;
                    heading.clear();
                }
                Event::End(Tag::Heading(HeadingLevel::H1, ..)) if in_h1 => {
                    in_h1 = false;
                    title = Some(heading.trim().to_string()).filter(|t| !t.is_empty());
                    flush(&mut current, &mut lines);
                }
                Event::Text(text) | Event::Code(text) => {
                    if in_h1 {
                        heading.push_str(&text);
                    }
                    current.push_str(&text);
                }
                Event::SoftBreak => current.push(' '),
                Event::HardBreak => flush(&mut current, &mut lines),
                Event::End(Tag::Paragraph)
                | Event::End(Tag::Heading(..))
                | Event::End(Tag::Item)
                | Event::End(Tag::CodeBlock(_)) => flush(&mut current, &mut lines),
                _ => {}
            }
        }
        flush(&mut current, &mut lines);

        Self {
            title,
            text: lines.join("\n"),
        }
    }
}

fn flush(current: &mut String, lines: &mut Vec<String>) {
    let line = current.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_markdown_title_and_text() {
        let doc = MarkdownDocument::parse(
            "# Federated Imaging\n\nTrain models **across hospitals**\nwithout sharing data.\n\n- PyTorch\n- `numpy`\n",
        );

        assert_eq!(doc.title.as_deref(), Some("Federated Imaging"));
        assert_eq!(
            doc.text,
            "Federated Imaging\nTrain models across hospitals without sharing data.\nPyTorch\nnumpy"
        );
    }

    #[test]
    fn test_markdown_without_heading() {
        let doc = MarkdownDocument::parse("Just a paragraph.");

        assert!(doc.title.is_none());
        assert_eq!(doc.text, "Just a paragraph.");
    }

    #[tokio::test]
    async fn test_plain_text_extraction() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.txt");
        std::fs::write(&path, "Graph learning for drug discovery").unwrap();

        let text = PlainTextExtractor.extract(&path).await.unwrap();
        assert_eq!(text, "Graph learning for drug discovery");
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_extraction_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let err = PdfExtractor.extract(&path).await.err().unwrap();
        assert!(matches!(err, MatcherError::PdfExtraction(_)));
    }
}
