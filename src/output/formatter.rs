//! Output formatters: console, plain text, JSON, Markdown and HTML

use crate::config::OutputFormat;
use crate::error::{MatcherError, Result};
use crate::output::report::{MatchReport, MatchStrength};
use crate::processing::profile::MatchResult;
use crate::processing::scoring::display_label;
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

const RULE_WIDTH: usize = 50;

/// Trait for rendering a match report
pub trait OutputFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Terminal output with optional colour and score bars
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// The classic plain-text matching report
pub struct TextFormatter;

/// JSON export of the raw matching data
pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

pub struct HtmlFormatter {
    include_styles: bool,
}

/// Dispatches a report to the formatter for the requested format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    text_formatter: TextFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Supervisor Matching Report for {{ student_name }}</title>
    {% if include_styles %}
    <style>
        body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; background: #f4f6f8; color: #222; }
        .container { max-width: 960px; margin: 0 auto; padding: 32px; }
        header { border-bottom: 3px solid #2b6cb0; margin-bottom: 24px; }
        .project { background: #fff; padding: 16px 20px; border-radius: 8px; margin-bottom: 24px; }
        .match { background: #fff; border-radius: 8px; padding: 20px; margin-bottom: 16px; box-shadow: 0 1px 3px rgba(0,0,0,0.08); }
        .match h3 { margin-top: 0; }
        .badge { display: inline-block; padding: 2px 10px; border-radius: 12px; font-size: 0.8em; color: #fff; }
        .strong { background: #2f855a; } .good { background: #38a169; }
        .moderate { background: #d69e2e; } .weak { background: #c53030; }
        .scores { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 12px; }
        .bar { background: #e2e8f0; border-radius: 4px; height: 8px; }
        .bar span { display: block; background: #2b6cb0; height: 8px; border-radius: 4px; }
        .metadata { color: #666; font-size: 0.85em; margin-top: 32px; }
    </style>
    {% endif %}
</head>
<body>
    <div class="container">
        <header>
            <h1>Supervisor Matching Report</h1>
            <p><strong>Student:</strong> {{ student_name }} | <strong>Project:</strong> {{ project_title }}</p>
        </header>

        <div class="project">
            <h2>Project Description</h2>
            <p>{{ project_description }}</p>
        </div>

        <h2>Top Matches</h2>
        {% if matches.is_empty() %}
        <p>No supervisors matched.</p>
        {% endif %}
        {% for m in matches %}
        <div class="match">
            <h3>{{ m.rank }}. {{ m.name }} <span class="badge {{ m.strength_class }}">{{ m.strength }}</span></h3>
            {% if !m.department.is_empty() %}<p>{{ m.department }}</p>{% endif %}
            <p><strong>Overall Score:</strong> {{ m.score }}</p>
            <div class="scores">
                {% for s in m.scores %}
                <div>
                    <div>{{ s.label }}: {{ s.value }}</div>
                    <div class="bar"><span style="width: {{ s.percent }}%"></span></div>
                </div>
                {% endfor %}
            </div>
            <p><strong>Matching Skills:</strong> {{ m.skills }}</p>
            <p><strong>Methodology Overlap:</strong> {{ m.methodology }}</p>
        </div>
        {% endfor %}

        <div class="metadata">
            <p>Generated {{ generated_at }} by supervisor-matcher v{{ version }} (matching version {{ matching_version }})</p>
            <p>Embedding model: {{ embedding_model }} | Supervisors scored: {{ total_candidates }}</p>
        </div>
    </div>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    include_styles: bool,
    student_name: String,
    project_title: String,
    project_description: String,
    matches: Vec<HtmlMatch>,
    generated_at: String,
    version: String,
    matching_version: String,
    embedding_model: String,
    total_candidates: usize,
}

struct HtmlMatch {
    rank: usize,
    name: String,
    department: String,
    score: String,
    strength: String,
    strength_class: String,
    scores: Vec<HtmlScore>,
    skills: String,
    methodology: String,
}

struct HtmlScore {
    label: String,
    value: String,
    percent: u32,
}

fn join_or_none<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let joined = items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "None found".to_string()
    } else {
        joined
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{}\n", title.color(Color::Blue).bold())
        } else {
            format!("\n{}\n", title)
        }
    }

    fn format_badge(&self, score: f32) -> String {
        let strength = MatchStrength::from_score(score);
        let color = match strength {
            MatchStrength::Strong => Color::Green,
            MatchStrength::Good => Color::BrightGreen,
            MatchStrength::Moderate => Color::Yellow,
            MatchStrength::Weak => Color::Red,
        };

        if self.use_colors {
            format!("[{}]", strength.label().color(color).bold())
        } else {
            format!("[{}]", strength.label())
        }
    }

    fn score_bar(score: f32) -> String {
        let filled = (score.clamp(0.0, 1.0) * 20.0).round() as usize;
        format!("{}{}", "#".repeat(filled), ".".repeat(20 - filled))
    }

    fn format_match(&self, rank: usize, m: &MatchResult, report: &MatchReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\n{}. {} {} {:.3}\n",
            rank,
            self.colorize(&m.supervisor_name, Color::Cyan),
            self.format_badge(m.final_score),
            m.final_score
        ));
        if let Some(department) = &m.department {
            output.push_str(&format!("   Department: {}\n", department));
        }

        let weights: Vec<f32> = report.metadata.weights.iter().map(|(_, w)| w).collect();
        for ((key, value), weight) in m.detailed_scores.iter().zip(weights) {
            if self.detailed {
                output.push_str(&format!(
                    "   {:<20} {:.3} {} (weight {:.0}%)\n",
                    display_label(key),
                    value,
                    Self::score_bar(value),
                    weight * 100.0
                ));
            } else {
                output.push_str(&format!("   {:<20} {:.3}\n", display_label(key), value));
            }
        }

        output.push_str(&format!("   Matching Skills: {}\n", join_or_none(&m.matching_skills)));
        output.push_str(&format!(
            "   Methodology Overlap: {}\n",
            join_or_none(&m.methodology_overlap)
        ));
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header(&format!(
            "SUPERVISOR MATCHES FOR {}",
            report.student.student_name.to_uppercase()
        )));
        output.push_str(&format!("Project: {}\n", report.student.project_title));
        if self.detailed {
            output.push_str(&format!("{}\n", report.student.matching_text()));
        }

        if report.matches.is_empty() {
            output.push_str(&format!(
                "\n{}\n",
                self.colorize("No supervisors matched.", Color::Yellow)
            ));
        }

        for (i, m) in report.matches.iter().enumerate() {
            output.push_str(&self.format_match(i + 1, m, report));
        }

        output.push_str(&format!(
            "\nShowing {} of {} supervisors | model: {} | {}ms\n",
            report.matches.len(),
            report.metadata.total_candidates,
            report.metadata.embedding_model,
            report.metadata.processing_time_ms
        ));
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl OutputFormatter for TextFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String> {
        let rule = "-".repeat(RULE_WIDTH);
        let mut lines = vec![
            format!("Matching Report for {}", report.student.student_name),
            "=".repeat(RULE_WIDTH),
            "\nProject Description:".to_string(),
            report.student.matching_text().trim().to_string(),
            "\nTop Matches:".to_string(),
            rule.clone(),
        ];

        for (i, m) in report.matches.iter().enumerate() {
            lines.push(format!(
                "\n{}. {} (Overall Score: {:.3})",
                i + 1,
                m.supervisor_name,
                m.final_score
            ));
            lines.push("\nDetailed Scores:".to_string());
            for (key, value) in m.detailed_scores.iter() {
                lines.push(format!("- {}: {:.3}", display_label(key), value));
            }
            lines.push("\nMatching Skills:".to_string());
            lines.push(join_or_none(&m.matching_skills));
            lines.push("\nMethodology Overlap:".to_string());
            lines.push(join_or_none(&m.methodology_overlap));
            lines.push(format!("\n{}", rule));
        }

        Ok(lines.join("\n"))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Text
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String> {
        let mut md = String::new();

        md.push_str(&format!("# Supervisor Matching Report: {}\n\n", report.student.student_name));
        md.push_str(&format!("**Project:** {}\n\n", report.student.project_title));
        md.push_str("## Project Description\n\n");
        md.push_str(&format!("{}\n\n", report.student.matching_text().replace('\n', "  \n")));

        md.push_str("## Ranking\n\n");
        md.push_str("| Rank | Supervisor | Score | Research | Methodology | Skills | Domain |\n");
        md.push_str("|-----:|------------|------:|---------:|------------:|-------:|-------:|\n");
        for (i, m) in report.matches.iter().enumerate() {
            let s = &m.detailed_scores;
            md.push_str(&format!(
                "| {} | {} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} |\n",
                i + 1,
                m.supervisor_name,
                m.final_score,
                s.research_alignment,
                s.methodology_match,
                s.technical_skills,
                s.domain_knowledge
            ));
        }
        md.push('\n');

        for (i, m) in report.matches.iter().enumerate() {
            md.push_str(&format!("### {}. {}\n\n", i + 1, m.supervisor_name));
            if let Some(department) = &m.department {
                md.push_str(&format!("*{}*\n\n", department));
            }
            md.push_str(&format!(
                "- **Overall Score:** {:.3} ({})\n",
                m.final_score,
                MatchStrength::from_score(m.final_score).label()
            ));
            md.push_str(&format!("- **Matching Skills:** {}\n", join_or_none(&m.matching_skills)));
            md.push_str(&format!(
                "- **Methodology Overlap:** {}\n\n",
                join_or_none(&m.methodology_overlap)
            ));
        }

        if self.include_metadata {
            md.push_str("---\n\n");
            md.push_str(&format!(
                "*Generated {} by supervisor-matcher v{} using {}. {} of {} supervisors shown.*\n",
                report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.tool_version,
                report.metadata.embedding_model,
                report.matches.len(),
                report.metadata.total_candidates
            ));
        }

        Ok(md)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }

    fn create_template_data(&self, report: &MatchReport) -> HtmlTemplate {
        let matches = report
            .matches
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let strength = MatchStrength::from_score(m.final_score);
                HtmlMatch {
                    rank: i + 1,
                    name: m.supervisor_name.clone(),
                    department: m.department.clone().unwrap_or_default(),
                    score: format!("{:.3}", m.final_score),
                    strength: strength.label().to_string(),
                    strength_class: strength.label().to_lowercase(),
                    scores: m
                        .detailed_scores
                        .iter()
                        .map(|(key, value)| HtmlScore {
                            label: display_label(key),
                            value: format!("{:.3}", value),
                            percent: (value.clamp(0.0, 1.0) * 100.0).round() as u32,
                        })
                        .collect(),
                    skills: join_or_none(&m.matching_skills),
                    methodology: join_or_none(&m.methodology_overlap),
                }
            })
            .collect();

        HtmlTemplate {
            include_styles: self.include_styles,
            student_name: report.student.student_name.clone(),
            project_title: report.student.project_title.clone(),
            project_description: report.student.description.clone(),
            matches,
            generated_at: report.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            version: report.metadata.tool_version.clone(),
            matching_version: report.matching_version.clone(),
            embedding_model: report.metadata.embedding_model.clone(),
            total_candidates: report.metadata.total_candidates,
        }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &MatchReport) -> Result<String> {
        self.create_template_data(report)
            .render()
            .map_err(|e| MatcherError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false)
    }

    pub fn with_options(use_colors: bool, detailed: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            text_formatter: TextFormatter,
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
            html_formatter: HtmlFormatter::new(true),
        }
    }

    pub fn generate_report(&self, report: &MatchReport, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Text => self.text_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
            OutputFormat::Html => self.html_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: OutputFormat, report: &MatchReport) -> String {
    let extension = match format {
        OutputFormat::Console | OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
        OutputFormat::Html => "html",
    };
    format!("{}.{}", report.suggested_file_stem(), extension)
}
