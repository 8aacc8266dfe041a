//! CLI interface for the supervisor matcher

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "supervisor-matcher")]
#[command(version)]
#[command(about = "Rank research supervisors for a student project")]
#[command(long_about = "Match a student project against supervisor research interests using semantic similarity, methodology and skill keywords, and domain term overlap")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank supervisors for a project
    Match {
        /// Project file: description as PDF, TXT or MD, or a project JSON
        #[arg(short, long)]
        project: PathBuf,

        /// Supervisor directory (JSON array of profiles)
        #[arg(short, long)]
        supervisors: PathBuf,

        /// Student name
        #[arg(long)]
        student: Option<String>,

        /// Student identifier used in match history
        #[arg(long)]
        student_id: Option<String>,

        /// Project title
        #[arg(short, long)]
        title: Option<String>,

        /// Technical requirements, comma separated
        #[arg(long, value_delimiter = ',')]
        tech: Vec<String>,

        /// Primary research methodology
        #[arg(short, long)]
        methodology: Option<String>,

        /// Embedding backend: bert or model2vec
        #[arg(short, long)]
        backend: Option<String>,

        /// Embedding model to use
        #[arg(short, long)]
        embedding: Option<String>,

        /// Number of matches to show (0 for all)
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Output format: console, text, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to a file, or into a directory under a generated name
        #[arg(long)]
        save: Option<PathBuf>,

        /// Record the best match in this history file (JSON Lines)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Output detailed scores
        #[arg(short, long)]
        detailed: bool,
    },

    /// Show match history for a student
    History {
        /// History file (JSON Lines)
        file: PathBuf,

        /// Student identifier
        student: String,
    },

    /// Model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available models
    List {
        /// Show only downloaded models
        #[arg(long)]
        downloaded: bool,
    },

    /// Download a model
    Download {
        /// Model name or HuggingFace repo ID
        model: String,

        /// Force re-download if model exists
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a downloaded model
    Remove {
        /// Model name to remove
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Reset configuration to defaults
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "scoring.weights.research_alignment" or "output.top_n")
        key: String,

        /// Configuration value
        value: String,
    },
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_command_parses() {
        let cli = Cli::try_parse_from([
            "supervisor-matcher",
            "match",
            "--project",
            "proposal.md",
            "--supervisors",
            "staff.json",
            "--student",
            "Ada",
            "--tech",
            "Python,PyTorch",
            "-n",
            "5",
        ])
        .unwrap();

        match cli.command {
            Commands::Match { tech, top, student, .. } => {
                assert_eq!(tech, vec!["Python", "PyTorch"]);
                assert_eq!(top, Some(5));
                assert_eq!(student.as_deref(), Some("Ada"));
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("a.PDF"), &["pdf", "md"]).is_ok());
        assert!(validate_file_extension(Path::new("a.docx"), &["pdf"]).is_err());
        assert!(validate_file_extension(Path::new("a"), &["pdf"]).is_err());
    }
}
