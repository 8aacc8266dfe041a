//! Supervisor matcher library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod persistence;
pub mod processing;

pub use config::Config;
pub use error::{MatcherError, Result};
pub use processing::embeddings::EmbeddingBackend;
pub use processing::matcher::{MatcherBuilder, SupervisorMatcher};
pub use processing::profile::{MatchRecord, MatchResult, ProjectDescription, SupervisorProfile};
pub use processing::scoring::{DetailedScores, DomainWeights};
