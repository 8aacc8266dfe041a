//! Error handling for the supervisor matcher

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    /// An embedding backend or vectorizer could not be constructed.
    /// Fatal: no partial matching is possible without it.
    #[error("Resource initialization error: {0}")]
    ResourceInitialization(String),

    /// A supervisor or project record is malformed.
    #[error("Input data error: {0}")]
    InputData(String),

    /// A single sub-scorer failed; the matcher absorbs these.
    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, MatcherError>;

impl MatcherError {
    /// Whether this error must abort a whole matching run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MatcherError::ResourceInitialization(_)
                | MatcherError::ModelNotFound(_)
        )
    }
}

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for MatcherError {
    fn from(err: anyhow::Error) -> Self {
        MatcherError::ResourceInitialization(err.to_string())
    }
}

/// Convert candle core errors to our custom error type
impl From<candle_core::Error> for MatcherError {
    fn from(err: candle_core::Error) -> Self {
        MatcherError::ModelError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(MatcherError::ResourceInitialization("no weights".into()).is_fatal());
        assert!(MatcherError::ModelNotFound("bert".into()).is_fatal());
        assert!(!MatcherError::Computation("nan".into()).is_fatal());
        assert!(!MatcherError::InputData("missing interests".into()).is_fatal());
    }

    #[test]
    fn test_anyhow_maps_to_resource_error() {
        let err: MatcherError = anyhow::anyhow!("tokenizer missing").into();
        assert!(matches!(err, MatcherError::ResourceInitialization(_)));
        assert!(err.to_string().contains("tokenizer missing"));
    }
}
