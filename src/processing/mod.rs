//! Text processing, extraction and scoring

pub mod bert;
pub mod domain_overlap;
pub mod embedding_manager;
pub mod embeddings;
pub mod matcher;
pub mod methodology;
pub mod profile;
pub mod scoring;
pub mod skills;
pub mod taxonomy;
pub mod text_processor;
