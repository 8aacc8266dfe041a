//! Embedding model catalogue: download, discovery and backend loading

use crate::config::AvailableModel;
use crate::error::{MatcherError, Result};
use crate::processing::bert::BertEmbedder;
use crate::processing::embeddings::{EmbeddingBackend, StaticEmbedder};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::fs;

/// Which embedding implementation reads a model directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Contextual BERT-family encoder run on candle
    Bert,
    /// Static Model2Vec token embeddings
    Model2Vec,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Bert => write!(f, "bert"),
            BackendKind::Model2Vec => write!(f, "model2vec"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bert" => Ok(BackendKind::Bert),
            "model2vec" | "static" => Ok(BackendKind::Model2Vec),
            other => Err(MatcherError::InvalidInput(format!(
                "Unknown embedding backend: {}. Supported: bert, model2vec",
                other
            ))),
        }
    }
}

/// Files every model directory needs, for either backend.
const MODEL_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Information about an available embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModelInfo {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
    pub backend: BackendKind,
    pub dimensions: u32,
}

/// Manager for embedding models: download, caching and selection
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    available_models: BTreeMap<String, EmbeddingModelInfo>,
    downloaded_models: HashSet<String>,
}

impl EmbeddingModelManager {
    pub async fn new(models_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&models_dir).await.map_err(|e| {
            MatcherError::Storage(format!(
                "Failed to create models directory {}: {}",
                models_dir.display(),
                e
            ))
        })?;

        let mut manager = Self {
            models_dir,
            available_models: builtin_catalogue(),
            downloaded_models: HashSet::new(),
        };
        manager.scan_downloaded_models().await?;
        Ok(manager)
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let model_id = entry.file_name().to_string_lossy().to_string();
            if is_complete_model_dir(&entry.path()).await {
                self.downloaded_models.insert(model_id);
            }
        }
        Ok(())
    }

    /// Download a catalogue model from the Hugging Face Hub into the models directory
    pub async fn download_model(&mut self, model_id: &str, force: bool) -> Result<PathBuf> {
        let model_info = self
            .available_models
            .get(model_id)
            .ok_or_else(|| MatcherError::ModelNotFound(format!("Unknown embedding model: {}", model_id)))?
            .clone();

        let model_dir = self.models_dir.join(model_id);
        if self.downloaded_models.contains(model_id) && !force {
            return Ok(model_dir);
        }

        info!(
            "Downloading embedding model {} ({} MB) from {}",
            model_info.name, model_info.size_mb, model_info.repo_id
        );
        fs::create_dir_all(&model_dir).await?;

        let api = Api::new()
            .map_err(|e| MatcherError::Network(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.repo(hf_hub::Repo::model(model_info.repo_id.clone()));

        for file in MODEL_FILES.iter().chain(["README.md"].iter()) {
            match repo.get(file).await {
                Ok(cached_path) => {
                    fs::copy(&cached_path, model_dir.join(file)).await.map_err(|e| {
                        MatcherError::Storage(format!("Failed to copy {}: {}", file, e))
                    })?;
                    info!("Downloaded {}", file);
                }
                Err(e) if !MODEL_FILES.contains(file) => {
                    warn!("Optional file {} not found: {}", file, e);
                }
                Err(e) => {
                    return Err(MatcherError::Network(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )));
                }
            }
        }

        self.downloaded_models.insert(model_id.to_string());
        info!("Embedding model {} downloaded", model_info.name);
        Ok(model_dir)
    }

    pub async fn remove_model(&mut self, model_id: &str) -> Result<()> {
        let model_dir = self.models_dir.join(model_id);
        if !self.downloaded_models.remove(model_id) && !model_dir.exists() {
            return Err(MatcherError::ModelNotFound(format!(
                "Model {} is not downloaded",
                model_id
            )));
        }
        fs::remove_dir_all(&model_dir).await.map_err(|e| {
            MatcherError::Storage(format!("Failed to remove {}: {}", model_dir.display(), e))
        })?;
        Ok(())
    }

    /// Add user-configured models to the catalogue; built-in entries win on conflicts
    pub fn register_models(&mut self, models: &[AvailableModel]) {
        for model in models {
            self.available_models
                .entry(model.id.clone())
                .or_insert_with(|| EmbeddingModelInfo {
                    name: model.name.clone(),
                    repo_id: model.repo_id.clone(),
                    size_mb: model.size_mb,
                    description: model.description.clone(),
                    backend: model.backend,
                    dimensions: model.dimensions,
                });
        }
    }

    pub fn get_model_path(&self, model_id: &str) -> Option<PathBuf> {
        self.downloaded_models
            .contains(model_id)
            .then(|| self.models_dir.join(model_id))
    }

    pub async fn ensure_model_available(&mut self, model_id: &str) -> Result<PathBuf> {
        match self.get_model_path(model_id) {
            Some(path) => Ok(path),
            None => self.download_model(model_id, false).await,
        }
    }

    pub fn list_available_models(&self) -> Vec<(&str, &EmbeddingModelInfo)> {
        self.available_models
            .iter()
            .map(|(id, info)| (id.as_str(), info))
            .collect()
    }

    pub fn list_downloaded_models(&self) -> Vec<String> {
        let mut downloaded: Vec<String> = self.downloaded_models.iter().cloned().collect();
        downloaded.sort();
        downloaded
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&EmbeddingModelInfo> {
        self.available_models.get(model_id)
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.downloaded_models.contains(model_id)
    }

    /// Resolve a model ID from a catalogue key, repo ID or display name
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        if self.available_models.contains_key(input) {
            return Some(input.to_string());
        }

        let input_lower = input.to_lowercase();
        self.available_models
            .iter()
            .find(|(_, info)| info.repo_id == input || info.name.to_lowercase() == input_lower)
            .map(|(id, _)| id.clone())
    }

    /// Backend for a model: the catalogue's choice, or `fallback` for unlisted local models
    pub fn backend_for(&self, model_id: &str, fallback: BackendKind) -> BackendKind {
        self.available_models
            .get(model_id)
            .map(|info| info.backend)
            .unwrap_or(fallback)
    }
}

async fn is_complete_model_dir(path: &Path) -> bool {
    for file in MODEL_FILES {
        if fs::metadata(path.join(file)).await.is_err() {
            return false;
        }
    }
    true
}

/// Load an embedding backend from a model directory.
///
/// This is the only place models are constructed; failures are fatal for a run.
pub fn load_backend(kind: BackendKind, model_dir: &Path) -> Result<Arc<dyn EmbeddingBackend>> {
    if !model_dir.is_dir() {
        return Err(MatcherError::ModelNotFound(format!(
            "Model directory {} does not exist",
            model_dir.display()
        )));
    }

    Ok(match kind {
        BackendKind::Bert => Arc::new(BertEmbedder::load(model_dir)?),
        BackendKind::Model2Vec => Arc::new(StaticEmbedder::load(model_dir)?),
    })
}

fn builtin_catalogue() -> BTreeMap<String, EmbeddingModelInfo> {
    let mut models = BTreeMap::new();

    models.insert(
        "bert-base-uncased".to_string(),
        EmbeddingModelInfo {
            name: "BERT Base Uncased".to_string(),
            repo_id: "google-bert/bert-base-uncased".to_string(),
            size_mb: 440,
            description: "Contextual encoder, mean pooled over the attention mask".to_string(),
            backend: BackendKind::Bert,
            dimensions: 768,
        },
    );

    models.insert(
        "all-MiniLM-L6-v2".to_string(),
        EmbeddingModelInfo {
            name: "MiniLM L6 v2".to_string(),
            repo_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            size_mb: 90,
            description: "Small sentence-transformer, faster than BERT base".to_string(),
            backend: BackendKind::Bert,
            dimensions: 384,
        },
    );

    models.insert(
        "potion-base-8M".to_string(),
        EmbeddingModelInfo {
            name: "Potion Base 8M".to_string(),
            repo_id: "minishlab/potion-base-8M".to_string(),
            size_mb: 30,
            description: "Static Model2Vec embeddings, no GPU needed".to_string(),
            backend: BackendKind::Model2Vec,
            dimensions: 256,
        },
    );

    models
}
