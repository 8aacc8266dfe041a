//! BERT encoder embeddings on candle, with attention-mask mean pooling

use crate::error::{MatcherError, Result};
use crate::processing::embeddings::{EmbeddingBackend, MAX_SEQUENCE_LENGTH};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use log::{info, warn};
use std::path::Path;
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationParams};

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_name: String,
}

impl BertEmbedder {
    /// Load `config.json`, `tokenizer.json` and `model.safetensors` from a model directory
    pub fn load(model_dir: &Path) -> Result<Self> {
        let start_time = Instant::now();
        let config_path = model_dir.join("config.json");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let weights_path = model_dir.join("model.safetensors");

        for path in [&config_path, &tokenizer_path, &weights_path] {
            if !path.exists() {
                return Err(MatcherError::ResourceInitialization(format!(
                    "Missing model file: {}",
                    path.display()
                )));
            }
        }

        let device = get_device_with_override()?;
        info!("Loading BERT encoder from {} on {:?}", model_dir.display(), device);

        let config_json = std::fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&config_json).map_err(|e| {
            MatcherError::ResourceInitialization(format!("Invalid BERT config: {}", e))
        })?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MatcherError::ResourceInitialization(format!("Failed to load tokenizer: {}", e))
        })?;
        configure_tokenizer(&mut tokenizer)?;

        // SAFETY: the weights file is not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device) }
            .map_err(|e| MatcherError::ResourceInitialization(format!("Failed to map weights: {}", e)))?;
        let model = BertModel::load(vb, &config).map_err(|e| {
            MatcherError::ResourceInitialization(format!("Failed to build BERT model: {}", e))
        })?;

        info!("BERT encoder ready in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            tokenizer,
            device,
            model_name: model_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "bert".to_string()),
        })
    }

    fn mean_pooled(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| MatcherError::Embedding(format!("Tokenization failed: {}", e)))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        // [1, seq, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = mean_pool(&hidden, &attention_mask)?;
        Ok(pooled.squeeze(0)?.to_vec1::<f32>()?)
    }
}

/// No padding, truncation at [`MAX_SEQUENCE_LENGTH`] tokens
fn configure_tokenizer(tokenizer: &mut Tokenizer) -> Result<()> {
    tokenizer
        .with_padding(None)
        .with_truncation(Some(TruncationParams {
            max_length: MAX_SEQUENCE_LENGTH,
            ..Default::default()
        }))
        .map_err(|e| {
            MatcherError::ResourceInitialization(format!("Failed to configure truncation: {}", e))
        })?;
    Ok(())
}

/// Average of `hidden` ([batch, seq, dim]) over the positions where `mask` ([batch, seq]) is set
fn mean_pool(hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
    let mask = mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    Ok(summed.broadcast_div(&counts)?)
}

impl EmbeddingBackend for BertEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.mean_pooled(text)
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Get the best available device (GPU if compiled in and present, CPU otherwise)
pub fn get_best_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA GPU for embeddings");
            return device;
        }
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU for embeddings");
                return device;
            }
            Err(e) => warn!("Metal GPU initialization failed: {}", e),
        }
    }

    Device::Cpu
}

/// Device selection honouring `SUPERVISOR_MATCHER_DEVICE` (cpu, cuda or metal)
pub fn get_device_with_override() -> Result<Device> {
    let Ok(preference) = std::env::var("SUPERVISOR_MATCHER_DEVICE") else {
        return Ok(get_best_device());
    };

    match preference.to_lowercase().as_str() {
        "cpu" => Ok(Device::Cpu),
        "cuda" => {
            #[cfg(feature = "cuda")]
            {
                Device::new_cuda(0).map_err(|e| {
                    MatcherError::ResourceInitialization(format!("Failed to initialize CUDA: {}", e))
                })
            }
            #[cfg(not(feature = "cuda"))]
            {
                Err(MatcherError::ResourceInitialization(
                    "CUDA support not compiled in".to_string(),
                ))
            }
        }
        "metal" => {
            #[cfg(feature = "metal")]
            {
                Device::new_metal(0).map_err(|e| {
                    MatcherError::ResourceInitialization(format!("Failed to initialize Metal: {}", e))
                })
            }
            #[cfg(not(feature = "metal"))]
            {
                Err(MatcherError::ResourceInitialization(
                    "Metal support not compiled in".to_string(),
                ))
            }
        }
        other => {
            warn!("Unknown device '{}', falling back to auto-detection", other);
            Ok(get_best_device())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_are_resource_errors() {
        let dir = TempDir::new().unwrap();
        let err = BertEmbedder::load(dir.path()).err().unwrap();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_mean_pool_skips_masked_positions() {
        let hidden = Tensor::new(&[[[1f32, 2.0], [3.0, 4.0], [100.0, -100.0]]], &Device::Cpu).unwrap();
        let mask = Tensor::new(&[[1u32, 1, 0]], &Device::Cpu).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap();

        assert_eq!(pooled.dims(), &[1, 2]);
        assert_eq!(pooled.to_vec2::<f32>().unwrap(), vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn test_mean_pool_all_masked_is_zero() {
        let hidden = Tensor::new(&[[[5f32, 7.0], [1.0, 1.0]]], &Device::Cpu).unwrap();
        let mask = Tensor::new(&[[0u32, 0]], &Device::Cpu).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap();

        assert_eq!(pooled.to_vec2::<f32>().unwrap(), vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_tokenizer_truncates_to_max_sequence_length() {
        let mut tokenizer: Tokenizer = r#"{
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": {"type": "Whitespace"},
            "post_processor": null,
            "decoder": null,
            "model": {"type": "WordLevel", "vocab": {"[UNK]": 0, "graph": 1}, "unk_token": "[UNK]"}
        }"#
        .parse()
        .unwrap();

        configure_tokenizer(&mut tokenizer).unwrap();

        assert_eq!(tokenizer.get_truncation().unwrap().max_length, MAX_SEQUENCE_LENGTH);
        assert!(tokenizer.get_padding().is_none());

        let long_text = "graph ".repeat(MAX_SEQUENCE_LENGTH + 100);
        let encoding = tokenizer.encode(long_text.as_str(), true).unwrap();
        assert_eq!(encoding.get_ids().len(), MAX_SEQUENCE_LENGTH);
    }
}
