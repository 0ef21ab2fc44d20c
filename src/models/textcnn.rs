//! TextCNN implementation for short-text emotion classification.
//!
//! TextCNN is a small convolutional classifier over word embeddings:
//! - Parallel convolutions with several window sizes capture n-gram features
//! - Max-over-time pooling collapses variable-length sentences
//! - Two dense layers project pooled features onto the emotion classes
//!
//! The pretrained artifact ships its own word-level vocabulary; inputs are
//! vocabulary ids, not subword ids.
//!
//! # Quick Start
//! ```rust
//! // let network = TextCnn::load(vb, &config)?;
//! // let logits = network.forward(&word_ids, &seq_lens)?;
//!
//! // Through the pipeline wrapper (downloads or local directory):
//! // let model = TextCnnEmotionModel::new(TextCnnOptions::local("infer_model"))?;
//! // let probs = model.run(&token_batch, false)?;
//! ```

use candle_core::{DType, Device, Result, Tensor, D};
use candle_nn::{conv1d, embedding, linear, Conv1d, Conv1dConfig, Embedding, Linear, Module, VarBuilder};
use serde::Deserialize;

fn default_emb_dim() -> usize {
    128
}

fn default_num_filters() -> usize {
    128
}

fn default_win_sizes() -> Vec<usize> {
    vec![1, 2, 3]
}

fn default_hidden_dim() -> usize {
    96
}

fn default_num_classes() -> usize {
    3
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    #[serde(default = "default_emb_dim")]
    pub emb_dim: usize,
    #[serde(default = "default_num_filters")]
    pub num_filters: usize,
    #[serde(default = "default_win_sizes")]
    pub win_sizes: Vec<usize>,
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,
    #[serde(default)]
    pub pad_token_id: u32,
}

impl Config {
    /// Sentences shorter than the widest window are padded up to it so every
    /// convolution produces at least one output position.
    pub fn min_seq_len(&self) -> usize {
        self.win_sizes.iter().copied().max().unwrap_or(1)
    }
}

/// Convolutional text classifier.
#[derive(Debug, Clone)]
pub struct TextCnn {
    embeddings: Embedding,
    convs: Vec<(usize, Conv1d)>,
    hidden: Linear,
    classifier: Linear,
    device: Device,
    span: tracing::Span,
}

impl TextCnn {
    /// Load network weights through a `VarBuilder`; only the parameters the
    /// layers name are materialized from the artifact.
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let embeddings = embedding(config.vocab_size, config.emb_dim, vb.pp("embeddings"))?;

        let mut convs = Vec::with_capacity(config.win_sizes.len());
        for (idx, &win_size) in config.win_sizes.iter().enumerate() {
            let conv = conv1d(
                config.emb_dim,
                config.num_filters,
                win_size,
                Conv1dConfig::default(),
                vb.pp(format!("convs.{idx}")),
            )?;
            convs.push((win_size, conv));
        }

        let hidden = linear(
            config.num_filters * config.win_sizes.len(),
            config.hidden_dim,
            vb.pp("hidden"),
        )?;
        let classifier = linear(config.hidden_dim, config.num_classes, vb.pp("classifier"))?;

        Ok(Self {
            embeddings,
            convs,
            hidden,
            classifier,
            device: vb.device().clone(),
            span: tracing::span!(tracing::Level::TRACE, "textcnn"),
        })
    }

    /// Mask out pooling positions whose receptive field lies entirely in
    /// padding. Each row keeps `max(len - win + 1, 1)` valid positions.
    fn pooling_mask(&self, seq_lens: &[usize], win_size: usize, out_len: usize) -> Result<Tensor> {
        let mut mask = vec![0f32; seq_lens.len() * out_len];
        for (row, &len) in seq_lens.iter().enumerate() {
            let valid = len.saturating_sub(win_size - 1).clamp(1, out_len);
            for position in valid..out_len {
                mask[row * out_len + position] = f32::NEG_INFINITY;
            }
        }
        Tensor::from_vec(mask, (seq_lens.len(), 1, out_len), &self.device)
    }

    /// Forward pass.
    ///
    /// # Arguments
    /// * `word_ids` - Vocabulary ids with shape `(batch_size, sequence_length)`
    /// * `seq_lens` - Unpadded length of each row, used to mask pooling
    ///
    /// # Returns
    /// Classification logits with shape `(batch_size, num_classes)`
    pub fn forward(&self, word_ids: &Tensor, seq_lens: &[usize]) -> Result<Tensor> {
        let _enter = self.span.enter();

        let embedded = word_ids
            .apply(&self.embeddings)?
            // (batch, emb_dim, seq_len) for channel-first convolution
            .transpose(1, 2)?;

        let mut pooled = Vec::with_capacity(self.convs.len());
        for (win_size, conv) in &self.convs {
            let features = conv.forward(&embedded)?.tanh()?;
            let out_len = features.dim(2)?;
            let mask = self.pooling_mask(seq_lens, *win_size, out_len)?;
            let features = features.broadcast_add(&mask)?;
            pooled.push(features.max(D::Minus1)?);
        }

        Tensor::cat(&pooled, 1)?
            .apply(&self.hidden)?
            .tanh()?
            .apply(&self.classifier)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

/*
Pipeline Implementations
*/

use crate::core::error::{self as error, EmotionError};
use crate::core::ModelOptions;
use crate::pipelines::emotion::segmenter::{TokenizerWordSegmenter, WordSegmenter};
use crate::pipelines::emotion::tensor::TokenBatch;
use crate::pipelines::emotion::vocab::Vocabulary;
use crate::pipelines::utils::{init_cuda_device, visible_cuda_device};
use candle_nn::ops::softmax;
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONFIG_FILE: &str = "config.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";
const VOCAB_FILE: &str = "vocab.txt";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Where the pretrained artifact lives.
#[derive(Debug, Clone)]
pub enum TextCnnSource {
    /// A local directory holding config, weights, vocabulary and tokenizer.
    Local(PathBuf),
    /// A Hugging Face Hub repository with the same file layout.
    Hub(String),
}

#[derive(Debug, Clone)]
pub struct TextCnnOptions {
    pub source: TextCnnSource,
}

impl TextCnnOptions {
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: TextCnnSource::Local(dir.into()),
        }
    }

    pub fn hub(repo: impl Into<String>) -> Self {
        Self {
            source: TextCnnSource::Hub(repo.into()),
        }
    }

    /// Resolve one artifact file to a local path, downloading when the
    /// source is a Hub repository.
    fn get(&self, filename: &str) -> error::Result<PathBuf> {
        match &self.source {
            TextCnnSource::Local(dir) => {
                let path = dir.join(filename);
                if !path.is_file() {
                    return Err(EmotionError::file_access(
                        path,
                        std::io::Error::from(std::io::ErrorKind::NotFound),
                    ));
                }
                Ok(path)
            }
            TextCnnSource::Hub(repo_id) => {
                let api = Api::new()?;
                let repo = api.repo(Repo::new(repo_id.clone(), RepoType::Model));
                Ok(repo.get(filename)?)
            }
        }
    }

    fn weights_file(&self) -> error::Result<PathBuf> {
        match self.get(SAFETENSORS_FILE) {
            Ok(safetensors) => Ok(safetensors),
            Err(_) => match self.get(PYTORCH_FILE) {
                Ok(pytorch_model) => Ok(pytorch_model),
                Err(e) => Err(EmotionError::ModelNotFound(format!(
                    "expected `{SAFETENSORS_FILE}` or `{PYTORCH_FILE}` in {:?}: {e}",
                    self.source
                ))),
            },
        }
    }
}

impl ModelOptions for TextCnnOptions {
    fn cache_key(&self) -> String {
        match &self.source {
            TextCnnSource::Local(dir) => format!("textcnn-{}", dir.display()),
            TextCnnSource::Hub(repo_id) => format!("textcnn-{repo_id}"),
        }
    }
}

fn load_network(weights: &Path, config: &Config, device: &Device) -> error::Result<TextCnn> {
    let dtype = DType::F32;
    let vb = if weights.extension().is_some_and(|ext| ext == "safetensors") {
        unsafe { VarBuilder::from_mmaped_safetensors(&[weights], dtype, device)? }
    } else if weights.extension().is_some_and(|ext| ext == "bin") {
        VarBuilder::from_pth(weights, dtype, device)?
    } else {
        return Err(EmotionError::ModelFormat(format!(
            "unsupported weight file: {weights:?}"
        )));
    };
    Ok(TextCnn::load(vb, config)?)
}

/// Emotion classification model backed by the pretrained TextCNN.
///
/// Holds a CPU executor unconditionally and a CUDA executor when the
/// accelerator environment permitted one at construction time.
#[derive(Clone)]
pub struct TextCnnEmotionModel {
    network: TextCnn,
    accelerator: Option<TextCnn>,
    config: Config,
}

impl TextCnnEmotionModel {
    pub fn new(options: TextCnnOptions) -> error::Result<Self> {
        let config_content = {
            let path = options.get(CONFIG_FILE)?;
            std::fs::read_to_string(&path).map_err(|e| EmotionError::file_access(path, e))?
        };
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| EmotionError::ModelFormat(format!("failed to parse {CONFIG_FILE}: {e}")))?;

        if config.num_classes != crate::pipelines::emotion::labels::CLASS_COUNT {
            return Err(EmotionError::ModelFormat(format!(
                "expected {} emotion classes, config declares {}",
                crate::pipelines::emotion::labels::CLASS_COUNT,
                config.num_classes
            )));
        }
        if config.win_sizes.is_empty() {
            return Err(EmotionError::ModelFormat(
                "config declares no convolution windows".to_string(),
            ));
        }

        let weights = options.weights_file()?;
        let network = load_network(&weights, &config, &Device::Cpu)?;

        // Any failure to bring the accelerator up falls back to CPU without
        // surfacing an error.
        let accelerator = visible_cuda_device()
            .and_then(|index| init_cuda_device(index).ok())
            .and_then(|device| load_network(&weights, &config, &device).ok());

        Ok(Self {
            network,
            accelerator,
            config,
        })
    }

    fn executor(&self, use_gpu: bool) -> &TextCnn {
        if use_gpu {
            self.accelerator.as_ref().unwrap_or(&self.network)
        } else {
            &self.network
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn device(&self) -> &Device {
        self.network.device()
    }

    pub fn run(&self, batch: &TokenBatch, use_gpu: bool) -> error::Result<Vec<Vec<f32>>> {
        let network = self.executor(use_gpu);
        let word_ids = batch.to_tensor(network.device())?;
        let logits = network.forward(&word_ids, batch.seq_lens())?;
        let probs = softmax(&logits, D::Minus1)?;
        Ok(probs.to_vec2::<f32>()?)
    }
}

impl crate::pipelines::emotion::model::EmotionClassificationModel for TextCnnEmotionModel {
    type Options = TextCnnOptions;

    fn new(options: Self::Options) -> error::Result<Self> {
        TextCnnEmotionModel::new(options)
    }

    fn run(&self, batch: &TokenBatch, use_gpu: bool) -> error::Result<Vec<Vec<f32>>> {
        self.run(batch, use_gpu)
    }

    fn pad_token_id(&self) -> u32 {
        self.config.pad_token_id
    }

    fn min_seq_len(&self) -> usize {
        self.config.min_seq_len()
    }

    fn load_vocabulary(options: &Self::Options) -> error::Result<Vocabulary> {
        Vocabulary::load(options.get(VOCAB_FILE)?)
    }

    fn load_segmenter(
        options: &Self::Options,
    ) -> error::Result<Arc<dyn WordSegmenter + Send + Sync>> {
        let tokenizer_file = options.get(TOKENIZER_FILE)?;
        Ok(Arc::new(TokenizerWordSegmenter::from_file(tokenizer_file)?))
    }

    fn device(&self) -> &Device {
        self.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    fn tiny_config() -> Config {
        Config {
            vocab_size: 16,
            emb_dim: 8,
            num_filters: 4,
            win_sizes: vec![1, 2, 3],
            hidden_dim: 6,
            num_classes: 3,
            pad_token_id: 0,
        }
    }

    fn tiny_network(config: &Config) -> TextCnn {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        TextCnn::load(vb, config).unwrap()
    }

    #[test]
    fn forward_shape_matches_class_count() {
        let config = tiny_config();
        let network = tiny_network(&config);

        let ids = Tensor::from_vec(vec![1u32, 2, 3, 4, 5, 6, 7, 0, 0, 0], (2, 5), &Device::Cpu)
            .unwrap();
        let logits = network.forward(&ids, &[5, 2]).unwrap();
        assert_eq!(logits.dims(), &[2, 3]);
    }

    #[test]
    fn softmax_probabilities_sum_to_one() {
        let config = tiny_config();
        let network = tiny_network(&config);

        let ids = Tensor::from_vec(vec![3u32, 1, 4, 1, 5, 9], (2, 3), &Device::Cpu).unwrap();
        let logits = network.forward(&ids, &[3, 3]).unwrap();
        let probs = softmax(&logits, D::Minus1).unwrap().to_vec2::<f32>().unwrap();
        for row in probs {
            let total: f32 = row.iter().sum();
            assert!((total - 1.0).abs() < 1e-5);
            assert!(row.iter().all(|p| *p >= 0.0));
        }
    }

    #[test]
    fn short_rows_survive_wide_windows() {
        let config = tiny_config();
        let network = tiny_network(&config);

        // Row of length 1 padded to the widest window; pooling must still
        // find a valid position for every window size.
        let ids = Tensor::from_vec(vec![2u32, 0, 0], (1, 3), &Device::Cpu).unwrap();
        let logits = network.forward(&ids, &[1]).unwrap();
        let row = logits.to_vec2::<f32>().unwrap().remove(0);
        assert!(row.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"vocab_size": 240465}"#).unwrap();
        assert_eq!(config.emb_dim, 128);
        assert_eq!(config.num_filters, 128);
        assert_eq!(config.win_sizes, vec![1, 2, 3]);
        assert_eq!(config.hidden_dim, 96);
        assert_eq!(config.num_classes, 3);
        assert_eq!(config.pad_token_id, 0);
        assert_eq!(config.min_seq_len(), 3);
    }
}
