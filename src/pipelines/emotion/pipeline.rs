use super::labels::{self, Emotion, CLASS_COUNT};
use super::model::EmotionClassificationModel;
use super::segmenter::WordSegmenter;
use super::tensor::TokenBatch;
use super::vocab::Vocabulary;
use crate::core::error::{EmotionError, Result};
use crate::pipelines::utils::visible_cuda_device;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) type SharedSegmenter = Arc<dyn WordSegmenter + Send + Sync>;
pub(crate) type SegmenterFactory = Box<dyn Fn() -> Result<SharedSegmenter> + Send + Sync>;

/// Wrapper for the `data` form of a classification request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextData {
    pub text: Vec<String>,
}

/// A classification request.
///
/// Exactly one of `texts` and `data.text` must be populated; the redundant
/// `data` form is kept for callers migrating from dict-style serving
/// payloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifyRequest {
    pub texts: Vec<String>,
    pub data: TextData,
    pub use_gpu: bool,
    pub batch_size: usize,
}

impl Default for ClassifyRequest {
    fn default() -> Self {
        Self {
            texts: Vec::new(),
            data: TextData::default(),
            use_gpu: false,
            batch_size: 1,
        }
    }
}

impl ClassifyRequest {
    pub fn from_texts<T: Into<String>>(texts: impl IntoIterator<Item = T>) -> Self {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_data(data: TextData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn use_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    fn into_texts(self) -> Result<Vec<String>> {
        match (self.texts.is_empty(), self.data.text.is_empty()) {
            (false, true) => Ok(self.texts),
            (true, false) => Ok(self.data.text),
            _ => Err(EmotionError::InvalidInput(
                "exactly one of `texts` and `data.text` must be non-empty".to_string(),
            )),
        }
    }
}

/// One classified sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionResult {
    pub text: String,
    pub emotion_label: String,
    pub emotion_key: usize,
    pub positive_probs: f32,
    pub negative_probs: f32,
    pub neutral_probs: f32,
}

struct ProcessedText {
    origin: String,
    word_ids: Vec<u32>,
}

fn round4(p: f32) -> f32 {
    (p * 10_000.0).round() / 10_000.0
}

/// Classifies the emotion of short text (negative, neutral, positive).
///
/// Construct with
/// [`EmotionClassificationPipelineBuilder`](super::EmotionClassificationPipelineBuilder),
/// or assemble one from explicit capabilities with [`Self::from_parts`].
///
/// # Examples
///
/// ```rust,no_run
/// use emotion_textcnn::pipelines::emotion::*;
///
/// # fn main() -> emotion_textcnn::core::Result<()> {
/// let pipeline = EmotionClassificationPipelineBuilder::textcnn("infer_model").build()?;
///
/// let results = pipeline.emotion_classify(
///     ClassifyRequest::from_texts(["今天天气真好", "别来吵我"]).batch_size(2),
/// )?;
/// for r in results {
///     println!("{}: {} ({})", r.text, r.emotion_label, r.emotion_key);
/// }
/// # Ok(())
/// # }
/// ```
pub struct EmotionClassificationPipeline<M: EmotionClassificationModel> {
    pub(crate) model: Arc<M>,
    pub(crate) vocab: Vocabulary,
    segmenter: OnceCell<SharedSegmenter>,
    segmenter_factory: SegmenterFactory,
}

impl<M: EmotionClassificationModel> EmotionClassificationPipeline<M> {
    /// Assemble a pipeline from explicit capabilities. Useful when the
    /// segmentation or inference side should be swapped out, e.g. for stub
    /// implementations in tests.
    pub fn from_parts(model: M, vocab: Vocabulary, segmenter: SharedSegmenter) -> Self {
        Self::from_shared(Arc::new(model), vocab, segmenter)
    }

    pub(crate) fn from_shared(
        model: Arc<M>,
        vocab: Vocabulary,
        segmenter: SharedSegmenter,
    ) -> Self {
        Self {
            model,
            vocab,
            segmenter: OnceCell::with_value(segmenter),
            segmenter_factory: Box::new(|| {
                Err(EmotionError::Segmentation(
                    "no segmenter configured".to_string(),
                ))
            }),
        }
    }

    pub(crate) fn with_factory(
        model: Arc<M>,
        vocab: Vocabulary,
        segmenter_factory: SegmenterFactory,
    ) -> Self {
        Self {
            model,
            vocab,
            segmenter: OnceCell::new(),
            segmenter_factory,
        }
    }

    /// The shared word-segmentation delegate, built on first use.
    fn word_seg_module(&self) -> Result<&SharedSegmenter> {
        self.segmenter.get_or_try_init(|| (self.segmenter_factory)())
    }

    /// Classify a batch of sentences.
    ///
    /// Inputs are processed in `batch_size` chunks (the last chunk may be
    /// short); results come back one per input sentence, in input order.
    /// `use_gpu` is honored only when the accelerator environment variable
    /// names a usable device; otherwise the call runs on the default
    /// processor without a warning.
    pub fn emotion_classify(&self, request: ClassifyRequest) -> Result<Vec<EmotionResult>> {
        let use_gpu = request.use_gpu && visible_cuda_device().is_some();
        let batch_size = request.batch_size.max(1);
        let texts = request.into_texts()?;

        tracing::debug!(
            inputs = texts.len(),
            batch_size,
            use_gpu,
            "running emotion classification"
        );

        let mut results = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(batch_size) {
            let processed = self.preprocess(chunk)?;
            let sequences: Vec<Vec<u32>> =
                processed.iter().map(|p| p.word_ids.clone()).collect();
            let batch = TokenBatch::from_sequences(
                &sequences,
                self.model.pad_token_id(),
                self.model.min_seq_len(),
            );
            let probs = self.model.run(&batch, use_gpu)?;
            results.extend(Self::postprocess(probs, processed)?);
        }
        Ok(results)
    }

    /// The labels the classifier was pretrained with.
    pub fn get_labels(&self) -> HashMap<&'static str, usize> {
        labels::get_labels()
    }

    /// Returns the device the default executor runs on.
    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }

    fn preprocess(&self, texts: &[String]) -> Result<Vec<ProcessedText>> {
        let segmenter = self.word_seg_module()?;
        let segmented = segmenter.segment_batch(texts)?;
        if segmented.len() != texts.len() {
            return Err(EmotionError::Segmentation(format!(
                "segmenter returned {} outputs for {} inputs",
                segmented.len(),
                texts.len()
            )));
        }

        Ok(texts
            .iter()
            .zip(segmented)
            .map(|(origin, words)| ProcessedText {
                origin: origin.clone(),
                word_ids: words.iter().map(|word| self.vocab.id(word)).collect(),
            })
            .collect())
    }

    fn postprocess(
        probs: Vec<Vec<f32>>,
        processed: Vec<ProcessedText>,
    ) -> Result<Vec<EmotionResult>> {
        if probs.len() != processed.len() {
            return Err(EmotionError::ModelFormat(format!(
                "executor returned {} probability vectors for {} inputs",
                probs.len(),
                processed.len()
            )));
        }

        processed
            .into_iter()
            .zip(probs)
            .map(|(item, row)| {
                if row.len() != CLASS_COUNT {
                    return Err(EmotionError::ModelFormat(format!(
                        "expected {CLASS_COUNT} class probabilities, got {}",
                        row.len()
                    )));
                }
                let argmax = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(index, _)| index)
                    .unwrap_or_default();
                let emotion = Emotion::from_class_index(argmax).ok_or_else(|| {
                    EmotionError::ModelFormat(format!("class index {argmax} out of range"))
                })?;

                Ok(EmotionResult {
                    text: item.origin,
                    emotion_label: emotion.as_str().to_string(),
                    emotion_key: emotion.class_index(),
                    positive_probs: round4(row[Emotion::Positive.class_index()]),
                    negative_probs: round4(row[Emotion::Negative.class_index()]),
                    neutral_probs: round4(row[Emotion::Neutral.class_index()]),
                })
            })
            .collect()
    }
}
