use crate::core::error::Result;
use crate::pipelines::emotion::segmenter::WordSegmenter;
use crate::pipelines::emotion::tensor::TokenBatch;
use crate::pipelines::emotion::vocab::Vocabulary;
use std::sync::Arc;

/// Inference capability behind the emotion pipeline.
///
/// `run` is the opaque executor invocation: a marshalled token batch in,
/// one probability vector per input row out, order preserved. The pipeline
/// never looks inside the executor; stub implementations back the tests.
pub trait EmotionClassificationModel {
    type Options: std::fmt::Debug + Clone;

    fn new(options: Self::Options) -> Result<Self>
    where
        Self: Sized;

    fn run(&self, batch: &TokenBatch, use_gpu: bool) -> Result<Vec<Vec<f32>>>;

    /// Id used to pad short rows in the marshalled batch.
    fn pad_token_id(&self) -> u32;

    /// Shortest row the executor accepts.
    fn min_seq_len(&self) -> usize;

    fn load_vocabulary(options: &Self::Options) -> Result<Vocabulary>;

    fn load_segmenter(options: &Self::Options) -> Result<Arc<dyn WordSegmenter + Send + Sync>>;

    fn device(&self) -> &candle_core::Device;
}
