//! Emotion classification pipeline for short text.
//!
//! Classify sentences as `negative`, `neutral`, or `positive` with a
//! pretrained TextCNN. The pipeline handles word segmentation (delegated to
//! a pretrained tokenizer), vocabulary lookup with unknown-token fallback,
//! batched tensor marshalling, inference, and label mapping.
//!
//! ## Main Types
//!
//! - [`EmotionClassificationPipeline`] - High-level classification interface
//! - [`EmotionClassificationPipelineBuilder`] - Builder for pipeline configuration
//! - [`EmotionClassificationModel`] - Trait for inference executor implementations
//! - [`WordSegmenter`] - Trait for the word-segmentation delegate
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use emotion_textcnn::pipelines::emotion::*;
//!
//! # fn main() -> emotion_textcnn::core::Result<()> {
//! let pipeline = EmotionClassificationPipelineBuilder::textcnn("infer_model").build()?;
//!
//! let results = pipeline.emotion_classify(
//!     ClassifyRequest::from_texts(["今天天气真好", "别来吵我"]).batch_size(2),
//! )?;
//! for r in results {
//!     println!(
//!         "{} -> {} (key {}, positive {:.4})",
//!         r.text, r.emotion_label, r.emotion_key, r.positive_probs
//!     );
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod labels;
pub mod model;
pub mod pipeline;
pub mod segmenter;
pub mod tensor;
pub mod vocab;

pub use builder::EmotionClassificationPipelineBuilder;
pub use labels::{get_labels, Emotion};
pub use model::EmotionClassificationModel;
pub use pipeline::{ClassifyRequest, EmotionClassificationPipeline, EmotionResult, TextData};
pub use segmenter::{TokenizerWordSegmenter, WordSegmenter};
pub use tensor::TokenBatch;
pub use vocab::Vocabulary;
