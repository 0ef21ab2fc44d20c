pub mod core;
pub mod models;
pub mod pipelines;

// Re-export core types
pub use crate::core::{EmotionError, Result};

// Re-export model types for easier access
pub use models::textcnn::{TextCnnEmotionModel, TextCnnOptions, TextCnnSource};

// Re-export the pipeline surface so users can simply write
// `use emotion_textcnn::{EmotionClassificationPipelineBuilder, ClassifyRequest};`
pub use pipelines::emotion::{
    get_labels,
    ClassifyRequest,
    Emotion,
    EmotionClassificationPipeline,
    EmotionClassificationPipelineBuilder,
    EmotionResult,
    TextData,
};
