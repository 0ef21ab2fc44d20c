use super::model::EmotionClassificationModel;
use super::pipeline::{EmotionClassificationPipeline, SharedSegmenter};
use crate::core::{global_cache, ModelOptions};
use crate::models::textcnn::{TextCnnEmotionModel, TextCnnOptions};
use crate::pipelines::utils::build_cache_key;
use std::path::PathBuf;

pub struct EmotionClassificationPipelineBuilder<M: EmotionClassificationModel> {
    options: M::Options,
    segmenter: Option<SharedSegmenter>,
}

impl<M: EmotionClassificationModel> EmotionClassificationPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            segmenter: None,
        }
    }

    /// Override the word-segmentation delegate instead of loading the
    /// model's own tokenizer on first use.
    pub fn segmenter(mut self, segmenter: SharedSegmenter) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn build(self) -> crate::core::Result<EmotionClassificationPipeline<M>>
    where
        M: Send + Sync + 'static,
        M::Options: ModelOptions + Send + Sync + 'static,
    {
        let key = build_cache_key(&self.options);
        let options = self.options.clone();
        let model = global_cache().get_or_create(&key, || M::new(options))?;
        let vocab = M::load_vocabulary(&self.options)?;

        let pipeline = match self.segmenter {
            Some(segmenter) => {
                EmotionClassificationPipeline::from_shared(model, vocab, segmenter)
            }
            None => {
                let options = self.options;
                EmotionClassificationPipeline::with_factory(
                    model,
                    vocab,
                    Box::new(move || M::load_segmenter(&options)),
                )
            }
        };
        Ok(pipeline)
    }
}

impl EmotionClassificationPipelineBuilder<TextCnnEmotionModel> {
    /// Pretrained TextCNN from a local artifact directory.
    pub fn textcnn(dir: impl Into<PathBuf>) -> Self {
        Self::new(TextCnnOptions::local(dir))
    }

    /// Pretrained TextCNN from a Hugging Face Hub repository.
    pub fn textcnn_from_hub(repo: impl Into<String>) -> Self {
        Self::new(TextCnnOptions::hub(repo))
    }
}
