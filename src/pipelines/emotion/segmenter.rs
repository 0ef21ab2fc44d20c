use crate::core::error::{EmotionError, Result};
use std::path::Path;
use tokenizers::Tokenizer;

/// External word-segmentation capability.
///
/// The classifier was trained on word-level tokens produced by a pretrained
/// segmentation model, so the pipeline delegates segmentation rather than
/// splitting text itself. One batch in, one token list per input out, order
/// preserved.
pub trait WordSegmenter {
    fn segment_batch(&self, texts: &[String]) -> Result<Vec<Vec<String>>>;
}

/// `WordSegmenter` backed by a pretrained `tokenizers` model file.
pub struct TokenizerWordSegmenter {
    tokenizer: Tokenizer,
}

impl TokenizerWordSegmenter {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| EmotionError::Segmentation(format!("failed to load tokenizer: {e}")))?;
        Ok(Self::new(tokenizer))
    }
}

impl WordSegmenter for TokenizerWordSegmenter {
    fn segment_batch(&self, texts: &[String]) -> Result<Vec<Vec<String>>> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        // No special tokens: the vocabulary lookup wants bare words.
        let encodings = self
            .tokenizer
            .encode_batch(inputs, false)
            .map_err(|e| EmotionError::Segmentation(e.to_string()))?;
        Ok(encodings
            .into_iter()
            .map(|encoding| encoding.get_tokens().to_vec())
            .collect())
    }
}
