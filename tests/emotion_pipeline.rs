// Integration tests for the emotion classification pipeline.
// This is a separate crate that tests the public API, with the external
// capabilities (word segmentation, inference executor) stubbed out.

use emotion_textcnn::pipelines::emotion::*;
use emotion_textcnn::{EmotionError, Result};
use std::sync::Arc;

/// Whitespace segmentation stand-in for the pretrained tokenizer.
struct WhitespaceSegmenter;

impl WordSegmenter for WhitespaceSegmenter {
    fn segment_batch(&self, texts: &[String]) -> Result<Vec<Vec<String>>> {
        Ok(texts
            .iter()
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .collect())
    }
}

/// Executor stub that scores each row from its token ids, independent of
/// batching.
struct FixedExecutor {
    device: candle_core::Device,
}

impl FixedExecutor {
    fn new() -> Self {
        Self {
            device: candle_core::Device::Cpu,
        }
    }
}

impl EmotionClassificationModel for FixedExecutor {
    type Options = ();

    fn new(_options: ()) -> Result<Self> {
        Ok(FixedExecutor::new())
    }

    fn run(&self, batch: &TokenBatch, _use_gpu: bool) -> Result<Vec<Vec<f32>>> {
        let rows = batch.to_tensor(&self.device)?.to_vec2::<u32>()?;
        Ok(rows
            .iter()
            .zip(batch.seq_lens())
            .map(|(row, &len)| {
                let sum: u32 = row[..len.min(row.len())].iter().sum();
                match sum % 3 {
                    0 => vec![0.7, 0.2, 0.1],
                    1 => vec![0.1, 0.6, 0.3],
                    _ => vec![0.05, 0.15, 0.8],
                }
            })
            .collect())
    }

    fn pad_token_id(&self) -> u32 {
        0
    }

    fn min_seq_len(&self) -> usize {
        3
    }

    fn load_vocabulary(_options: &()) -> Result<Vocabulary> {
        Vocabulary::from_entries([("<unk>", 0u32)])
    }

    fn load_segmenter(_options: &()) -> Result<Arc<dyn WordSegmenter + Send + Sync>> {
        Ok(Arc::new(WhitespaceSegmenter))
    }

    fn device(&self) -> &candle_core::Device {
        &self.device
    }
}

fn vocab() -> Vocabulary {
    Vocabulary::from_entries([
        ("<unk>", 0u32),
        ("今天天气真好", 1),
        ("别来吵我", 2),
        ("love", 3),
        ("hate", 4),
        ("rust", 5),
    ])
    .unwrap()
}

fn pipeline() -> EmotionClassificationPipeline<FixedExecutor> {
    EmotionClassificationPipeline::from_parts(
        FixedExecutor::new(),
        vocab(),
        Arc::new(WhitespaceSegmenter),
    )
}

#[test]
fn classify_preserves_length_and_order() -> anyhow::Result<()> {
    let pipeline = pipeline();
    let texts = ["love rust", "hate", "rust rust rust", "love"];
    let results = pipeline.emotion_classify(ClassifyRequest::from_texts(texts))?;

    assert_eq!(results.len(), texts.len());
    for (text, result) in texts.iter().zip(&results) {
        assert_eq!(&result.text, text);
    }
    Ok(())
}

#[test]
fn probabilities_sum_to_one_and_match_label_map() -> anyhow::Result<()> {
    let pipeline = pipeline();
    let labels = get_labels();
    let results =
        pipeline.emotion_classify(ClassifyRequest::from_texts(["love rust", "hate", "rust"]))?;

    for result in results {
        let total = result.positive_probs + result.negative_probs + result.neutral_probs;
        assert!((total - 1.0).abs() < 1e-3);
        assert_eq!(labels[result.emotion_label.as_str()], result.emotion_key);
    }
    Ok(())
}

#[test]
fn rejects_empty_and_dual_inputs() {
    let pipeline = pipeline();

    let err = pipeline
        .emotion_classify(ClassifyRequest::default())
        .unwrap_err();
    assert!(matches!(err, EmotionError::InvalidInput(_)));

    let mut both = ClassifyRequest::from_texts(["a"]);
    both.data.text = vec!["b".to_string()];
    let err = pipeline.emotion_classify(both).unwrap_err();
    assert!(matches!(err, EmotionError::InvalidInput(_)));
}

#[test]
fn batch_size_does_not_change_results() -> anyhow::Result<()> {
    let pipeline = pipeline();
    let texts = ["love rust", "hate", "rust rust", "love hate rust", "rust"];

    let pairwise =
        pipeline.emotion_classify(ClassifyRequest::from_texts(texts).batch_size(2))?;
    let one_shot =
        pipeline.emotion_classify(ClassifyRequest::from_texts(texts).batch_size(texts.len()))?;

    assert_eq!(pairwise, one_shot);
    Ok(())
}

#[test]
fn out_of_vocabulary_words_still_classify() -> anyhow::Result<()> {
    let pipeline = pipeline();
    let results =
        pipeline.emotion_classify(ClassifyRequest::from_texts(["completely novel words"]))?;
    assert_eq!(results.len(), 1);

    let r = &results[0];
    let total = r.positive_probs + r.negative_probs + r.neutral_probs;
    assert!((total - 1.0).abs() < 1e-3);
    Ok(())
}

#[test]
fn sample_sentences_classify_in_pairs() -> anyhow::Result<()> {
    let pipeline = pipeline();
    let results = pipeline.emotion_classify(
        ClassifyRequest::from_texts(["今天天气真好", "别来吵我"]).batch_size(2),
    )?;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text, "今天天气真好");
    assert_eq!(results[1].text, "别来吵我");
    for result in results {
        let total = result.positive_probs + result.negative_probs + result.neutral_probs;
        assert!((total - 1.0).abs() < 1e-3);
    }
    Ok(())
}

#[test]
fn requests_deserialize_from_serving_payloads() -> anyhow::Result<()> {
    let pipeline = pipeline();

    let request: ClassifyRequest =
        serde_json::from_str(r#"{"data": {"text": ["love rust"]}, "batch_size": 2}"#)?;
    assert_eq!(request.batch_size, 2);
    assert!(!request.use_gpu);

    let results = pipeline.emotion_classify(request)?;
    assert_eq!(results.len(), 1);

    // Results serialize with the serving field names.
    let json = serde_json::to_value(&results[0])?;
    assert_eq!(json["text"], "love rust");
    assert!(json.get("emotion_label").is_some());
    assert!(json.get("emotion_key").is_some());
    assert!(json.get("positive_probs").is_some());
    Ok(())
}

#[test]
fn fixed_label_map_is_exposed() {
    let pipeline = pipeline();
    let labels = pipeline.get_labels();
    assert_eq!(labels["positive"], 2);
    assert_eq!(labels["negative"], 0);
    assert_eq!(labels["neutral"], 1);
}
