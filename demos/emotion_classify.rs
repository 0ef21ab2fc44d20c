use anyhow::Result;
use emotion_textcnn::pipelines::emotion::*;

fn main() -> Result<()> {
    println!("Building pipeline...");

    let pipeline = EmotionClassificationPipelineBuilder::textcnn("infer_model").build()?;

    println!("Pipeline built successfully.");

    // Data to be predicted
    let test_text = ["今天天气真好", "湿纸巾是干垃圾", "别来吵我"];

    let results = pipeline.emotion_classify(
        ClassifyRequest::from_data(TextData {
            text: test_text.iter().map(|t| t.to_string()).collect(),
        })
        .batch_size(2),
    )?;

    for result in results {
        println!("{}", result.text);
        println!("{}", result.emotion_label);
        println!("{}", result.emotion_key);
        println!("{}", result.positive_probs);
        println!("{}", result.negative_probs);
        println!("{}", result.neutral_probs);
    }

    Ok(())
}
