pub mod textcnn;

pub use textcnn::{Config as TextCnnConfig, TextCnn, TextCnnEmotionModel, TextCnnOptions, TextCnnSource};
