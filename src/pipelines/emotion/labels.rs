use std::collections::HashMap;

/// Number of emotion classes the pretrained classifier predicts.
pub const CLASS_COUNT: usize = 3;

/// Emotion classes, in the class-index order fixed by the training
/// convention of the pretrained artifact. This enum is the single source of
/// the label map; nothing else hardcodes class indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Negative,
    Neutral,
    Positive,
}

impl Emotion {
    pub const ALL: [Emotion; CLASS_COUNT] = [Emotion::Negative, Emotion::Neutral, Emotion::Positive];

    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn class_index(self) -> usize {
        match self {
            Emotion::Negative => 0,
            Emotion::Neutral => 1,
            Emotion::Positive => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Negative => "negative",
            Emotion::Neutral => "neutral",
            Emotion::Positive => "positive",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The labels the classifier was pretrained with. Fixed, no side effects.
pub fn get_labels() -> HashMap<&'static str, usize> {
    Emotion::ALL
        .into_iter()
        .map(|emotion| (emotion.as_str(), emotion.class_index()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_map_matches_training_convention() {
        let labels = get_labels();
        assert_eq!(labels["positive"], 2);
        assert_eq!(labels["negative"], 0);
        assert_eq!(labels["neutral"], 1);
        assert_eq!(labels.len(), CLASS_COUNT);
    }

    #[test]
    fn class_index_round_trips() {
        for emotion in Emotion::ALL {
            assert_eq!(Emotion::from_class_index(emotion.class_index()), Some(emotion));
        }
        assert_eq!(Emotion::from_class_index(CLASS_COUNT), None);
    }
}
