use crate::core::error::{EmotionError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Token reserved by the pretrained artifact for out-of-vocabulary words.
pub const UNK_TOKEN: &str = "<unk>";

/// Word-to-id mapping fixed by the pretrained artifact. Immutable after load.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    map: HashMap<String, u32>,
    unk_id: u32,
}

impl Vocabulary {
    /// Load a vocabulary from a plain-text file.
    ///
    /// Two line formats are accepted, matching the published artifacts:
    /// `token<TAB>id`, or a bare token whose id is its line number.
    /// Duplicate tokens keep the last id seen. The file must contain the
    /// `<unk>` sentinel.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EmotionError::file_access(path, e))?;

        let mut map = HashMap::new();
        for (line_number, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            match line.rsplit_once('\t') {
                Some((token, id)) => {
                    let id = id.trim().parse::<u32>().map_err(|_| {
                        EmotionError::VocabFormat(format!(
                            "line {}: trailing id {id:?} is not an integer",
                            line_number + 1
                        ))
                    })?;
                    map.insert(token.to_string(), id);
                }
                None => {
                    map.insert(line.to_string(), line_number as u32);
                }
            }
        }

        Self::from_map(map)
    }

    /// Build a vocabulary from in-memory entries. The `<unk>` sentinel is
    /// still required.
    pub fn from_entries<T: Into<String>>(entries: impl IntoIterator<Item = (T, u32)>) -> Result<Self> {
        let map = entries
            .into_iter()
            .map(|(token, id)| (token.into(), id))
            .collect();
        Self::from_map(map)
    }

    fn from_map(map: HashMap<String, u32>) -> Result<Self> {
        let unk_id = *map.get(UNK_TOKEN).ok_or_else(|| {
            EmotionError::VocabFormat(format!("missing `{UNK_TOKEN}` sentinel entry"))
        })?;
        Ok(Self { map, unk_id })
    }

    /// Id for a token, substituting the unknown sentinel for words the
    /// pretrained vocabulary does not contain.
    pub fn id(&self, token: &str) -> u32 {
        self.map.get(token).copied().unwrap_or(self.unk_id)
    }

    pub fn unk_id(&self) -> u32 {
        self.unk_id
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_vocab(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_tab_separated_format() {
        let file = write_vocab("<unk>\t0\n你好\t1\n天气\t2\n");
        let vocab = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id("你好"), 1);
        assert_eq!(vocab.id("天气"), 2);
    }

    #[test]
    fn loads_line_number_format() {
        let file = write_vocab("<unk>\nhello\nworld\n");
        let vocab = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocab.unk_id(), 0);
        assert_eq!(vocab.id("hello"), 1);
        assert_eq!(vocab.id("world"), 2);
    }

    #[test]
    fn unknown_tokens_map_to_sentinel() {
        let file = write_vocab("<unk>\t7\nfoo\t1\n");
        let vocab = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocab.id("never-seen"), 7);
    }

    #[test]
    fn duplicate_tokens_last_wins() {
        let file = write_vocab("<unk>\t0\nfoo\t1\nfoo\t5\n");
        let vocab = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocab.id("foo"), 5);
    }

    #[test]
    fn missing_unk_sentinel_is_rejected() {
        let file = write_vocab("foo\t1\nbar\t2\n");
        let err = Vocabulary::load(file.path()).unwrap_err();
        assert!(matches!(err, EmotionError::VocabFormat(_)));
    }

    #[test]
    fn non_numeric_id_is_rejected() {
        let file = write_vocab("<unk>\t0\nfoo\tbar\n");
        let err = Vocabulary::load(file.path()).unwrap_err();
        assert!(matches!(err, EmotionError::VocabFormat(_)));
    }

    #[test]
    fn unreadable_path_is_a_file_access_error() {
        let err = Vocabulary::load("/definitely/not/here/vocab.txt").unwrap_err();
        assert!(matches!(err, EmotionError::FileAccess { .. }));
    }
}
