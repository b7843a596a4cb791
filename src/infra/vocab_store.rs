// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Loads the vocabulary table from tunes_vocab.json. The file
// carries both directions of the mapping:
//
//   { "word_to_idx": { "</s>": 3, "a": "1", ... },
//     "idx_to_word": { "1": "a", "3": "</s>", ... } }
//
// Producers disagree about whether ids are JSON numbers or
// strings, so both are accepted. A missing file is NOT an
// error here — it yields an empty table, and the failure
// surfaces as UnknownToken (or ConfigNotFound at model build)
// on first real use.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::PathBuf};

use crate::domain::vocab::Vocabulary;

pub const VOCAB_FILE: &str = "tunes_vocab.json";

#[derive(Debug, Deserialize)]
struct VocabFile {
    word_to_idx: HashMap<String, IdValue>,
    idx_to_word: HashMap<String, String>,
}

/// An id encoded either as a JSON number or a decimal string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Int(usize),
    Text(String),
}

impl IdValue {
    fn as_usize(&self) -> Result<usize> {
        match self {
            IdValue::Int(v) => Ok(*v),
            IdValue::Text(s) => s
                .parse::<usize>()
                .with_context(|| format!("vocabulary id '{s}' is not an integer")),
        }
    }
}

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn load(&self) -> Result<Vocabulary> {
        let path = self.dir.join(VOCAB_FILE);
        if !path.exists() {
            tracing::warn!(
                "No vocabulary file at '{}' — starting with an empty table",
                path.display()
            );
            return Ok(Vocabulary::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("cannot read vocabulary '{}'", path.display()))?;
        let file: VocabFile = serde_json::from_str(&raw)
            .with_context(|| format!("cannot parse vocabulary '{}'", path.display()))?;

        let mut word_to_idx = HashMap::with_capacity(file.word_to_idx.len());
        for (token, id) in &file.word_to_idx {
            word_to_idx.insert(token.clone(), id.as_usize()?);
        }
        let mut idx_to_word = HashMap::with_capacity(file.idx_to_word.len());
        for (id, token) in &file.idx_to_word {
            let id = id
                .parse::<usize>()
                .with_context(|| format!("vocabulary id '{id}' is not an integer"))?;
            idx_to_word.insert(id, token.clone());
        }

        let vocab = Vocabulary::new(word_to_idx, idx_to_word);
        if vocab.check_inverse().is_err() {
            tracing::warn!("Vocabulary maps in '{}' are not exact inverses", path.display());
        }
        tracing::info!("Loaded vocabulary with {} tokens", vocab.len());
        Ok(vocab)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn write_vocab(dir: &std::path::Path, json: &str) {
        fs::write(dir.join(VOCAB_FILE), json).unwrap();
    }

    #[test]
    fn test_load_with_string_encoded_ids() {
        let dir = tempfile::tempdir().unwrap();
        write_vocab(
            dir.path(),
            r#"{ "word_to_idx": { "a": "1", "b": 2, "</s>": "3" },
                 "idx_to_word": { "1": "a", "2": "b", "3": "</s>" } }"#,
        );

        let vocab = VocabStore::new(dir.path()).load().unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.token_to_id("a").unwrap(), 1);
        assert_eq!(vocab.id_to_token(2).unwrap(), "b");
        // the two maps round-trip exactly
        assert!(vocab.check_inverse().is_ok());
    }

    #[test]
    fn test_missing_file_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let vocab = VocabStore::new(dir.path()).load().unwrap();
        assert!(vocab.is_empty());
    }

    #[test]
    fn test_non_numeric_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_vocab(
            dir.path(),
            r#"{ "word_to_idx": { "a": "one" }, "idx_to_word": { "1": "a" } }"#,
        );
        assert!(VocabStore::new(dir.path()).load().is_err());
    }
}
