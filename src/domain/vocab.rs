// ============================================================
// Layer 3 — Vocabulary Table
// ============================================================
// Bidirectional mapping between tune-notation tokens (strings)
// and dense integer ids. Built once when a vocabulary file is
// loaded, read-only afterwards.
//
// Conventions carried by the id space:
//   - id 0 is the padding sentinel and never maps to a token
//   - ids are dense in [0, vocab_size)
//   - "</s>" marks the end of a tune during generation
//
// Reference: Rust Book §8 (HashMaps)

use std::collections::HashMap;

use crate::domain::error::TuneError;

/// Reserved id used to right-pad token sequences.
pub const PAD_ID: usize = 0;

/// End-of-tune sentinel token — sampling stops when it is drawn.
pub const END_OF_TUNE: &str = "</s>";

/// Token ↔ id table. The two maps are exact inverses of each
/// other; `check_inverse` verifies that after loading.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    word_to_idx: HashMap<String, usize>,
    idx_to_word: HashMap<usize, String>,
}

impl Vocabulary {
    pub fn new(
        word_to_idx: HashMap<String, usize>,
        idx_to_word: HashMap<usize, String>,
    ) -> Self {
        Self { word_to_idx, idx_to_word }
    }

    /// Number of distinct tokens in the table.
    pub fn len(&self) -> usize {
        self.word_to_idx.len()
    }

    /// The model's output dimension: one class per id in
    /// [0, vocab_size). Computed from the highest id so tables
    /// that reserve id 0 for padding without listing a token for
    /// it are still covered.
    pub fn vocab_size(&self) -> usize {
        self.idx_to_word.keys().max().map_or(0, |max| max + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.word_to_idx.is_empty()
    }

    /// Look up a token's id. Fails for tokens never seen when the
    /// vocabulary was built — including every token when the
    /// vocabulary file was missing and the table is empty.
    pub fn token_to_id(&self, token: &str) -> Result<usize, TuneError> {
        self.word_to_idx
            .get(token)
            .copied()
            .ok_or_else(|| TuneError::UnknownToken { token: token.to_string() })
    }

    /// Look up the token string for an id produced by the model.
    pub fn id_to_token(&self, id: usize) -> Result<&str, TuneError> {
        self.idx_to_word
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| TuneError::UnknownToken { token: format!("#{id}") })
    }

    /// Decode a run of model-produced ids into notation text,
    /// skipping padding ids. Used for training previews.
    pub fn decode_ids(&self, ids: &[usize]) -> Result<String, TuneError> {
        let mut out = String::new();
        for &id in ids {
            if id == PAD_ID {
                continue;
            }
            out.push_str(self.id_to_token(id)?);
        }
        Ok(out)
    }

    /// Verify that the two maps are exact inverses. Returns the
    /// first offending token if they are not.
    pub fn check_inverse(&self) -> Result<(), TuneError> {
        for (token, &id) in &self.word_to_idx {
            match self.idx_to_word.get(&id) {
                Some(t) if t == token => {}
                _ => {
                    return Err(TuneError::UnknownToken { token: token.clone() });
                }
            }
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vocab() -> Vocabulary {
        let words = [("a", 1usize), ("b", 2), (END_OF_TUNE, 3)];
        let word_to_idx: HashMap<String, usize> =
            words.iter().map(|(t, i)| (t.to_string(), *i)).collect();
        let idx_to_word: HashMap<usize, String> =
            words.iter().map(|(t, i)| (*i, t.to_string())).collect();
        Vocabulary::new(word_to_idx, idx_to_word)
    }

    #[test]
    fn test_vocab_size_covers_padding_id() {
        // ids 1..=3 plus the reserved pad id 0 → 4 classes
        assert_eq!(sample_vocab().vocab_size(), 4);
        assert_eq!(Vocabulary::default().vocab_size(), 0);
    }

    #[test]
    fn test_round_trip_lookup() {
        let vocab = sample_vocab();
        let id = vocab.token_to_id("b").unwrap();
        assert_eq!(vocab.id_to_token(id).unwrap(), "b");
    }

    #[test]
    fn test_inverse_property_holds() {
        let vocab = sample_vocab();
        assert!(vocab.check_inverse().is_ok());
    }

    #[test]
    fn test_inverse_property_violated() {
        let mut word_to_idx = HashMap::new();
        word_to_idx.insert("a".to_string(), 1);
        // idx_to_word disagrees about which token id 1 holds
        let mut idx_to_word = HashMap::new();
        idx_to_word.insert(1, "b".to_string());
        let vocab = Vocabulary::new(word_to_idx, idx_to_word);
        assert!(vocab.check_inverse().is_err());
    }

    #[test]
    fn test_unknown_token_fails() {
        let vocab = sample_vocab();
        assert!(matches!(
            vocab.token_to_id("zzz"),
            Err(TuneError::UnknownToken { .. })
        ));
        assert!(vocab.id_to_token(99).is_err());
    }

    #[test]
    fn test_empty_vocab_rejects_everything() {
        let vocab = Vocabulary::default();
        assert!(vocab.is_empty());
        assert!(vocab.token_to_id("a").is_err());
    }

    #[test]
    fn test_decode_skips_padding() {
        let vocab = sample_vocab();
        let text = vocab.decode_ids(&[1, 0, 2, 0, 0]).unwrap();
        assert_eq!(text, "ab");
    }
}
