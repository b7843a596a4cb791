// ============================================================
// Layer 4 — Tune Dataset
// ============================================================
// Turns raw tokenised tunes into teacher-forced training pairs
// and exposes them through Burn's Dataset trait so the
// DataLoader can drive batching.
//
// Sample format for a tune [t0, t1, ..., tn]:
//   input  = [t0, t1, ..., tn-1]  padded with 0 to max_timesteps
//   target = [t1, t2, ..., tn  ]  padded with 0 to max_timesteps
//
// The shift is what makes every timestep a next-token
// prediction problem. Tunes longer than max_timesteps + 1 are
// truncated; tunes shorter than 2 tokens carry no transition
// and are dropped.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::vocab::PAD_ID;

/// One fully shifted and padded training sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneSample {
    pub input_ids:  Vec<usize>,
    pub target_ids: Vec<usize>,
}

impl TuneSample {
    /// Build a teacher-forced sample from one tokenised tune.
    /// Returns None for tunes too short to contain a transition.
    pub fn from_tokens(tokens: &[usize], max_timesteps: usize) -> Option<Self> {
        if tokens.len() < 2 {
            return None;
        }
        // Keep at most max_timesteps transitions
        let tokens = if tokens.len() > max_timesteps + 1 {
            &tokens[..max_timesteps + 1]
        } else {
            tokens
        };

        let mut input_ids: Vec<usize> = tokens[..tokens.len() - 1].to_vec();
        let mut target_ids: Vec<usize> = tokens[1..].to_vec();
        input_ids.resize(max_timesteps, PAD_ID);
        target_ids.resize(max_timesteps, PAD_ID);

        Some(Self { input_ids, target_ids })
    }

    /// Number of real (non-padding) timesteps in the sample.
    pub fn content_len(&self) -> usize {
        self.target_ids.iter().filter(|&&id| id != PAD_ID).count()
    }
}

pub struct TuneDataset {
    samples: Vec<TuneSample>,
}

impl TuneDataset {
    pub fn new(samples: Vec<TuneSample>) -> Self {
        Self { samples }
    }

    /// Shift and pad every tune, dropping the ones too short to train on.
    pub fn from_tunes(tunes: &[Vec<usize>], max_timesteps: usize) -> Self {
        let samples = tunes
            .iter()
            .filter_map(|t| TuneSample::from_tokens(t, max_timesteps))
            .collect();
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<TuneSample> for TuneDataset {
    fn get(&self, index: usize) -> Option<TuneSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_and_pad() {
        let sample = TuneSample::from_tokens(&[5, 9, 2], 6).unwrap();
        assert_eq!(sample.input_ids, vec![5, 9, 0, 0, 0, 0]);
        assert_eq!(sample.target_ids, vec![9, 2, 0, 0, 0, 0]);
        assert_eq!(sample.content_len(), 2);
    }

    #[test]
    fn test_long_tune_truncated() {
        let tokens: Vec<usize> = (1..=10).collect();
        let sample = TuneSample::from_tokens(&tokens, 4).unwrap();
        assert_eq!(sample.input_ids, vec![1, 2, 3, 4]);
        assert_eq!(sample.target_ids, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_short_tunes_dropped() {
        assert!(TuneSample::from_tokens(&[], 4).is_none());
        assert!(TuneSample::from_tokens(&[7], 4).is_none());

        let dataset = TuneDataset::from_tunes(&[vec![7], vec![1, 2, 3]], 4);
        assert_eq!(dataset.sample_count(), 1);
    }

    #[test]
    fn test_dataset_trait() {
        let dataset = TuneDataset::from_tunes(&[vec![1, 2, 3], vec![4, 5]], 4);
        assert_eq!(dataset.len(), 2);
        assert!(dataset.get(1).is_some());
        assert!(dataset.get(2).is_none());
    }
}
