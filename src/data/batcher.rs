// ============================================================
// Layer 4 — Tune Batcher
// ============================================================
// Implements Burn's Batcher trait to stack TuneSamples into
// integer tensor batches for the model forward pass.
//
// Input:  Vec of N TuneSamples, sequences of length T
// Output: TuneBatch with input/target tensors of shape [N, T]
//
// All sequences are pre-padded to the same length by the
// dataset, so batching is a flatten-then-reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TuneSample;

/// A batch of teacher-forced tune samples. Both tensors have
/// shape [batch_size, max_timesteps]; position 0 in the id
/// space is padding.
#[derive(Debug, Clone)]
pub struct TuneBatch<B: Backend> {
    pub inputs:  Tensor<B, 2, Int>,
    pub targets: Tensor<B, 2, Int>,
}

/// Holds the target device so tensors land where the model runs.
#[derive(Clone, Debug)]
pub struct TuneBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TuneBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TuneSample, TuneBatch<B>> for TuneBatcher<B> {
    fn batch(&self, items: Vec<TuneSample>) -> TuneBatch<B> {
        let batch_size = items.len();
        // All sequences share one length — padded by the dataset
        let seq_len = items[0].input_ids.len();

        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.target_ids.iter().map(|&x| x as i32))
            .collect();

        let inputs = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1, Int>::from_ints(target_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        TuneBatch { inputs, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let device = Default::default();
        let batcher = TuneBatcher::<TestBackend>::new(device);

        let samples = vec![
            TuneSample { input_ids: vec![1, 2, 0], target_ids: vec![2, 3, 0] },
            TuneSample { input_ids: vec![4, 0, 0], target_ids: vec![5, 0, 0] },
        ];
        let batch = batcher.batch(samples);

        assert_eq!(batch.inputs.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2, 3]);

        let inputs: Vec<i64> = batch.inputs.into_data().to_vec().unwrap();
        assert_eq!(inputs, vec![1, 2, 0, 4, 0, 0]);
        let targets: Vec<i64> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![2, 3, 0, 5, 0, 0]);
    }
}
