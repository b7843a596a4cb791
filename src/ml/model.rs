// ============================================================
// Layer 5 — Tune Sequence Model
// ============================================================
// Maps a padded integer token sequence to per-timestep
// next-token logits over the vocabulary:
//
//   [batch, timesteps] Int
//       │  embedding (pad id 0 → zero vector)
//       ▼
//   [batch, timesteps, embedding]
//       │  stacked recurrent cells, forward direction,
//       │  masked positions zeroed and state held
//       ▼
//   [batch, timesteps, hidden]
//       │  linear projection, no activation
//       ▼
//   [batch, timesteps, vocab] raw logits
//
// `ModelSpec::init` is the build-fresh factory: it constructs a
// model from configuration alone, regardless of whether a saved
// artifact exists. Loading weights into it is the checkpoint
// manager's job.

use burn::{
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::ml::cells::{RecurrentStack, StackState, UnitType};

// ─── Configuration ────────────────────────────────────────────────────────────
// Mirrors the on-disk model configuration JSON exactly:
//   { "tune_embedding_size": 96,
//     "rnn": { "unit_type": "lstm", "num_units": 256, "num_layers": 2 } }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RnnSpec {
    pub unit_type:  UnitType,
    pub num_units:  usize,
    pub num_layers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub tune_embedding_size: usize,
    pub rnn: RnnSpec,
}

/// Shape of the data the model is built against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDimensions {
    pub max_timesteps:   usize,
    pub tune_vocab_size: usize,
}

impl ModelSpec {
    /// Build a fresh model with randomly initialised parameters.
    pub fn init<B: Backend>(&self, dims: &DataDimensions, device: &B::Device) -> TuneModel<B> {
        let embedding =
            EmbeddingConfig::new(dims.tune_vocab_size, self.tune_embedding_size).init(device);
        let rnn = RecurrentStack::new(
            self.rnn.unit_type,
            self.rnn.num_units,
            self.rnn.num_layers,
            self.tune_embedding_size,
            device,
        );
        let output = LinearConfig::new(self.rnn.num_units, dims.tune_vocab_size).init(device);
        TuneModel {
            embedding,
            rnn,
            output,
            d_embedding: self.tune_embedding_size,
            vocab_size: dims.tune_vocab_size,
            max_timesteps: dims.max_timesteps,
        }
    }
}

// ─── TuneModel ────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct TuneModel<B: Backend> {
    pub embedding: Embedding<B>,
    pub rnn:       RecurrentStack<B>,
    pub output:    Linear<B>,
    pub d_embedding:   usize,
    pub vocab_size:    usize,
    pub max_timesteps: usize,
}

impl<B: Backend> TuneModel<B> {
    /// tokens: [batch, timesteps] → logits: [batch, timesteps, vocab]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let mask = tokens.clone().equal_elem(0).bool_not().float();

        let embedded = self.embedding.forward(tokens);
        // pad embeddings are zeroed so they carry nothing into the stack
        let pad_mask = mask
            .clone()
            .unsqueeze_dim::<3>(2)
            .repeat_dim(2, self.d_embedding);
        let embedded = embedded * pad_mask;

        let hidden = self.rnn.forward(embedded, mask);
        self.output.forward(hidden)
    }

    /// Zero recurrent state for single-sequence generation.
    pub fn init_state(&self, device: &B::Device) -> StackState<B> {
        self.rnn.init_state(1, device)
    }

    /// Advance generation by one token: returns the next-token
    /// logits [vocab] and the threaded recurrent state.
    pub fn step_token(
        &self,
        token_id: usize,
        state: StackState<B>,
        device: &B::Device,
    ) -> (Tensor<B, 1>, StackState<B>) {
        let token = Tensor::<B, 2, Int>::from_ints([[token_id as i32]], device);
        let embedded = self.embedding.forward(token).reshape([1, self.d_embedding]);
        let (out, state) = self.rnn.step(embedded, state);
        let logits = self.output.forward(out).reshape([self.vocab_size]);
        (logits, state)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn tiny_spec(unit_type: UnitType) -> ModelSpec {
        ModelSpec {
            tune_embedding_size: 8,
            rnn: RnnSpec { unit_type, num_units: 12, num_layers: 2 },
        }
    }

    fn dims() -> DataDimensions {
        DataDimensions { max_timesteps: 5, tune_vocab_size: 7 }
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        for unit in [UnitType::Lstm, UnitType::Gru] {
            let model = tiny_spec(unit).init::<TestBackend>(&dims(), &device);
            let tokens =
                Tensor::<TestBackend, 2, Int>::from_ints([[1, 2, 3, 0, 0], [4, 0, 0, 0, 0]], &device);
            let logits = model.forward(tokens);
            assert_eq!(logits.dims(), [2, 5, 7]);
        }
    }

    #[test]
    fn test_forward_is_causal() {
        // changing a later token must not change earlier logits
        let device = Default::default();
        let model = tiny_spec(UnitType::Lstm).init::<TestBackend>(&dims(), &device);

        let a = Tensor::<TestBackend, 2, Int>::from_ints([[5, 2, 0, 0, 0]], &device);
        let b = Tensor::<TestBackend, 2, Int>::from_ints([[5, 2, 6, 0, 0]], &device);

        let first_two = |t: Tensor<TestBackend, 3>| -> Vec<f32> {
            t.slice([0..1, 0..2, 0..7])
                .reshape([14])
                .into_data()
                .to_vec()
                .unwrap()
        };

        assert_eq!(first_two(model.forward(a)), first_two(model.forward(b)));
    }

    #[test]
    fn test_step_token_matches_vocab_width() {
        let device = Default::default();
        let model = tiny_spec(UnitType::Gru).init::<TestBackend>(&dims(), &device);
        let state = model.init_state(&device);
        let (logits, _) = model.step_token(3, state, &device);
        assert_eq!(logits.dims(), [7]);
    }
}
