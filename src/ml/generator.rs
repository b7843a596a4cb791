// ============================================================
// Layer 5 — Tune Generator
// ============================================================
// Autoregressive sampling against a trained model. The seed
// tokens are fed one at a time through the recurrent stack with
// the hidden state threaded across calls, then the loop samples
// from the final timestep's logits, feeds the drawn token back
// in, and stops at the end-of-tune sentinel.
//
// Threading the state means each step costs one cell pass
// instead of a full padded-sequence forward, and the whole seed
// context stays alive in the hidden state for as long as the
// tune runs.
//
// The loop is bounded: a model that never produces "</s>"
// surfaces GenerationLimitExceeded instead of spinning forever.

use burn::{prelude::*, tensor::activation::softmax};
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::domain::{
    error::TuneError,
    vocab::{Vocabulary, END_OF_TUNE},
};
use crate::ml::model::TuneModel;

pub struct TuneGenerator<B: Backend> {
    model: TuneModel<B>,
    vocab: Vocabulary,
    device: B::Device,
    max_new_tokens: usize,
}

impl<B: Backend> TuneGenerator<B> {
    pub fn new(
        model: TuneModel<B>,
        vocab: Vocabulary,
        device: B::Device,
        max_new_tokens: usize,
    ) -> Self {
        Self { model, vocab, device, max_new_tokens }
    }

    /// Complete a tune from seed tokens. Returns the seed plus
    /// everything sampled, concatenated, ending with "</s>".
    pub fn complete(
        &self,
        start_tokens: &[String],
        temperature: f64,
        rng: &mut impl Rng,
    ) -> Result<String, TuneError> {
        if start_tokens.is_empty() {
            return Err(TuneError::EmptySeed);
        }
        if !(temperature > 0.0) {
            return Err(TuneError::InvalidTemperature { value: temperature });
        }

        let seed_ids = start_tokens
            .iter()
            .map(|token| self.vocab.token_to_id(token))
            .collect::<Result<Vec<_>, _>>()?;

        let mut generated: Vec<String> = start_tokens.to_vec();

        // prime the recurrent state on the whole seed
        let (mut logits, mut state) = {
            let mut state = self.model.init_state(&self.device);
            let mut last = None;
            for &id in &seed_ids {
                let (l, s) = self.model.step_token(id, state, &self.device);
                last = Some(l);
                state = s;
            }
            match last {
                Some(logits) => (logits, state),
                None => return Err(TuneError::EmptySeed),
            }
        };

        for _ in 0..self.max_new_tokens {
            let next_id = sample_categorical(logits, temperature, rng)?;
            let token = self.vocab.id_to_token(next_id)?.to_string();
            generated.push(token.clone());

            if token == END_OF_TUNE {
                return Ok(generated.concat());
            }

            let (l, s) = self.model.step_token(next_id, state, &self.device);
            logits = l;
            state = s;
        }

        Err(TuneError::GenerationLimitExceeded { max_new_tokens: self.max_new_tokens })
    }
}

/// Draw one class from logits scaled by 1/temperature. Low
/// temperatures sharpen toward the argmax, high ones flatten
/// toward uniform.
pub fn sample_categorical<B: Backend>(
    logits: Tensor<B, 1>,
    temperature: f64,
    rng: &mut impl Rng,
) -> Result<usize, TuneError> {
    let probs = softmax(logits / temperature, 0);
    let probs: Vec<f32> = probs
        .into_data()
        .to_vec()
        .map_err(|e| TuneError::Sampling { reason: format!("{e:?}") })?;

    let dist = WeightedIndex::new(&probs)
        .map_err(|e| TuneError::Sampling { reason: e.to_string() })?;
    Ok(dist.sample(rng))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashMap;

    use crate::ml::cells::UnitType;
    use crate::ml::model::{DataDimensions, ModelSpec, RnnSpec};

    type TestBackend = burn::backend::NdArray;

    fn tiny_vocab() -> Vocabulary {
        // id 0 gets a token too: an untrained model can sample the
        // pad id, and this test is about boundedness, not decoding
        let words = [("<pad>", 0usize), ("a", 1), ("b", 2), (END_OF_TUNE, 3)];
        let word_to_idx: HashMap<String, usize> =
            words.iter().map(|(t, i)| (t.to_string(), *i)).collect();
        let idx_to_word: HashMap<usize, String> =
            words.iter().map(|(t, i)| (*i, t.to_string())).collect();
        Vocabulary::new(word_to_idx, idx_to_word)
    }

    fn tiny_generator(max_new_tokens: usize) -> TuneGenerator<TestBackend> {
        let device = Default::default();
        let spec = ModelSpec {
            tune_embedding_size: 6,
            rnn: RnnSpec { unit_type: UnitType::Lstm, num_units: 8, num_layers: 1 },
        };
        let dims = DataDimensions { max_timesteps: 16, tune_vocab_size: 4 };
        let model = spec.init::<TestBackend>(&dims, &device);
        TuneGenerator::new(model, tiny_vocab(), device, max_new_tokens)
    }

    #[test]
    fn test_low_temperature_converges_to_argmax() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let logits = Tensor::<TestBackend, 1>::from_floats([0.1f32, 3.0, 0.5], &device);
            let drawn = sample_categorical(logits, 0.05, &mut rng).unwrap();
            assert_eq!(drawn, 1);
        }
    }

    #[test]
    fn test_high_temperature_flattens() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let logits = Tensor::<TestBackend, 1>::from_floats([0.1f32, 3.0, 0.5], &device);
            seen.insert(sample_categorical(logits, 1e6, &mut rng).unwrap());
        }
        assert!(seen.len() > 1, "near-uniform sampling drew a single class");
    }

    #[test]
    fn test_generation_is_bounded() {
        let generator = tiny_generator(4);
        let mut rng = StdRng::seed_from_u64(42);
        let seed = vec!["a".to_string()];

        match generator.complete(&seed, 1.0, &mut rng) {
            Ok(tune) => {
                assert!(tune.starts_with('a'));
                assert!(tune.ends_with(END_OF_TUNE));
            }
            Err(TuneError::GenerationLimitExceeded { max_new_tokens }) => {
                assert_eq!(max_new_tokens, 4);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_seed_token_fails() {
        let generator = tiny_generator(4);
        let mut rng = StdRng::seed_from_u64(1);
        let seed = vec!["zzz".to_string()];
        assert!(matches!(
            generator.complete(&seed, 1.0, &mut rng),
            Err(TuneError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_empty_seed_and_bad_temperature_rejected() {
        let generator = tiny_generator(4);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            generator.complete(&[], 1.0, &mut rng),
            Err(TuneError::EmptySeed)
        ));
        assert!(matches!(
            generator.complete(&["a".to_string()], 0.0, &mut rng),
            Err(TuneError::InvalidTemperature { .. })
        ));
    }
}
