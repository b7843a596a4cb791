// ============================================================
// Layer 2 — CompleteUseCase
// ============================================================
// Loads the saved model artifact plus the vocabulary table and
// samples one tune completion. Generation is load-existing-only
// by design: without an artifact on disk this fails with
// ModelNotInitialized rather than building an untrained model.
//
// Generation shares no mutable state with a training run, but
// both read and write the same model directory — running them
// concurrently against one directory needs external exclusion.

use anyhow::Result;
use rand::thread_rng;
use std::path::Path;

use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::generator::TuneGenerator;

type SampleBackend = burn::backend::NdArray;

pub struct CompleteConfig {
    pub model_dir: String,
    pub temperature: f64,
    pub max_new_tokens: usize,
    pub max_checkpoints: usize,
}

pub struct CompleteUseCase {
    config: CompleteConfig,
}

impl CompleteUseCase {
    pub fn new(config: CompleteConfig) -> Self {
        Self { config }
    }

    /// Complete a tune from the given seed tokens.
    pub fn execute(&self, start_tokens: &[String]) -> Result<String> {
        let cfg = &self.config;
        let model_dir = Path::new(&cfg.model_dir);

        let vocab = VocabStore::new(model_dir).load()?;

        let device = burn::backend::ndarray::NdArrayDevice::default();
        let ckpt = CheckpointManager::new(model_dir, cfg.max_checkpoints);
        let (model, artifact) = ckpt.load_artifact::<SampleBackend>(&device)?;
        tracing::info!(
            "Sampling with {:?} × {} layers at temperature {}",
            artifact.model.rnn.unit_type,
            artifact.model.rnn.num_layers,
            cfg.temperature,
        );

        let generator = TuneGenerator::new(model, vocab, device, cfg.max_new_tokens);
        let mut rng = thread_rng();
        let tune = generator.complete(start_tokens, cfg.temperature, &mut rng)?;
        Ok(tune)
    }
}
