// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Load the vocabulary table      (Layer 6 - infra)
//   Step 2: Load the model configuration   (Layer 6 - infra)
//   Step 3: Apply the load-existing gate   (Layer 6 - infra)
//   Step 4: Load + shape the tune dataset  (Layer 4 - data)
//   Step 5: Open telemetry for this run    (Layer 6 - infra)
//   Step 6: Run the training loop          (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::data::{dataset::TuneDataset, loader::JsonTuneLoader};
use crate::domain::{error::TuneError, traits::TuneSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    telemetry::TelemetrySink,
    vocab_store::{VocabStore, VOCAB_FILE},
};
use crate::ml::{
    model::{DataDimensions, ModelSpec},
    schedule::{DEFAULT_DECAY_RATE, DEFAULT_DECAY_STEPS, DEFAULT_INITIAL_LR},
    trainer::{run_training, EpochSummary},
};

pub const MODEL_CONFIG_FILE: &str = "model.json";

// ─── Training Configuration ──────────────────────────────────────────────────
// Every knob of a run in one explicit struct — cadences,
// schedule constants, shapes. Serialisable so a run's settings
// can be inspected after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub model_dir: String,
    pub data_path: String,
    pub max_timesteps: usize,
    pub batch_size:    usize,
    pub num_epochs:    usize,
    /// Log a decoded output preview every N steps
    pub print_outputs_frequency: usize,
    /// Checkpoint every N steps (epoch boundaries always checkpoint)
    pub save_frequency: usize,
    pub initial_learning_rate: f64,
    pub decay_steps: usize,
    pub decay_rate:  f64,
    pub max_checkpoints: usize,
    /// Refuse to train unless a saved model artifact already
    /// exists — the original load-existing-only behaviour.
    pub require_existing: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model_dir: "model".to_string(),
            data_path: "data/tunes.json".to_string(),
            max_timesteps: 255,
            batch_size:    16,
            num_epochs:    100,
            print_outputs_frequency: 100,
            save_frequency: 1000,
            initial_learning_rate: DEFAULT_INITIAL_LR,
            decay_steps: DEFAULT_DECAY_STEPS,
            decay_rate:  DEFAULT_DECAY_RATE,
            max_checkpoints: 3,
            require_existing: false,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<EpochSummary>> {
        let cfg = &self.config;
        let model_dir = Path::new(&cfg.model_dir);

        // ── Step 1: vocabulary ───────────────────────────────────────────────
        // A missing file loads as empty; training is a real use,
        // so an empty table hardens into ConfigNotFound here.
        let vocab = VocabStore::new(model_dir).load()?;
        if vocab.is_empty() {
            return Err(TuneError::ConfigNotFound {
                path: model_dir.join(VOCAB_FILE).display().to_string(),
            }
            .into());
        }
        let dims = DataDimensions {
            max_timesteps:   cfg.max_timesteps,
            tune_vocab_size: vocab.vocab_size(),
        };

        // ── Step 2: model configuration ──────────────────────────────────────
        let spec = load_model_spec(model_dir)?;

        // ── Step 3: load-existing-only gate ──────────────────────────────────
        let ckpt = CheckpointManager::new(model_dir, cfg.max_checkpoints);
        if cfg.require_existing && !ckpt.artifact_exists() {
            return Err(TuneError::ModelNotInitialized {
                path: model_dir.display().to_string(),
            }
            .into());
        }

        // ── Step 4: dataset ──────────────────────────────────────────────────
        let tunes = JsonTuneLoader::new(&cfg.data_path).load_all()?;
        let dataset = TuneDataset::from_tunes(&tunes, cfg.max_timesteps);
        anyhow::ensure!(
            dataset.sample_count() > 0,
            "no trainable tunes in '{}'",
            cfg.data_path
        );
        tracing::info!("Dataset ready: {} samples", dataset.sample_count());

        // ── Step 5: telemetry ────────────────────────────────────────────────
        let mut telemetry = TelemetrySink::new(model_dir.join("telemetry"))?;

        // ── Step 6: train ────────────────────────────────────────────────────
        run_training(cfg, &spec, &dims, dataset, &vocab, &ckpt, &mut telemetry)
    }
}

/// Read the model configuration JSON. Missing file is fatal when
/// a model must be built fresh.
fn load_model_spec(model_dir: &Path) -> Result<ModelSpec> {
    let path = model_dir.join(MODEL_CONFIG_FILE);
    if !path.exists() {
        return Err(TuneError::ConfigNotFound { path: path.display().to_string() }.into());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("cannot read model config '{}'", path.display()))?;
    let spec: ModelSpec = serde_json::from_str(&raw)
        .with_context(|| format!("cannot parse model config '{}'", path.display()))?;
    tracing::info!("Model config: {:?}", spec);
    Ok(spec)
}
