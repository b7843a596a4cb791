// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `complete`, and all
// their configurable flags. clap's derive macros generate the
// help text, error messages and type conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::complete_use_case::CompleteConfig;
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the tune model on a file of tokenised tunes
    Train(TrainArgs),

    /// Complete a tune from seed tokens using the saved model
    Complete(CompleteArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Directory holding model.json, tunes_vocab.json, and all
    /// training outputs (artifact, checkpoints, telemetry)
    #[arg(long, default_value = "model")]
    pub model_dir: String,

    /// JSON file of tokenised tunes (arrays of vocabulary ids)
    #[arg(long, default_value = "data/tunes.json")]
    pub data_path: String,

    /// Padded sequence length every sample is shaped to
    #[arg(long, default_value_t = 255)]
    pub max_timesteps: usize,

    /// Samples per gradient step
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 100)]
    pub num_epochs: usize,

    /// Log a decoded output preview every N steps
    #[arg(long, default_value_t = 100)]
    pub print_outputs_frequency: usize,

    /// Checkpoint every N steps
    #[arg(long, default_value_t = 1000)]
    pub save_frequency: usize,

    /// Starting learning rate for the inverse-time decay
    #[arg(long, default_value_t = 0.01)]
    pub initial_learning_rate: f64,

    /// Steps per decay interval
    #[arg(long, default_value_t = 100)]
    pub decay_steps: usize,

    /// Decay strength per interval
    #[arg(long, default_value_t = 0.9)]
    pub decay_rate: f64,

    /// How many checkpoint snapshots to retain
    #[arg(long, default_value_t = 3)]
    pub max_checkpoints: usize,

    /// Refuse to train unless a saved model artifact already exists
    #[arg(long, default_value_t = false)]
    pub require_existing: bool,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            model_dir:     a.model_dir,
            data_path:     a.data_path,
            max_timesteps: a.max_timesteps,
            batch_size:    a.batch_size,
            num_epochs:    a.num_epochs,
            print_outputs_frequency: a.print_outputs_frequency,
            save_frequency: a.save_frequency,
            initial_learning_rate: a.initial_learning_rate,
            decay_steps: a.decay_steps,
            decay_rate:  a.decay_rate,
            max_checkpoints: a.max_checkpoints,
            require_existing: a.require_existing,
        }
    }
}

/// All arguments for the `complete` command.
#[derive(Args, Debug, Clone)]
pub struct CompleteArgs {
    /// Seed tokens to start the tune from, space separated
    #[arg(long, num_args = 1..)]
    pub seed: Vec<String>,

    /// Sampling temperature: below 1 sharpens toward the argmax,
    /// above 1 flattens toward uniform
    #[arg(long, default_value_t = 1.0)]
    pub temperature: f64,

    /// Stop with an error after this many sampled tokens if the
    /// end-of-tune sentinel never appears
    #[arg(long, default_value_t = 512)]
    pub max_new_tokens: usize,

    /// Directory the model was trained into
    #[arg(long, default_value = "model")]
    pub model_dir: String,

    /// How many checkpoint snapshots to retain
    #[arg(long, default_value_t = 3)]
    pub max_checkpoints: usize,
}

impl From<&CompleteArgs> for CompleteConfig {
    fn from(a: &CompleteArgs) -> Self {
        CompleteConfig {
            model_dir: a.model_dir.clone(),
            temperature: a.temperature,
            max_new_tokens: a.max_new_tokens,
            max_checkpoints: a.max_checkpoints,
        }
    }
}
