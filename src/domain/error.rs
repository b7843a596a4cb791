// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Every failure mode the core components can produce, as one
// typed enum. The application layer wraps these in anyhow for
// reporting; nothing below the application layer recovers from
// them — training and generation failures abort the run.
//
// Loading failures for the vocabulary and model config are
// deliberately NOT raised at load time: a missing vocabulary
// yields an empty table and a missing config yields no model,
// and the hard failure happens on first real use
// (UnknownToken / ConfigNotFound / ModelNotInitialized).
//
// Reference: Rust Book §9 (Error Handling)

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuneError {
    /// A configuration file that must exist for the requested
    /// operation is missing (fatal when a model must be built fresh).
    #[error("configuration not found: {path}")]
    ConfigNotFound { path: String },

    /// A model-consuming call was attempted before any saved
    /// model artifact exists.
    #[error("model not initialized: no saved model artifact at '{path}'")]
    ModelNotInitialized { path: String },

    /// A seed or decoded token is absent from the vocabulary.
    #[error("unknown token '{token}' not present in vocabulary")]
    UnknownToken { token: String },

    /// Every position in the batch is padding, so the masked
    /// loss denominator would be zero.
    #[error("degenerate batch: all positions are padding")]
    DegenerateBatch,

    /// A checkpoint snapshot exists on disk but cannot be parsed
    /// or loaded back into the model/optimizer.
    #[error("corrupt checkpoint '{path}': {reason}")]
    CheckpointCorrupt { path: String, reason: String },

    /// The sampling loop ran for `max_new_tokens` iterations
    /// without producing the end-of-tune sentinel.
    #[error("generation exceeded {max_new_tokens} tokens without end-of-tune")]
    GenerationLimitExceeded { max_new_tokens: usize },

    /// Generation was invoked with no seed tokens at all.
    #[error("generation requires at least one seed token")]
    EmptySeed,

    /// Temperature must be a positive real number.
    #[error("invalid temperature {value}: must be > 0")]
    InvalidTemperature { value: f64 },

    /// The categorical draw over the softmax distribution failed
    /// (non-finite probabilities, zero total weight).
    #[error("sampling failed: {reason}")]
    Sampling { reason: String },
}
