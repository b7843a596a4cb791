// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training loop treats tune data as an external producer:
// it only ever asks for "all tokenised tunes" and never cares
// where they came from. Programming against this trait keeps
// the pipeline testable with in-memory data and lets a future
// source (a directory walker, a network fetch) drop in without
// touching the trainer.
//
// Implementations:
//   - JsonTuneLoader → reads a JSON array of id sequences
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

/// Any component that can produce tokenised tunes — ordered
/// sequences of vocabulary ids, one per tune, unpadded.
pub trait TuneSource {
    fn load_all(&self) -> Result<Vec<Vec<usize>>>;
}
