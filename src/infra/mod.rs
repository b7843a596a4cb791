// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence and reporting concerns:
//
//   checkpoint.rs  — rotating training snapshots with an
//                    atomically published latest pointer, plus
//                    the full model artifact for inference
//
//   vocab_store.rs — loads the vocabulary table from
//                    tunes_vocab.json (missing file → empty
//                    table, failure deferred to first use)
//
//   telemetry.rs   — append-only per-step scalar metrics, one
//                    CSV per timestamp-labelled run
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Checkpoint snapshots and the saved model artifact
pub mod checkpoint;

/// Vocabulary file loading
pub mod vocab_store;

/// Per-step scalar metric sink
pub mod telemetry;
