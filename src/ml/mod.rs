// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn framework specific code lives in this layer — the
// model architecture, the loss, the schedules, the training
// loop and the sampling loop. Other layers stay framework-free.
//
//   cells.rs     — LSTM/GRU cells with a uniform step contract
//                  and the homogeneous recurrent stack
//   model.rs     — embedding → recurrent stack → logits, plus
//                  the build-fresh config factory
//   loss.rs      — masked sparse categorical cross-entropy
//   schedule.rs  — inverse-time decay (wired) and the
//                  epoch-indexed exponential alternative
//   trainer.rs   — the full training loop with checkpointing,
//                  telemetry and previews
//   generator.rs — autoregressive sampling with hidden-state
//                  threading and temperature scaling
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Recurrent cells and the stacked layer
pub mod cells;

/// The tune sequence model architecture
pub mod model;

/// Masked loss and accuracy over padded sequences
pub mod loss;

/// Learning-rate schedules
pub mod schedule;

/// Full training loop
pub mod trainer;

/// Autoregressive tune sampling
pub mod generator;
