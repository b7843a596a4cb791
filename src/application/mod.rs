// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// training a model, or completing a tune from seed tokens.
// No ML math here and no printing — only workflow coordination.

// The training workflow
pub mod train_use_case;

// The tune-completion (sampling) workflow
pub mod complete_use_case;
