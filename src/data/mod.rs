// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a file of tokenised tunes and the tensor
// batches the training loop consumes:
//
//   tunes.json
//       │
//       ▼
//   JsonTuneLoader    → reads arrays of vocabulary ids
//       │
//       ▼
//   TuneDataset       → shifts into (input, target) pairs,
//       │               pads to max_timesteps, implements
//       │               Burn's Dataset trait
//       ▼
//   TuneBatcher       → stacks samples into [N, T] Int tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads pre-tokenised tunes from a JSON file
pub mod loader;

/// Teacher-forced samples and Burn's Dataset trait
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
