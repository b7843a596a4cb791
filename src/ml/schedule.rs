// ============================================================
// Layer 5 — Learning-Rate Schedules
// ============================================================
// Two schedules ship with the trainer:
//
//   InverseTimeDecay — the one the training loop actually uses.
//       lr(step) = initial / (1 + rate · ⌊step / decay_steps⌋)
//
//   EpochExpDecay — epoch-indexed alternative: constant for the
//       first 10 epochs, then shrinks by exp(-0.1) per epoch.
//       Part of the public surface, not wired into the default
//       training path.
//
// All constants live in the training configuration; these are
// only the defaults.

/// Default schedule constants for a fresh training config.
pub const DEFAULT_INITIAL_LR: f64 = 0.01;
pub const DEFAULT_DECAY_STEPS: usize = 100;
pub const DEFAULT_DECAY_RATE: f64 = 0.9;

/// Staircase inverse-time decay indexed by the global step
/// counter. Pure function of the step, so resuming from a
/// checkpoint lands on exactly the same learning rate.
#[derive(Debug, Clone)]
pub struct InverseTimeDecay {
    initial_lr:  f64,
    decay_steps: usize,
    decay_rate:  f64,
}

impl InverseTimeDecay {
    pub fn new(initial_lr: f64, decay_steps: usize, decay_rate: f64) -> Self {
        Self { initial_lr, decay_steps, decay_rate }
    }

    pub fn lr_at(&self, step: usize) -> f64 {
        // integer division gives the staircase floor
        let intervals = (step / self.decay_steps) as f64;
        self.initial_lr / (1.0 + self.decay_rate * intervals)
    }
}

/// Epoch-indexed exponential decay: hold the learning rate for
/// the first 10 epochs, then multiply by exp(-0.1) each epoch.
#[derive(Debug, Clone)]
pub struct EpochExpDecay {
    lr: f64,
}

impl EpochExpDecay {
    pub const HOLD_EPOCHS: usize = 10;

    pub fn new(initial_lr: f64) -> Self {
        Self { lr: initial_lr }
    }

    /// Advance to `epoch` and return the rate to use for it.
    pub fn advance(&mut self, epoch: usize) -> f64 {
        if epoch >= Self::HOLD_EPOCHS {
            self.lr *= (-0.1f64).exp();
        }
        self.lr
    }
}
