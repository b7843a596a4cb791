// ============================================================
// Layer 5 — Masked Loss
// ============================================================
// Sparse categorical cross-entropy over padded sequences. The
// mask is derived from the TARGET pad-id positions: a position
// counts toward the loss exactly when its target is a real
// token. The denominator is the number of real positions, so a
// batch with p padded positions out of T averages over T - p.
//
// An all-pad batch has no denominator; that surfaces as
// DegenerateBatch instead of a silent NaN.

use burn::{prelude::*, tensor::activation::log_softmax};

use crate::domain::error::TuneError;

/// logits: [batch, timesteps, vocab], targets: [batch, timesteps]
/// → scalar mean negative log-likelihood over non-pad positions.
pub fn masked_cross_entropy<B: Backend>(
    logits: Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
) -> Result<Tensor<B, 1>, TuneError> {
    let [batch, timesteps, _vocab] = logits.dims();

    let log_probs = log_softmax(logits, 2);
    let picked = log_probs.gather(2, targets.clone().unsqueeze_dim::<3>(2));
    let nll = picked.reshape([batch, timesteps]).neg();

    let mask = targets.equal_elem(0).bool_not().float();
    let denom = mask.clone().sum();

    let real_positions: f32 = denom.clone().into_scalar().elem();
    if real_positions == 0.0 {
        return Err(TuneError::DegenerateBatch);
    }

    Ok((nll * mask).sum() / denom)
}

/// Fraction of non-pad positions whose argmax prediction equals
/// the target. Reported in the per-epoch history; 0.0 for an
/// all-pad batch.
pub fn masked_accuracy<B: Backend>(logits: Tensor<B, 3>, targets: Tensor<B, 2, Int>) -> f64 {
    let [batch, timesteps, _vocab] = logits.dims();

    let predictions = logits.argmax(2).reshape([batch, timesteps]);
    let mask = targets.clone().equal_elem(0).bool_not().float();
    let correct = predictions.equal(targets).float() * mask.clone();

    let denom: f32 = mask.sum().into_scalar().elem();
    if denom == 0.0 {
        return 0.0;
    }
    let hits: f32 = correct.sum().into_scalar().elem();
    (hits / denom) as f64
}
