// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Drives epochs × steps over the tune dataset:
//
//   restore latest checkpoint (or cold-start)
//   per step:  forward → masked loss → backward → clipped Adam
//              update at the scheduled rate → bump step counter
//              → report the loss scalar → periodic preview /
//              checkpoint
//   per epoch: persist the full model artifact + a checkpoint,
//              append aggregates to the in-memory history
//
// Failure semantics are deliberate: a malformed batch, a
// degenerate all-pad batch, or a failed checkpoint save aborts
// the whole run. Nothing here retries.
//
// The step counter, Adam moments and the learning-rate schedule
// all advance in exact step order — batches are consumed one at
// a time, and every save blocks the loop, so a crash between
// steps never leaves model and optimizer state out of sync.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    grad_clipping::GradientClippingConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::TuneBatcher, dataset::TuneDataset};
use crate::domain::vocab::Vocabulary;
use crate::infra::{
    checkpoint::{CheckpointManager, Restore},
    telemetry::TelemetrySink,
};
use crate::ml::{
    loss::{masked_accuracy, masked_cross_entropy},
    model::{DataDimensions, ModelSpec},
    schedule::InverseTimeDecay,
};

pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Gradients are clipped per tensor to this L2 norm before the
/// Adam update.
pub const GRAD_CLIP_NORM: f32 = 3.0;

/// End-of-epoch aggregates, accumulated in memory and returned
/// to the caller when the run completes.
#[derive(Debug, Clone)]
pub struct EpochSummary {
    pub epoch:    usize,
    pub loss:     f64,
    pub accuracy: f64,
}

pub fn run_training(
    cfg: &TrainConfig,
    spec: &ModelSpec,
    dims: &DataDimensions,
    dataset: TuneDataset,
    vocab: &Vocabulary,
    ckpt: &CheckpointManager,
    telemetry: &mut TelemetrySink,
) -> Result<Vec<EpochSummary>> {
    let device = burn::backend::ndarray::NdArrayDevice::default();
    tracing::info!(
        "Model ready: {:?} × {} layers, {} units, vocab {}",
        spec.rnn.unit_type,
        spec.rnn.num_layers,
        spec.rnn.num_units,
        dims.tune_vocab_size,
    );

    let model = spec.init::<TrainBackend>(dims, &device);
    let optim_cfg = AdamConfig::new()
        .with_epsilon(1e-8)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(GRAD_CLIP_NORM)));
    let optim = optim_cfg.init();

    // ── Resume or cold-start ──────────────────────────────────────────────────
    let (mut model, mut optim, mut step) = match ckpt.restore_latest(model, optim, &device)? {
        Restore::Resumed { model, optim, step } => {
            tracing::info!("Restored from checkpoint at step {}", step);
            (model, optim, step)
        }
        Restore::ColdStart { model, optim } => {
            tracing::info!("Initializing from scratch");
            (model, optim, 0)
        }
    };

    let schedule = InverseTimeDecay::new(cfg.initial_learning_rate, cfg.decay_steps, cfg.decay_rate);

    let batcher = TuneBatcher::<TrainBackend>::new(device.clone());
    let loader = DataLoaderBuilder::new(batcher)
        .batch_size(cfg.batch_size)
        .shuffle(42)
        .num_workers(1)
        .build(dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut history = Vec::with_capacity(cfg.num_epochs);

    for epoch in 0..cfg.num_epochs {
        let mut loss_sum = 0.0f64;
        let mut acc_sum = 0.0f64;
        let mut batches = 0usize;

        for (i, batch) in loader.iter().enumerate() {
            let logits = model.forward(batch.inputs.clone());
            let loss = masked_cross_entropy(logits.clone(), batch.targets.clone())?;
            let loss_value: f64 = loss.clone().into_scalar().elem();

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(schedule.lr_at(step), model, grads);
            step += 1;

            telemetry.scalar("cross_entropy", loss_value, step)?;

            if i % cfg.print_outputs_frequency == 0 {
                // decode the batch's argmax logits for human inspection;
                // reads only, never mutates model state
                let preview = decode_preview(logits.clone(), vocab)?;
                tracing::info!("---------- Generated Output -----------");
                tracing::info!("{}", preview);
                tracing::info!(".......................................");
            }
            if i % cfg.save_frequency == 0 {
                ckpt.save(&model, &optim, step)?;
            }

            loss_sum += loss_value;
            acc_sum += masked_accuracy(logits, batch.targets);
            batches += 1;
        }

        // ── End of epoch: artifact + checkpoint + aggregates ─────────────────
        ckpt.save_artifact(&model, spec, dims)?;
        ckpt.save(&model, &optim, step)?;

        let summary = EpochSummary {
            epoch,
            loss: if batches > 0 { loss_sum / batches as f64 } else { f64::NAN },
            accuracy: if batches > 0 { acc_sum / batches as f64 } else { 0.0 },
        };
        if epoch % 50 == 0 {
            tracing::info!(
                "Epoch {:03}: Loss: {:.3}, Accuracy: {:.3}%",
                epoch,
                summary.loss,
                summary.accuracy * 100.0,
            );
        }
        history.push(summary);
    }

    tracing::info!("Training complete after {} epochs", cfg.num_epochs);
    Ok(history)
}

/// Greedy-decode the first sequence of a logits batch back into
/// notation text via the vocabulary.
fn decode_preview<B: Backend>(logits: Tensor<B, 3>, vocab: &Vocabulary) -> Result<String> {
    let [_, timesteps, _] = logits.dims();
    let ids = logits
        .argmax(2)
        .slice([0..1, 0..timesteps, 0..1])
        .reshape([timesteps]);
    let ids: Vec<i64> = ids
        .into_data()
        .to_vec()
        .map_err(|e| anyhow::anyhow!("cannot read preview ids: {e:?}"))?;
    let ids: Vec<usize> = ids.into_iter().map(|id| id as usize).collect();
    Ok(vocab.decode_ids(&ids)?)
}
