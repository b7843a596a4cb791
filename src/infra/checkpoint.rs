// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Durable snapshots of the training state and the full model
// artifact, under one persistence root:
//
//   <root>/tune_model/          ← full artifact for inference
//     config.json                 architecture + data dims
//     weights.mpk                 parameters
//   <root>/ckpt/                ← rotating training snapshots
//     model-<step>.mpk            model record
//     optim-<step>.mpk            optimizer record (Adam moments)
//     meta-<step>.json            { "step": N }
//     latest.json                 pointer to the newest snapshot
//
// Every file is written to a staging name and published with
// fs::rename, and the latest pointer is written only after the
// files it references are durable — a crash mid-save leaves the
// previous checkpoint fully usable.
//
// Model and optimizer records are saved together at the same
// step so a restore never pairs weights with stale Adam moments.
// Records use full precision; a save/restore round trip
// reproduces parameters bit for bit.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::error::TuneError;
use crate::ml::model::{DataDimensions, ModelSpec, TuneModel};

type SnapshotRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

const SNAPSHOT_EXT: &str = "mpk";
const ARTIFACT_DIR: &str = "tune_model";
const CKPT_DIR: &str = "ckpt";

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotMeta {
    step: usize,
}

/// What `save_artifact` persists next to the weights — enough to
/// rebuild the exact architecture before loading them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub model: ModelSpec,
    pub dims:  DataDimensions,
}

/// Result of `restore_latest`: either nothing was ever saved and
/// training starts fresh at step 0, or the newest snapshot was
/// loaded back.
pub enum Restore<M, O> {
    ColdStart { model: M, optim: O },
    Resumed { model: M, optim: O, step: usize },
}

pub struct CheckpointManager {
    ckpt_dir:     PathBuf,
    artifact_dir: PathBuf,
    max_to_keep:  usize,
}

impl CheckpointManager {
    /// Create a manager rooted at `root`, retaining at most
    /// `max_to_keep` snapshots. Creates the directories if needed.
    pub fn new(root: impl Into<PathBuf>, max_to_keep: usize) -> Self {
        let root = root.into();
        let ckpt_dir = root.join(CKPT_DIR);
        let artifact_dir = root.join(ARTIFACT_DIR);
        fs::create_dir_all(&ckpt_dir).ok();
        fs::create_dir_all(&artifact_dir).ok();
        Self { ckpt_dir, artifact_dir, max_to_keep }
    }

    // ── Training snapshots ───────────────────────────────────────────────────

    /// Snapshot {model, optimizer, step}. Returns the checkpoint
    /// id, which is the step itself. Older snapshots beyond
    /// `max_to_keep` are evicted after the save succeeds.
    pub fn save<B, O>(&self, model: &TuneModel<B>, optim: &O, step: usize) -> Result<usize>
    where
        B: AutodiffBackend,
        O: Optimizer<TuneModel<B>, B>,
    {
        let recorder = SnapshotRecorder::new();

        let staged = self.ckpt_dir.join("staging-model");
        recorder
            .record(model.clone().into_record(), staged.clone())
            .with_context(|| format!("failed to write model snapshot at step {step}"))?;
        publish(&staged, &self.snapshot_file("model", step))?;

        let staged = self.ckpt_dir.join("staging-optim");
        recorder
            .record(optim.to_record(), staged.clone())
            .with_context(|| format!("failed to write optimizer snapshot at step {step}"))?;
        publish(&staged, &self.snapshot_file("optim", step))?;

        write_json_atomic(
            &self.ckpt_dir.join(format!("meta-{step}.json")),
            &SnapshotMeta { step },
        )?;
        // the pointer goes last: everything it references is durable
        write_json_atomic(&self.ckpt_dir.join("latest.json"), &SnapshotMeta { step })?;

        self.evict_old()?;
        tracing::debug!("Saved checkpoint for step {}", step);
        Ok(step)
    }

    /// Load the newest snapshot into the given model/optimizer,
    /// or hand them back untouched for a cold start.
    pub fn restore_latest<B, O>(
        &self,
        model: TuneModel<B>,
        optim: O,
        device: &B::Device,
    ) -> Result<Restore<TuneModel<B>, O>>
    where
        B: AutodiffBackend,
        O: Optimizer<TuneModel<B>, B>,
    {
        let pointer = self.ckpt_dir.join("latest.json");
        if !pointer.exists() {
            return Ok(Restore::ColdStart { model, optim });
        }
        let meta: SnapshotMeta = read_json(&pointer)?;
        let step = meta.step;

        let recorder = SnapshotRecorder::new();
        let model_path = self.ckpt_dir.join(format!("model-{step}"));
        let record = recorder
            .load(model_path.clone(), device)
            .map_err(|e| TuneError::CheckpointCorrupt {
                path: model_path.display().to_string(),
                reason: e.to_string(),
            })?;
        let model = model.load_record(record);

        let optim_path = self.ckpt_dir.join(format!("optim-{step}"));
        let record = recorder
            .load(optim_path.clone(), device)
            .map_err(|e| TuneError::CheckpointCorrupt {
                path: optim_path.display().to_string(),
                reason: e.to_string(),
            })?;
        let optim = optim.load_record(record);

        Ok(Restore::Resumed { model, optim, step })
    }

    fn snapshot_file(&self, kind: &str, step: usize) -> PathBuf {
        self.ckpt_dir.join(format!("{kind}-{step}.{SNAPSHOT_EXT}"))
    }

    /// Delete snapshot triples past the retention bound, oldest
    /// step first.
    fn evict_old(&self) -> Result<()> {
        let mut steps = Vec::new();
        for entry in fs::read_dir(&self.ckpt_dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(step) = name
                .strip_prefix("meta-")
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<usize>().ok())
            {
                steps.push(step);
            }
        }
        steps.sort_unstable();

        while steps.len() > self.max_to_keep {
            let step = steps.remove(0);
            for file in [
                format!("model-{step}.{SNAPSHOT_EXT}"),
                format!("optim-{step}.{SNAPSHOT_EXT}"),
                format!("meta-{step}.json"),
            ] {
                let path = self.ckpt_dir.join(&file);
                if path.exists() {
                    fs::remove_file(&path)
                        .with_context(|| format!("failed to evict '{}'", path.display()))?;
                }
            }
            tracing::debug!("Evicted checkpoint for step {}", step);
        }
        Ok(())
    }

    // ── Full model artifact ──────────────────────────────────────────────────

    pub fn artifact_exists(&self) -> bool {
        self.artifact_dir.join("config.json").exists()
    }

    /// Persist the full artifact: architecture config + weights.
    /// Overwrites any previous artifact atomically.
    pub fn save_artifact<B: Backend>(
        &self,
        model: &TuneModel<B>,
        spec: &ModelSpec,
        dims: &DataDimensions,
    ) -> Result<()> {
        let recorder = SnapshotRecorder::new();
        let staged = self.artifact_dir.join("staging-weights");
        recorder
            .record(model.clone().into_record(), staged.clone())
            .with_context(|| "failed to write model artifact weights")?;
        publish(&staged, &self.artifact_dir.join(format!("weights.{SNAPSHOT_EXT}")))?;

        write_json_atomic(
            &self.artifact_dir.join("config.json"),
            &ArtifactConfig { model: spec.clone(), dims: dims.clone() },
        )?;
        tracing::debug!("Saved model artifact to '{}'", self.artifact_dir.display());
        Ok(())
    }

    /// Rebuild the model from the saved artifact. Fails with
    /// ModelNotInitialized when nothing was ever saved — the
    /// generator relies on this as its load-existing-only gate.
    pub fn load_artifact<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(TuneModel<B>, ArtifactConfig)> {
        let config_path = self.artifact_dir.join("config.json");
        if !config_path.exists() {
            return Err(TuneError::ModelNotInitialized {
                path: self.artifact_dir.display().to_string(),
            }
            .into());
        }
        let config: ArtifactConfig = read_json(&config_path)?;

        let model = config.model.init(&config.dims, device);
        let recorder = SnapshotRecorder::new();
        let weights_path = self.artifact_dir.join("weights");
        let record = recorder
            .load(weights_path.clone(), device)
            .map_err(|e| TuneError::CheckpointCorrupt {
                path: weights_path.display().to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!("Loaded model artifact from '{}'", self.artifact_dir.display());
        Ok((model.load_record(record), config))
    }
}

// ─── File helpers ─────────────────────────────────────────────────────────────

/// The recorder writes `<staged>.mpk`; move it onto its final
/// name in one rename.
fn publish(staged: &Path, target: &Path) -> Result<()> {
    let staged_file = staged.with_extension(SNAPSHOT_EXT);
    fs::rename(&staged_file, target).with_context(|| {
        format!("failed to publish '{}' as '{}'", staged_file.display(), target.display())
    })?;
    Ok(())
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("failed to write '{}'", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to publish '{}'", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| {
        TuneError::CheckpointCorrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::optim::{AdamConfig, GradientsParams};

    use crate::ml::cells::UnitType;
    use crate::ml::loss::masked_cross_entropy;
    use crate::ml::model::RnnSpec;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    fn tiny_spec() -> ModelSpec {
        ModelSpec {
            tune_embedding_size: 4,
            rnn: RnnSpec { unit_type: UnitType::Lstm, num_units: 6, num_layers: 1 },
        }
    }

    fn tiny_dims() -> DataDimensions {
        DataDimensions { max_timesteps: 4, tune_vocab_size: 5 }
    }

    fn fixed_batch(
        device: &<TestBackend as Backend>::Device,
    ) -> (Tensor<TestBackend, 2, Int>, Tensor<TestBackend, 2, Int>) {
        let inputs = Tensor::from_ints([[1, 2, 3, 0]], device);
        let targets = Tensor::from_ints([[2, 3, 4, 0]], device);
        (inputs, targets)
    }

    /// Run one real optimizer step so the Adam record is non-empty.
    fn trained_pair(
        device: &<TestBackend as Backend>::Device,
    ) -> (TuneModel<TestBackend>, impl Optimizer<TuneModel<TestBackend>, TestBackend>) {
        let model = tiny_spec().init::<TestBackend>(&tiny_dims(), device);
        let mut optim = AdamConfig::new().init();
        let (inputs, targets) = fixed_batch(device);

        let logits = model.forward(inputs);
        let loss = masked_cross_entropy(logits, targets).unwrap();
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        let model = optim.step(1e-2, model, grads);
        (model, optim)
    }

    fn logits_of(model: &TuneModel<TestBackend>, device: &<TestBackend as Backend>::Device) -> Vec<f32> {
        let (inputs, _) = fixed_batch(device);
        model
            .forward(inputs)
            .reshape([4 * 5])
            .into_data()
            .to_vec()
            .unwrap()
    }

    #[test]
    fn test_cold_start_when_nothing_saved() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path(), 3);
        let device = Default::default();

        let model = tiny_spec().init::<TestBackend>(&tiny_dims(), &device);
        let optim = AdamConfig::new().init();
        match manager.restore_latest(model, optim, &device).unwrap() {
            Restore::ColdStart { .. } => {}
            Restore::Resumed { .. } => panic!("expected cold start"),
        }
    }

    #[test]
    fn test_round_trip_restores_exact_state() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path(), 3);
        let device = Default::default();

        let (model, optim) = trained_pair(&device);
        let before = logits_of(&model, &device);
        assert_eq!(manager.save(&model, &optim, 7).unwrap(), 7);

        // restore into a freshly initialised model/optimizer
        let fresh = tiny_spec().init::<TestBackend>(&tiny_dims(), &device);
        let fresh_optim = AdamConfig::new().init();
        match manager.restore_latest(fresh, fresh_optim, &device).unwrap() {
            Restore::Resumed { model, step, .. } => {
                assert_eq!(step, 7);
                assert_eq!(logits_of(&model, &device), before);
            }
            Restore::ColdStart { .. } => panic!("expected resume"),
        }
    }

    #[test]
    fn test_retention_keeps_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path(), 3);
        let device = Default::default();
        let (model, optim) = trained_pair(&device);

        for step in 1..=5 {
            manager.save(&model, &optim, step).unwrap();
        }

        let metas: Vec<String> = fs::read_dir(dir.path().join(CKPT_DIR))
            .unwrap()
            .filter_map(|e| {
                let name = e.unwrap().file_name().to_string_lossy().into_owned();
                name.starts_with("meta-").then_some(name)
            })
            .collect();
        assert_eq!(metas.len(), 3);
        for step in 3..=5 {
            assert!(metas.contains(&format!("meta-{step}.json")));
        }
        assert!(!dir.path().join(CKPT_DIR).join("model-1.mpk").exists());

        let latest: SnapshotMeta =
            read_json(&dir.path().join(CKPT_DIR).join("latest.json")).unwrap();
        assert_eq!(latest.step, 5);
    }

    #[test]
    fn test_artifact_round_trip_and_gate() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path(), 3);
        let device = Default::default();

        // nothing saved yet → the load-existing-only gate trips
        let missing = manager.load_artifact::<TestBackend>(&device);
        let err = missing.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<TuneError>(),
            Some(TuneError::ModelNotInitialized { .. })
        ));
        assert!(!manager.artifact_exists());

        let (model, _) = trained_pair(&device);
        let before = logits_of(&model, &device);
        manager.save_artifact(&model, &tiny_spec(), &tiny_dims()).unwrap();
        assert!(manager.artifact_exists());

        let (restored, config) = manager.load_artifact::<TestBackend>(&device).unwrap();
        assert_eq!(config.dims.tune_vocab_size, 5);
        assert_eq!(logits_of(&restored, &device), before);
    }
}
