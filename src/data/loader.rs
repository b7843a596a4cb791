// ============================================================
// Layer 4 — Tune Loader
// ============================================================
// Reads pre-tokenised tunes from disk. Tokenisation itself
// happens upstream of this program; by the time data reaches
// the loader every tune is already an array of vocabulary ids.
//
// File format: a JSON array of arrays of integer ids, e.g.
//   [[12, 4, 4, 9, 3], [12, 7, 2, 3]]

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::traits::TuneSource;

pub struct JsonTuneLoader {
    path: PathBuf,
}

impl JsonTuneLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TuneSource for JsonTuneLoader {
    fn load_all(&self) -> Result<Vec<Vec<usize>>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read tune data '{}'", self.path.display()))?;

        let tunes: Vec<Vec<usize>> = serde_json::from_str(&raw)
            .with_context(|| format!("cannot parse tune data '{}'", self.path.display()))?;

        tracing::info!("Loaded {} tunes from '{}'", tunes.len(), self.path.display());
        Ok(tunes)
    }
}
