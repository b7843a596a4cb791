// ============================================================
// Layer 6 — Telemetry Sink
// ============================================================
// Append-only scalar metrics, one CSV file per training run.
// The run label is derived from the wall-clock start time, so
// successive runs against the same model directory never write
// into each other's file.
//
// Row format:  step,metric,value
//
// Each scalar is flushed as soon as it is written — a crashed
// run keeps every step it already reported.

use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::PathBuf,
};

pub struct TelemetrySink {
    csv_path:  PathBuf,
    file:      File,
    run_label: String,
}

impl TelemetrySink {
    /// Open a sink with a timestamp-derived run label.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let run_label = format!("run{}", Local::now().format("%Y%m%d-%H%M%S"));
        Self::with_label(dir, run_label)
    }

    /// Open a sink with an explicit run label. Tests use this to
    /// keep file names stable.
    pub fn with_label(dir: impl Into<PathBuf>, run_label: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let run_label = run_label.into();
        let csv_path = dir.join(format!("{run_label}.csv"));
        let fresh = !csv_path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&csv_path)
            .with_context(|| format!("cannot open telemetry file '{}'", csv_path.display()))?;
        if fresh {
            writeln!(file, "step,metric,value")?;
        }

        tracing::debug!("Telemetry run '{}' → '{}'", run_label, csv_path.display());
        Ok(Self { csv_path, file, run_label })
    }

    /// Append one scalar keyed by step and flush it.
    pub fn scalar(&mut self, metric: &str, value: f64, step: usize) -> Result<()> {
        writeln!(self.file, "{step},{metric},{value:.6}")?;
        self.file.flush()?;
        Ok(())
    }

    pub fn run_label(&self) -> &str {
        &self.run_label
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = TelemetrySink::with_label(dir.path(), "test-run").unwrap();

        sink.scalar("cross_entropy", 3.5, 1).unwrap();
        sink.scalar("cross_entropy", 2.25, 2).unwrap();

        let content = fs::read_to_string(sink.csv_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "step,metric,value");
        assert_eq!(lines[1], "1,cross_entropy,3.500000");
        assert_eq!(lines[2], "2,cross_entropy,2.250000");
    }

    #[test]
    fn test_reopening_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut sink = TelemetrySink::with_label(dir.path(), "resumed").unwrap();
            sink.scalar("cross_entropy", 1.0, 1).unwrap();
        }
        let mut sink = TelemetrySink::with_label(dir.path(), "resumed").unwrap();
        sink.scalar("cross_entropy", 0.5, 2).unwrap();

        let content = fs::read_to_string(sink.csv_path()).unwrap();
        assert_eq!(content.matches("step,metric,value").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }
}
