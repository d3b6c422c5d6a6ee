pub mod html;
pub mod json;

use anyhow::Result;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::runner::recorder::ScenarioRun;

/// File name of the serialized run inside the output directory
pub const RESULTS_FILE: &str = "results.json";

/// Report artifacts could not be persisted
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persist the serialized run so the report can be re-rendered later
pub fn write_results(run: &ScenarioRun, output_dir: &Path) -> Result<PathBuf, ReportError> {
    let path = output_dir.join(RESULTS_FILE);
    let body = serde_json::to_string_pretty(run).map_err(|e| ReportError::Write {
        path: path.clone(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    std::fs::write(&path, body).map_err(|source| ReportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Generate a report from a saved results file
pub fn generate_report(results_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let raw = std::fs::read_to_string(results_path)?;
    let run: ScenarioRun = serde_json::from_str(&raw)?;

    match format {
        "json" => json::generate(&run, output),
        "html" => html::generate(&run, output),
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::recorder::StepRecorder;

    #[test]
    fn results_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = StepRecorder::new("login", dir.path());
        recorder.record(
            "init",
            crate::runner::recorder::StepStatus::Passed,
            None,
        );
        let run = recorder.finish();

        let path = write_results(&run, dir.path()).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let restored: ScenarioRun = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored.run_id, run.run_id);
        assert_eq!(restored.steps.len(), 1);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = StepRecorder::new("login", dir.path());
        recorder.record(
            "init",
            crate::runner::recorder::StepStatus::Passed,
            None,
        );
        let path = write_results(&recorder.finish(), dir.path()).unwrap();

        let err = generate_report(&path, "pdf", None).unwrap_err();
        assert!(err.to_string().contains("Unknown format"));
    }
}
