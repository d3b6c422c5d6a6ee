use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// Subdirectory of the output directory holding step screenshots
pub const SCREENSHOT_DIR: &str = "screenshots";

/// Outcome of one recorded step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed { error: String },
    Info,
}

impl StepStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepStatus::Failed { .. })
    }
}

/// One recorded unit of scenario progress. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// 1-based, assigned in recording order
    pub sequence_number: u32,
    pub description: String,
    pub status: StepStatus,
    /// Screenshot path relative to the output directory
    pub screenshot_path: Option<String>,
    pub error_detail: Option<String>,
}

/// The full ordered record of one scenario execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRun {
    pub run_id: String,
    pub title: String,
    pub started_at: String,
    pub duration_ms: Option<u64>,
    pub steps: Vec<Step>,
}

impl ScenarioRun {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total_steps: self.steps.len() as u32,
            passed: 0,
            failed: 0,
            info: 0,
            duration_ms: self.duration_ms,
        };
        for step in &self.steps {
            match step.status {
                StepStatus::Passed => summary.passed += 1,
                StepStatus::Failed { .. } => summary.failed += 1,
                StepStatus::Info => summary.info += 1,
            }
        }
        summary
    }

    pub fn failed(&self) -> bool {
        self.steps.iter().any(|s| s.status.is_failure())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_steps: u32,
    pub passed: u32,
    pub failed: u32,
    pub info: u32,
    pub duration_ms: Option<u64>,
}

/// Accumulates the authoritative, time-ordered record of a scenario run and
/// persists screenshot evidence.
///
/// Recording never fails: a screenshot that cannot be persisted is dropped
/// from its step and the storage error folded into the step's
/// `error_detail` instead.
pub struct StepRecorder {
    run: ScenarioRun,
    output_dir: PathBuf,
    started: Instant,
}

impl StepRecorder {
    pub fn new(title: &str, output_dir: &Path) -> Self {
        Self {
            run: ScenarioRun {
                run_id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                started_at: Local::now().to_rfc3339(),
                duration_ms: None,
                steps: Vec::new(),
            },
            output_dir: output_dir.to_path_buf(),
            started: Instant::now(),
        }
    }

    /// Append a step with the next sequence number
    pub fn record(
        &mut self,
        description: &str,
        status: StepStatus,
        error_detail: Option<String>,
    ) -> &Step {
        self.push(description, status, None, error_detail)
    }

    /// Append a step with screenshot evidence.
    ///
    /// The bytes are persisted under the screenshots directory as
    /// `<seq>_<sanitized_description>.png`; the sequence-number prefix keeps
    /// the name unique even when descriptions repeat.
    pub fn record_with_screenshot(
        &mut self,
        description: &str,
        status: StepStatus,
        screenshot: &[u8],
        error_detail: Option<String>,
    ) -> &Step {
        let seq = self.next_sequence();
        let rel_path = format!("{}/{}_{}.png", SCREENSHOT_DIR, seq, sanitize(description));

        match self.persist_screenshot(&rel_path, screenshot) {
            Ok(()) => self.push(description, status, Some(rel_path), error_detail),
            Err(e) => {
                let storage_note = format!("screenshot not persisted: {e}");
                let detail = match error_detail {
                    Some(d) => format!("{d}\n{storage_note}"),
                    None => storage_note,
                };
                self.push(description, status, None, Some(detail))
            }
        }
    }

    /// Seal the run and hand it over for rendering
    pub fn finish(mut self) -> ScenarioRun {
        self.run.duration_ms = Some(self.started.elapsed().as_millis() as u64);
        self.run
    }

    pub fn run(&self) -> &ScenarioRun {
        &self.run
    }

    fn next_sequence(&self) -> u32 {
        self.run.steps.len() as u32 + 1
    }

    fn push(
        &mut self,
        description: &str,
        status: StepStatus,
        screenshot_path: Option<String>,
        error_detail: Option<String>,
    ) -> &Step {
        let step = Step {
            sequence_number: self.next_sequence(),
            description: description.to_string(),
            status,
            screenshot_path,
            error_detail,
        };
        self.run.steps.push(step);
        self.run.steps.last().expect("step just pushed")
    }

    fn persist_screenshot(&self, rel_path: &str, bytes: &[u8]) -> std::io::Result<()> {
        let path = self.output_dir.join(rel_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)
    }
}

/// Map a step description to a filesystem-safe fragment
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
