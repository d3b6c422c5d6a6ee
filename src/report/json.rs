use anyhow::Result;
use std::path::Path;

use crate::runner::recorder::ScenarioRun;

/// Generate a JSON report (the run plus its derived summary)
pub fn generate(run: &ScenarioRun, output: Option<&Path>) -> Result<()> {
    let body = serde_json::json!({
        "run": run,
        "summary": run.summary(),
    });
    let text = serde_json::to_string_pretty(&body)?;

    if let Some(path) = output {
        std::fs::write(path, text)?;
        println!("JSON report saved to: {}", path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::recorder::{StepRecorder, StepStatus};

    #[test]
    fn json_report_carries_the_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = StepRecorder::new("login", dir.path());
        recorder.record("init", StepStatus::Passed, None);
        recorder.record(
            "find field",
            StepStatus::Failed {
                error: "timeout".to_string(),
            },
            None,
        );
        let run = recorder.finish();

        let out = dir.path().join("report.json");
        generate(&run, Some(&out)).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(parsed["summary"]["passed"], 1);
        assert_eq!(parsed["summary"]["failed"], 1);
        assert_eq!(parsed["run"]["steps"][0]["sequenceNumber"], 1);
    }
}
