pub mod recorder;
pub mod scenario;

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::ScenarioConfig;
use crate::driver::appium::AppiumClient;
use crate::runner::recorder::{ScenarioRun, StepRecorder, StepStatus};
use crate::runner::scenario::LoginScenario;

/// Run the login scenario once and return the recorded run.
///
/// Scenario failures are recorded, not raised: the returned run carries the
/// outcome and the caller decides how to present it. Only an unusable
/// output directory bubbles up as an error, because without it nothing can
/// be recorded at all.
pub async fn run_scenario(config: &ScenarioConfig, output_dir: &Path) -> Result<ScenarioRun> {
    std::fs::create_dir_all(output_dir)?;
    let mut recorder = StepRecorder::new(&config.title, output_dir);

    let session = {
        let client = match AppiumClient::new(&config.server_url) {
            Ok(client) => client,
            Err(e) => return Ok(abort_setup(recorder, e.to_string())),
        };

        if let Err(e) = client.wait_ready(config.server_ready_timeout_ms).await {
            return Ok(abort_setup(recorder, e.to_string()));
        }

        match client.create_session(&config.capabilities()).await {
            Ok(session) => session,
            Err(e) => return Ok(abort_setup(recorder, e.to_string())),
        }
    };

    recorder.record("create automation session", StepStatus::Passed, None);
    println!("  {} create automation session", "✓".green());

    LoginScenario::new(config.clone())
        .run(&session, &mut recorder)
        .await;

    Ok(recorder.finish())
}

/// Session setup failed before any interaction; record it and seal the run.
fn abort_setup(mut recorder: StepRecorder, error: String) -> ScenarioRun {
    println!("  {} create automation session", "✗".red());
    recorder.record(
        "create automation session",
        StepStatus::Failed {
            error: error.clone(),
        },
        Some(error),
    );
    recorder.finish()
}
