use super::ReportError;
use crate::runner::recorder::{ScenarioRun, StepStatus};
use anyhow::Result;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Render the report into the output directory, named by generation
/// timestamp so successive runs never overwrite each other.
pub fn write_timestamped(run: &ScenarioRun, output_dir: &Path) -> Result<PathBuf, ReportError> {
    let name = format!("report_{}.html", Local::now().format("%Y%m%d_%H%M%S"));
    let path = output_dir.join(name);
    std::fs::write(&path, render(run)).map_err(|source| ReportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Generate an HTML report to a file, or stdout when no path is given
pub fn generate(run: &ScenarioRun, output: Option<&Path>) -> Result<()> {
    let html = render(run);

    if let Some(path) = output {
        std::fs::write(path, html).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        println!("HTML report saved to: {}", path.display());
    } else {
        println!("{}", html);
    }

    Ok(())
}

/// Render the run as one self-contained document. Deterministic for a given
/// run except for the embedded generation timestamp.
pub fn render(run: &ScenarioRun) -> String {
    let summary = run.summary();
    let pass_rate = if summary.total_steps > 0 {
        (summary.passed as f64 / summary.total_steps as f64 * 100.0) as u32
    } else {
        0
    };

    let mut steps_html = String::new();
    for step in &run.steps {
        let (status_icon, status_class) = match &step.status {
            StepStatus::Passed => ("✓", "passed"),
            StepStatus::Failed { .. } => ("✗", "failed"),
            StepStatus::Info => ("ℹ", "info"),
        };

        let screenshot_html = if let Some(path) = &step.screenshot_path {
            format!(
                r##"<a href="#" class="screenshot-link" onclick="showScreenshot('{}')">📸 View Screenshot</a>"##,
                path
            )
        } else {
            String::new()
        };

        let error_html = match &step.status {
            StepStatus::Failed { error } => format!(
                r##"<div class="error-message">{}</div>"##,
                html_escape(error)
            ),
            _ => String::new(),
        };

        let detail_html = step
            .error_detail
            .as_ref()
            .map(|d| format!(r##"<pre class="detail">{}</pre>"##, html_escape(d)))
            .unwrap_or_default();

        steps_html.push_str(&format!(
            r##"
            <div class="step {status_class}">
                <div class="step-icon">{status_icon}</div>
                <div class="step-content">
                    <div class="step-name"><span class="seq">#{}</span> {}</div>
                    <div class="step-meta">{screenshot_html}</div>
                    {error_html}
                    {detail_html}
                </div>
            </div>
        "##,
            step.sequence_number,
            html_escape(&step.description),
            status_class = status_class,
            status_icon = status_icon,
            screenshot_html = screenshot_html,
            error_html = error_html,
            detail_html = detail_html
        ));
    }

    let verdict = if run.failed() {
        r#"<span class="verdict failed">FAILED</span>"#
    } else {
        r#"<span class="verdict passed">PASSED</span>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Smoke Test Report - {}</title>
    <style>
        :root {{
            --bg-primary: #0a0f1d;
            --bg-secondary: #141b2d;
            --bg-tertiary: #1f2937;
            --border: #374151;
            --text-primary: #f9fafb;
            --text-secondary: #9ca3af;
            --green: #10b981;
            --red: #ef4444;
            --blue: #3b82f6;
        }}

        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}

        body {{
            font-family: system-ui, -apple-system, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.5;
            padding: 3rem 1rem;
        }}

        .container {{
            max-width: 900px;
            margin: 0 auto;
        }}

        header {{
            margin-bottom: 2.5rem;
            display: flex;
            justify-content: space-between;
            align-items: flex-end;
        }}

        h1 {{
            font-size: 1.875rem;
            font-weight: 800;
            letter-spacing: -0.025em;
        }}

        .verdict {{
            padding: 0.25rem 0.75rem;
            border-radius: 9999px;
            font-size: 0.875rem;
            font-weight: 700;
            text-transform: uppercase;
        }}

        .verdict.passed {{ background: rgba(16, 185, 129, 0.1); color: var(--green); }}
        .verdict.failed {{ background: rgba(239, 68, 68, 0.1); color: var(--red); }}

        .summary {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
            gap: 1.25rem;
            margin-bottom: 2.5rem;
        }}

        .stat {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            padding: 1.25rem;
            border-radius: 0.75rem;
        }}

        .stat-value {{
            font-size: 2rem;
            font-weight: 800;
        }}

        .stat-label {{
            color: var(--text-secondary);
            font-size: 0.8125rem;
            font-weight: 500;
            text-transform: uppercase;
            letter-spacing: 0.05em;
        }}

        .stat.passed .stat-value {{ color: var(--green); }}
        .stat.failed .stat-value {{ color: var(--red); }}

        .progress-bar {{
            background: var(--bg-secondary);
            height: 10px;
            border-radius: 5px;
            overflow: hidden;
            border: 1px solid var(--border);
            margin-bottom: 2.5rem;
        }}

        .progress-fill {{
            height: 100%;
            background: var(--green);
            width: {pass_rate}%;
        }}

        .steps {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 1rem;
            padding: 1rem 1.25rem;
        }}

        .step {{
            padding: 0.875rem;
            border-radius: 0.625rem;
            display: flex;
            align-items: flex-start;
            gap: 1rem;
            margin-bottom: 0.5rem;
        }}

        .step:hover {{
            background: var(--bg-tertiary);
        }}

        .step-icon {{
            width: 1.75rem;
            height: 1.75rem;
            display: flex;
            align-items: center;
            justify-content: center;
            border-radius: 0.5rem;
            font-size: 1rem;
            flex-shrink: 0;
        }}

        .step.passed .step-icon {{ background: rgba(16, 185, 129, 0.1); color: var(--green); }}
        .step.failed .step-icon {{ background: rgba(239, 68, 68, 0.1); color: var(--red); }}
        .step.info .step-icon {{ background: rgba(59, 130, 246, 0.1); color: var(--blue); }}

        .step-content {{
            flex: 1;
        }}

        .step-name {{
            font-size: 0.9375rem;
            font-weight: 500;
        }}

        .seq {{
            color: var(--text-secondary);
            font-weight: 400;
        }}

        .screenshot-link {{
            color: var(--blue);
            font-size: 0.75rem;
            font-weight: 600;
            text-decoration: none;
        }}

        .screenshot-link:hover {{
            text-decoration: underline;
        }}

        .error-message {{
            background: rgba(239, 68, 68, 0.1);
            border-radius: 0.5rem;
            padding: 0.625rem;
            margin-top: 0.625rem;
            color: #fca5a5;
            font-size: 0.8125rem;
            font-family: monospace;
            border: 1px solid rgba(239, 68, 68, 0.2);
        }}

        .detail {{
            margin-top: 0.5rem;
            padding: 0.625rem;
            background: rgba(0, 0, 0, 0.25);
            border-radius: 0.5rem;
            color: var(--text-secondary);
            font-size: 0.75rem;
            white-space: pre-wrap;
            word-break: break-all;
        }}

        .meta {{
            margin-top: 3rem;
            padding-top: 1.5rem;
            border-top: 1px solid var(--border);
            color: var(--text-secondary);
            font-size: 0.8125rem;
            text-align: center;
            display: flex;
            justify-content: center;
            gap: 2rem;
        }}

        #modal {{
            display: none;
            position: fixed;
            z-index: 100;
            top: 0;
            left: 0;
            width: 100%;
            height: 100%;
            background: rgba(0, 0, 0, 0.9);
            padding: 2rem;
            align-items: center;
            justify-content: center;
        }}

        #modal img {{
            max-width: 100%;
            max-height: 100%;
            border-radius: 0.5rem;
        }}

        #modal.active {{
            display: flex;
        }}
    </style>
</head>
<body>
    <div class="container">
        <header>
            <div>
                <div style="font-size: 0.8125rem; font-weight: 600; color: var(--blue); text-transform: uppercase; letter-spacing: 0.1em; margin-bottom: 0.5rem;">Smoke Test</div>
                <h1>{}</h1>
            </div>
            {verdict}
        </header>

        <div class="summary">
            <div class="stat">
                <div class="stat-value">{}</div>
                <div class="stat-label">Total Steps</div>
            </div>
            <div class="stat passed">
                <div class="stat-value">{}</div>
                <div class="stat-label">Passed</div>
            </div>
            <div class="stat failed">
                <div class="stat-value">{}</div>
                <div class="stat-label">Failed</div>
            </div>
            <div class="stat">
                <div class="stat-value">{}</div>
                <div class="stat-label">Duration</div>
            </div>
        </div>

        <div class="progress-bar">
            <div class="progress-fill"></div>
        </div>

        <div class="steps">
            {steps_html}
        </div>

        <div class="meta">
            <span>Run: {}</span>
            <span>Started: {}</span>
            <span>Generated: {}</span>
        </div>
    </div>

    <div id="modal" onclick="this.classList.remove('active')">
        <img id="modal-img" src="" alt="Screenshot">
    </div>

    <script>
        function showScreenshot(path) {{
            const modal = document.getElementById('modal');
            const img = document.getElementById('modal-img');
            img.src = path;
            modal.classList.add('active');
            event.stopPropagation();
            return false;
        }}
    </script>
</body>
</html>"#,
        html_escape(&run.title),
        html_escape(&run.title),
        summary.total_steps,
        summary.passed,
        summary.failed,
        format_duration(summary.duration_ms.unwrap_or(0)),
        run.run_id,
        html_escape(&run.started_at),
        Local::now().to_rfc3339(),
        pass_rate = pass_rate,
        verdict = verdict,
        steps_html = steps_html
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60000;
        let seconds = (ms % 60000) as f64 / 1000.0;
        format!("{}m {:.0}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::recorder::Step;

    fn run_with(steps: Vec<Step>) -> ScenarioRun {
        ScenarioRun {
            run_id: "run-1".to_string(),
            title: "Login smoke test".to_string(),
            started_at: "2026-08-07T10:00:00+00:00".to_string(),
            duration_ms: Some(4200),
            steps,
        }
    }

    fn step(seq: u32, description: &str, status: StepStatus) -> Step {
        Step {
            sequence_number: seq,
            description: description.to_string(),
            status,
            screenshot_path: None,
            error_detail: None,
        }
    }

    #[test]
    fn report_marks_pass_and_fail_distinctly() {
        let run = run_with(vec![
            step(1, "init", StepStatus::Passed),
            step(
                2,
                "find field",
                StepStatus::Failed {
                    error: "timeout".to_string(),
                },
            ),
        ]);
        let html = render(&run);
        assert!(html.contains("init"));
        assert!(html.contains("find field"));
        assert!(html.contains("timeout"));
        assert!(html.contains(r#"class="step passed"#));
        assert!(html.contains(r#"class="step failed"#));
        assert!(html.contains("FAILED"));
    }

    #[test]
    fn error_text_is_escaped_verbatim() {
        let run = run_with(vec![step(
            1,
            "dump",
            StepStatus::Failed {
                error: r#"<hierarchy package="app">"#.to_string(),
            },
        )]);
        let html = render(&run);
        assert!(html.contains("&lt;hierarchy package=&quot;app&quot;&gt;"));
    }

    #[test]
    fn screenshots_are_referenced_by_relative_path() {
        let mut with_shot = step(1, "init", StepStatus::Passed);
        with_shot.screenshot_path = Some("screenshots/1_init.png".to_string());
        let html = render(&run_with(vec![with_shot]));
        assert!(html.contains("screenshots/1_init.png"));
    }

    #[test]
    fn passing_run_shows_the_passed_verdict() {
        let html = render(&run_with(vec![step(1, "init", StepStatus::Passed)]));
        assert!(html.contains("PASSED"));
    }

    #[test]
    fn unwritable_path_is_a_write_error() {
        let run = run_with(vec![step(1, "init", StepStatus::Passed)]);
        let err = write_timestamped(&run, Path::new("/nonexistent/output")).unwrap_err();
        assert!(matches!(err, ReportError::Write { .. }));
    }

    #[test]
    fn format_duration_scales_units() {
        assert_eq!(format_duration(950), "950ms");
        assert_eq!(format_duration(4200), "4.2s");
        assert_eq!(format_duration(75_000), "1m 15s");
    }
}
