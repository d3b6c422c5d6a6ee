use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use smoke_pilot::config::ScenarioConfig;
use smoke_pilot::{report, runner};

#[derive(Parser)]
#[command(name = "smoke-pilot")]
#[command(version = "0.1.0")]
#[command(about = "Android login smoke-test CLI driving an Appium automation server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the login scenario
    Run {
        /// Path to a scenario YAML file (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Automation server URL (overrides the config file)
        #[arg(short, long)]
        server: Option<String>,

        /// Output directory for screenshots, results and the report
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Skip per-step screenshot capture (failures are still captured)
        #[arg(long, default_value = "false")]
        no_screenshots: bool,
    },

    /// Generate report from saved results
    Report {
        /// Path to a results JSON
        results: PathBuf,

        /// Output format (json, html)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            server,
            output,
            no_screenshots,
        } => {
            let mut cfg = match config {
                Some(path) => ScenarioConfig::load(&path)?,
                None => ScenarioConfig::default(),
            };
            if let Some(url) = server {
                cfg.server_url = url;
            }
            if no_screenshots {
                cfg.capture_screenshots = false;
            }

            println!(
                "{} Running scenario: {}",
                "▶".green().bold(),
                cfg.title.white().bold()
            );
            println!("  Server: {}", cfg.server_url.cyan());
            println!("  App: {}", cfg.app_package.cyan());
            println!("  Output: {}", output.display().to_string().cyan());

            let run = runner::run_scenario(&cfg, &output).await?;

            if let Err(e) = report::write_results(&run, &output) {
                log::warn!("{e}");
            }
            match report::html::write_timestamped(&run, &output) {
                Ok(path) => println!("  Report: {}", path.display().to_string().cyan()),
                // An unwritable report never changes the scenario outcome.
                Err(e) => log::warn!("{e}"),
            }

            let summary = run.summary();
            if run.failed() {
                println!(
                    "\n{} Scenario failed: {} passed, {} failed",
                    "✗".red().bold(),
                    summary.passed.to_string().green(),
                    summary.failed.to_string().red()
                );
            } else {
                println!(
                    "\n{} Scenario passed: {} steps",
                    "✓".green().bold(),
                    summary.total_steps
                );
            }
            // Failures were caught and reported; the process still exits 0.
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "▶".blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref())?;
        }
    }

    Ok(())
}
