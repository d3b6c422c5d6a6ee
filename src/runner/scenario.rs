//! The login scenario.
//!
//! One linear pass: wait for the application, dismiss onboarding if present,
//! enter credentials, submit, verify. The session handle is passed in
//! explicitly and released exactly once on every exit path, including a
//! panic inside a step.

use crate::config::ScenarioConfig;
use crate::driver::locator::{self, Located, LocatorTarget};
use crate::driver::traits::{ElementHandle, UiAutomation};
use crate::driver::wait::{wait_until, PollConfig};
use crate::driver::DriverError;
use crate::runner::recorder::{StepRecorder, StepStatus};
use colored::Colorize;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

pub struct LoginScenario {
    config: ScenarioConfig,
}

impl LoginScenario {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    /// Execute the scenario against an open session.
    ///
    /// Teardown is unconditional: the session is closed after the step
    /// sequence finishes, fails, or panics, and before the outcome is
    /// folded into the recorder.
    pub async fn run(&self, session: &dyn UiAutomation, recorder: &mut StepRecorder) {
        let outcome = AssertUnwindSafe(self.drive(session, recorder))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            log::warn!("failed to close automation session: {e}");
        }

        match outcome {
            Ok(Ok(())) => {
                println!("  {} scenario completed", "✓".green().bold());
            }
            Ok(Err(failure)) => {
                println!("  {} scenario failed: {}", "✗".red().bold(), failure);
            }
            Err(panic) => {
                let detail = panic_message(panic);
                recorder.record(
                    "scenario aborted",
                    StepStatus::Failed {
                        error: detail.clone(),
                    },
                    Some(detail),
                );
                println!("  {} scenario aborted", "✗".red().bold());
            }
        }
    }

    /// The step sequence. Returns the fatal failure message, if any; the
    /// failure step itself has already been recorded by then.
    async fn drive(
        &self,
        session: &dyn UiAutomation,
        recorder: &mut StepRecorder,
    ) -> Result<(), String> {
        let cfg = &self.config;
        let wait = Duration::from_millis(cfg.locator_wait_ms);

        // The application is settled once its hierarchy shows up in the
        // page source; polling replaces the fixed startup sleep.
        let ready = wait_until(
            || async {
                match session.page_source().await {
                    Ok(source) => source.contains(cfg.app_package.as_str()),
                    Err(_) => false,
                }
            },
            PollConfig::with_timeout(cfg.app_ready_timeout_ms),
        )
        .await;

        if !ready {
            let error = format!(
                "application did not settle within {}ms",
                cfg.app_ready_timeout_ms
            );
            return Err(self
                .fatal(session, recorder, "wait for application", error)
                .await);
        }
        self.step_passed(session, recorder, "wait for application")
            .await;

        // Onboarding only exists on first launch; its absence is expected.
        match locator::resolve(session, &self.onboarding_target(), wait).await {
            Ok(Located::Element { handle, .. }) => {
                if let Err(e) = session.click(&handle).await {
                    return Err(self
                        .fatal(session, recorder, "dismiss onboarding", e.to_string())
                        .await);
                }
                self.step_passed(session, recorder, "dismiss onboarding")
                    .await;
            }
            Ok(Located::Tapped { .. }) => {
                self.step_passed(session, recorder, "dismiss onboarding")
                    .await;
            }
            Err(DriverError::ElementNotFound { .. }) => {
                recorder.record(
                    "dismiss onboarding",
                    StepStatus::Info,
                    Some("no onboarding screen present".to_string()),
                );
                println!("  {} dismiss onboarding (not present)", "ℹ".blue());
            }
            Err(e) => {
                return Err(self
                    .fatal(session, recorder, "dismiss onboarding", e.to_string())
                    .await);
            }
        }

        self.fill_field(
            session,
            recorder,
            "enter email",
            &self.email_target(),
            &cfg.credentials.email,
            wait,
        )
        .await?;

        self.fill_field(
            session,
            recorder,
            "enter password",
            &self.password_target(),
            &cfg.credentials.password,
            wait,
        )
        .await?;

        match locator::resolve(session, &self.submit_target(), wait).await {
            Ok(Located::Element { handle, .. }) => {
                if let Err(e) = session.click(&handle).await {
                    return Err(self
                        .fatal(session, recorder, "activate submit control", e.to_string())
                        .await);
                }
            }
            // The coordinate fallback has already tapped.
            Ok(Located::Tapped { .. }) => {}
            Err(e) => {
                return Err(self
                    .fatal(session, recorder, "activate submit control", e.to_string())
                    .await);
            }
        }
        self.step_passed(session, recorder, "activate submit control")
            .await;

        // The submit click alone proves nothing; the scenario passes only
        // once the post-login marker shows up.
        let verify_wait = Duration::from_millis(cfg.login_verify_timeout_ms);
        match locator::resolve(session, &self.success_target(), verify_wait).await {
            Ok(_) => {
                self.step_passed(session, recorder, "verify login succeeded")
                    .await;
                Ok(())
            }
            Err(e) => Err(self
                .fatal(session, recorder, "verify login succeeded", e.to_string())
                .await),
        }
    }

    /// Resolve a text field and enter a value into it.
    ///
    /// When the coordinate fallback fired, the tap is assumed to have
    /// focused the field and the text goes in through the focused-element
    /// path instead.
    async fn fill_field(
        &self,
        session: &dyn UiAutomation,
        recorder: &mut StepRecorder,
        step_name: &str,
        target: &LocatorTarget,
        text: &str,
        wait: Duration,
    ) -> Result<(), String> {
        match locator::resolve(session, target, wait).await {
            Ok(Located::Element { handle, .. }) => {
                if let Err(e) = enter_into(session, &handle, text).await {
                    return Err(self.fatal(session, recorder, step_name, e.to_string()).await);
                }
            }
            Ok(Located::Tapped { .. }) => {
                if let Err(e) = session.type_text(text).await {
                    return Err(self.fatal(session, recorder, step_name, e.to_string()).await);
                }
            }
            Err(e) => {
                return Err(self.fatal(session, recorder, step_name, e.to_string()).await);
            }
        }
        self.step_passed(session, recorder, step_name).await;
        Ok(())
    }

    /// Record a passed step, with screenshot evidence when the policy asks
    /// for it.
    async fn step_passed(
        &self,
        session: &dyn UiAutomation,
        recorder: &mut StepRecorder,
        step_name: &str,
    ) {
        if self.config.capture_screenshots {
            match session.screenshot().await {
                Ok(png) => {
                    recorder.record_with_screenshot(step_name, StepStatus::Passed, &png, None);
                }
                Err(e) => {
                    recorder.record(
                        step_name,
                        StepStatus::Passed,
                        Some(format!("screenshot unavailable: {e}")),
                    );
                }
            }
        } else {
            recorder.record(step_name, StepStatus::Passed, None);
        }
        println!("  {} {}", "✓".green(), step_name);
    }

    /// Record a fatal failure with a diagnostic dump of the currently
    /// visible elements, then hand the message back so the caller aborts.
    async fn fatal(
        &self,
        session: &dyn UiAutomation,
        recorder: &mut StepRecorder,
        step_name: &str,
        error: String,
    ) -> String {
        let dump = session
            .page_source()
            .await
            .unwrap_or_else(|e| format!("<page source unavailable: {e}>"));
        let detail = format!("{error}\nvisible elements:\n{dump}");

        match session.screenshot().await {
            Ok(png) => {
                recorder.record_with_screenshot(
                    step_name,
                    StepStatus::Failed {
                        error: error.clone(),
                    },
                    &png,
                    Some(detail),
                );
            }
            Err(_) => {
                recorder.record(
                    step_name,
                    StepStatus::Failed {
                        error: error.clone(),
                    },
                    Some(detail),
                );
            }
        }
        println!("  {} {}", "✗".red(), step_name);
        error
    }

    fn onboarding_target(&self) -> LocatorTarget {
        let l = &self.config.locators;
        // No coordinate fallback: absence must stay detectable.
        LocatorTarget::new("onboarding dismiss control")
            .attribute_is("content-desc", &l.onboarding_label)
            .text_is(&l.onboarding_label)
    }

    fn email_target(&self) -> LocatorTarget {
        let l = &self.config.locators;
        LocatorTarget::new("email field")
            .attribute_is("content-desc", &l.email_label)
            // The field may echo its prefilled value as visible text.
            .text_is(&self.config.credentials.email)
            .attribute_contains("content-desc", &l.email_label_fragment)
            .coordinates(l.email_fallback.x, l.email_fallback.y)
    }

    fn password_target(&self) -> LocatorTarget {
        let l = &self.config.locators;
        LocatorTarget::new("password field")
            .attribute_is("content-desc", &l.password_label)
            .text_is(&self.config.credentials.password)
            .attribute_contains("content-desc", &l.password_label_fragment)
            .coordinates(l.password_fallback.x, l.password_fallback.y)
    }

    fn submit_target(&self) -> LocatorTarget {
        let l = &self.config.locators;
        LocatorTarget::new("submit control")
            .attribute_is("content-desc", &l.submit_label)
            .text_is(&l.submit_text)
            .attribute_contains("content-desc", &l.submit_label_fragment)
            .coordinates(l.submit_fallback.x, l.submit_fallback.y)
    }

    fn success_target(&self) -> LocatorTarget {
        let l = &self.config.locators;
        // Presence probe only, so no coordinate fallback here either.
        LocatorTarget::new("post-login marker").attribute_contains(
            &l.success_marker_attribute,
            &l.success_marker_fragment,
        )
    }
}

async fn enter_into(
    session: &dyn UiAutomation,
    handle: &ElementHandle,
    text: &str,
) -> Result<(), DriverError> {
    session.click(handle).await?;
    session.clear(handle).await?;
    session.send_keys(handle, text).await
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic during step execution: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic during step execution: {s}")
    } else {
        "panic during step execution".to_string()
    }
}
