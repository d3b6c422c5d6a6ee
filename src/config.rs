use crate::driver::capabilities::Capabilities;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scenario configuration, loadable from a YAML file.
///
/// Every field has a default so a bare `smoke-pilot run` works against a
/// local server; a config file only needs the fields it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioConfig {
    pub title: String,
    pub server_url: String,
    pub device_name: String,
    pub app_package: String,
    pub app_activity: String,
    pub credentials: Credentials,
    pub locators: Locators,
    /// How long to wait for the automation server's /status to report ready
    pub server_ready_timeout_ms: u64,
    /// Ceiling for the application-settled poll after session creation
    pub app_ready_timeout_ms: u64,
    /// Per-strategy wait inside a locator chain
    pub locator_wait_ms: u64,
    /// Ceiling for the post-login marker wait
    pub login_verify_timeout_ms: u64,
    /// Capture a screenshot after every step (failures are always captured)
    pub capture_screenshots: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Labels, fragments and fallback coordinates feeding the locator chains
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Locators {
    /// Dismiss control of the onboarding screen, when the build ships one
    pub onboarding_label: String,
    pub email_label: String,
    pub email_label_fragment: String,
    pub email_fallback: Point,
    pub password_label: String,
    pub password_label_fragment: String,
    pub password_fallback: Point,
    pub submit_label: String,
    pub submit_text: String,
    pub submit_label_fragment: String,
    pub submit_fallback: Point,
    /// Attribute probed for the mandatory post-login marker
    pub success_marker_attribute: String,
    pub success_marker_fragment: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            title: "Login smoke test".to_string(),
            server_url: crate::driver::appium::DEFAULT_SERVER_URL.to_string(),
            device_name: "Realme RMX3930".to_string(),
            app_package: "com.example.tractivity_app".to_string(),
            app_activity: "com.example.tractivity_app.MainActivity".to_string(),
            credentials: Credentials::default(),
            locators: Locators::default(),
            server_ready_timeout_ms: 30_000,
            app_ready_timeout_ms: 15_000,
            locator_wait_ms: 5_000,
            login_verify_timeout_ms: 10_000,
            capture_screenshots: true,
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: "bawop41170@cxnlab.com".to_string(),
            password: "12345678".to_string(),
        }
    }
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            onboarding_label: "Skip".to_string(),
            email_label: "Email".to_string(),
            email_label_fragment: "mail".to_string(),
            email_fallback: Point { x: 540, y: 760 },
            password_label: "Password".to_string(),
            password_label_fragment: "Pass".to_string(),
            password_fallback: Point { x: 540, y: 920 },
            submit_label: "Log in".to_string(),
            submit_text: "Log In".to_string(),
            submit_label_fragment: "Log".to_string(),
            submit_fallback: Point { x: 540, y: 1180 },
            success_marker_attribute: "content-desc".to_string(),
            success_marker_fragment: "success".to_string(),
        }
    }
}

impl ScenarioConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario config {}", path.display()))?;
        let config = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse scenario config {}", path.display()))?;
        Ok(config)
    }

    /// Capability set for the configured target
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::android(&self.device_name, &self.app_package, &self.app_activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let yaml = r#"
serverUrl: "http://10.0.0.5:4723"
credentials:
  email: "qa@example.com"
"#;
        let config: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server_url, "http://10.0.0.5:4723");
        assert_eq!(config.credentials.email, "qa@example.com");
        // Untouched fields keep their defaults.
        assert_eq!(config.app_package, "com.example.tractivity_app");
        assert_eq!(config.locators.submit_label, "Log in");
        assert!(config.capture_screenshots);
    }

    #[test]
    fn capabilities_reflect_the_target() {
        let config = ScenarioConfig::default();
        let caps = config.capabilities();
        assert_eq!(caps.app_package, config.app_package);
        assert_eq!(caps.app_activity, config.app_activity);
        assert_eq!(caps.platform_name, "Android");
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let err = ScenarioConfig::load(Path::new("/no/such/config.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read scenario config"));
    }
}
