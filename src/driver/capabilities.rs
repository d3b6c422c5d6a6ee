use serde::Serialize;

/// Capability set supplied when creating an automation session.
///
/// Mirrors the UiAutomator2 option set: platform and automation name, the
/// target application's package/activity pair, and the session-level flags
/// the server honors at startup. Vendor-specific fields carry the `appium:`
/// prefix required by the W3C capability rules.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    #[serde(rename = "platformName")]
    pub platform_name: String,
    #[serde(rename = "appium:automationName")]
    pub automation_name: String,
    #[serde(rename = "appium:deviceName")]
    pub device_name: String,
    #[serde(rename = "appium:appPackage")]
    pub app_package: String,
    #[serde(rename = "appium:appActivity")]
    pub app_activity: String,
    /// Wildcard so any post-launch activity satisfies the launch wait.
    #[serde(rename = "appium:appWaitActivity")]
    pub app_wait_activity: String,
    #[serde(rename = "appium:newCommandTimeout")]
    pub new_command_timeout: u64,
    #[serde(rename = "appium:connectHardwareKeyboard")]
    pub connect_hardware_keyboard: bool,
    #[serde(rename = "appium:autoGrantPermissions")]
    pub auto_grant_permissions: bool,
}

impl Capabilities {
    /// Capabilities for an Android target driven through UiAutomator2.
    pub fn android(device_name: &str, app_package: &str, app_activity: &str) -> Self {
        Self {
            platform_name: "Android".to_string(),
            automation_name: "UiAutomator2".to_string(),
            device_name: device_name.to_string(),
            app_package: app_package.to_string(),
            app_activity: app_activity.to_string(),
            app_wait_activity: "*".to_string(),
            new_command_timeout: 3600,
            connect_hardware_keyboard: true,
            auto_grant_permissions: true,
        }
    }

    /// W3C `POST /session` payload: the capability set as `alwaysMatch` plus
    /// an empty `firstMatch` entry.
    pub fn to_w3c_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "capabilities": {
                "alwaysMatch": self,
                "firstMatch": [{}],
            }
        })
    }
}
