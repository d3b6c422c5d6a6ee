use crate::driver::error::DriverError;
use async_trait::async_trait;

/// Opaque handle to an element resolved by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(pub String);

/// Session-level operations the scenario needs from a device-automation
/// service.
///
/// The production implementation is the Appium session in
/// `driver::appium`; tests substitute in-memory mocks so chain ordering and
/// teardown discipline can be asserted without a device.
#[async_trait]
pub trait UiAutomation: Send + Sync {
    /// Look up a single element.
    ///
    /// # Arguments
    /// * `using` - Protocol locator strategy ("accessibility id", "xpath")
    /// * `value` - The selector for that strategy
    async fn find_element(&self, using: &str, value: &str) -> Result<ElementHandle, DriverError>;

    /// Click an element
    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    /// Clear an editable element
    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError>;

    /// Send text to an element
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    /// Type into whatever currently holds focus
    async fn type_text(&self, text: &str) -> Result<(), DriverError>;

    /// Tap at absolute screen coordinates, holding for `duration_ms`
    async fn tap_at(&self, x: i32, y: i32, duration_ms: u64) -> Result<(), DriverError>;

    /// Capture a screenshot as PNG bytes
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// Current UI hierarchy, for failure diagnostics
    async fn page_source(&self) -> Result<String, DriverError>;

    /// Tear the session down. Called exactly once per run.
    async fn close(&self) -> Result<(), DriverError>;
}
