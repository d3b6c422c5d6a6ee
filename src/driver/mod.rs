pub mod appium;
pub mod capabilities;
pub mod error;
pub mod locator;
pub mod traits;
pub mod wait;

pub use appium::{AppiumClient, AppiumSession};
pub use capabilities::Capabilities;
pub use error::DriverError;
pub use locator::{Located, LocatorTarget, Strategy};
pub use traits::{ElementHandle, UiAutomation};
