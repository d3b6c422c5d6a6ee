use thiserror::Error;

/// Errors surfaced by the automation driver layer.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The automation session could not be created or was lost mid-run.
    /// Always fatal to the scenario.
    #[error("session error: {0}")]
    Session(String),

    /// A single element lookup came back empty. Consumed by the locator
    /// chain, which retries with the next strategy.
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// Every strategy in a locator chain was exhausted. Carries the
    /// per-strategy failure reasons in strategy order.
    #[error("element not found for '{target}': {}", .attempts.join("; "))]
    ElementNotFound {
        target: String,
        attempts: Vec<String>,
    },

    /// Any other error reported by the remote protocol.
    #[error("automation protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    /// Session loss cannot be recovered by trying another strategy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Session(_))
    }
}
