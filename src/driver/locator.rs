//! Resilient element location.
//!
//! UI automation against an app you do not control is unreliable:
//! accessibility attributes vary by build and animations delay readiness. A
//! locator target therefore carries an ordered list of strategies, cheapest
//! and most precise first, and resolution walks the list until one works.

use crate::driver::error::DriverError;
use crate::driver::traits::{ElementHandle, UiAutomation};
use std::fmt;
use std::time::{Duration, Instant};

/// Hold time for the coordinate fallback tap
const TAP_DURATION_MS: u64 = 100;

/// One way of locating a UI element
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Exact attribute match. `content-desc` resolves through the
    /// protocol's accessibility-id lookup, any other attribute through an
    /// XPath predicate.
    AttributeIs { name: String, value: String },
    /// Literal visible-text match
    TextIs(String),
    /// Partial attribute match
    AttributeContains { name: String, substring: String },
    /// Blind tap at fixed screen coordinates. No element resolution; the
    /// tap lands whether or not the target is actually there, so this
    /// belongs at the end of a chain.
    Coordinates { x: i32, y: i32 },
}

impl Strategy {
    /// Protocol `(using, value)` pair for element strategies; `None` for
    /// the coordinate tap.
    fn to_protocol(&self) -> Option<(&'static str, String)> {
        match self {
            Strategy::AttributeIs { name, value } if name == "content-desc" => {
                Some(("accessibility id", value.clone()))
            }
            Strategy::AttributeIs { name, value } => {
                Some(("xpath", format!("//*[@{name}=\"{value}\"]")))
            }
            Strategy::TextIs(text) => Some(("xpath", format!("//*[@text=\"{text}\"]"))),
            Strategy::AttributeContains { name, substring } => {
                Some(("xpath", format!("//*[contains(@{name}, \"{substring}\")]")))
            }
            Strategy::Coordinates { .. } => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::AttributeIs { name, value } => write!(f, "attribute {name}=\"{value}\""),
            Strategy::TextIs(text) => write!(f, "text \"{text}\""),
            Strategy::AttributeContains { name, substring } => {
                write!(f, "attribute {name} contains \"{substring}\"")
            }
            Strategy::Coordinates { x, y } => write!(f, "tap at ({x}, {y})"),
        }
    }
}

/// A semantic UI target and the ordered strategies that may resolve it
#[derive(Debug, Clone)]
pub struct LocatorTarget {
    pub description: String,
    pub strategies: Vec<Strategy>,
}

impl LocatorTarget {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            strategies: Vec::new(),
        }
    }

    pub fn attribute_is(mut self, name: &str, value: &str) -> Self {
        self.strategies.push(Strategy::AttributeIs {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn text_is(mut self, text: &str) -> Self {
        self.strategies.push(Strategy::TextIs(text.to_string()));
        self
    }

    pub fn attribute_contains(mut self, name: &str, substring: &str) -> Self {
        self.strategies.push(Strategy::AttributeContains {
            name: name.to_string(),
            substring: substring.to_string(),
        });
        self
    }

    pub fn coordinates(mut self, x: i32, y: i32) -> Self {
        self.strategies.push(Strategy::Coordinates { x, y });
        self
    }
}

/// Outcome of a successful chain resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Located {
    /// An element strategy matched; the handle is actionable
    Element {
        handle: ElementHandle,
        strategy: usize,
    },
    /// The coordinate fallback fired; the tap has already happened
    Tapped { strategy: usize },
}

impl Located {
    /// Index of the strategy that won, for diagnostics
    pub fn strategy_index(&self) -> usize {
        match self {
            Located::Element { strategy, .. } | Located::Tapped { strategy } => *strategy,
        }
    }
}

/// Try each strategy in order until one succeeds.
///
/// Element strategies poll the lookup with backoff for up to
/// `per_strategy_wait`; the coordinate strategy taps immediately. The first
/// success wins and later strategies are never attempted. Exhaustion fails
/// with `ElementNotFound` carrying every per-strategy reason in order.
/// Session loss aborts the chain immediately.
pub async fn resolve(
    session: &dyn UiAutomation,
    target: &LocatorTarget,
    per_strategy_wait: Duration,
) -> Result<Located, DriverError> {
    let mut attempts = Vec::with_capacity(target.strategies.len());

    for (index, strategy) in target.strategies.iter().enumerate() {
        log::debug!("locating '{}': trying {}", target.description, strategy);

        let outcome = match strategy {
            Strategy::Coordinates { x, y } => session
                .tap_at(*x, *y, TAP_DURATION_MS)
                .await
                .map(|()| Located::Tapped { strategy: index }),
            _ => {
                let (using, value) = strategy.to_protocol().unwrap_or(("xpath", String::new()));
                poll_find(session, using, &value, per_strategy_wait)
                    .await
                    .map(|handle| Located::Element {
                        handle,
                        strategy: index,
                    })
            }
        };

        match outcome {
            Ok(located) => {
                log::info!("located '{}' via {}", target.description, strategy);
                return Ok(located);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::debug!("strategy {} failed for '{}': {}", strategy, target.description, e);
                attempts.push(format!("[{strategy}] {e}"));
            }
        }
    }

    Err(DriverError::ElementNotFound {
        target: target.description.clone(),
        attempts,
    })
}

/// Poll a single lookup until it matches or the wait elapses
async fn poll_find(
    session: &dyn UiAutomation,
    using: &str,
    value: &str,
    wait: Duration,
) -> Result<ElementHandle, DriverError> {
    let start = Instant::now();
    let mut interval = 100u64;

    loop {
        match session.find_element(using, value).await {
            Ok(handle) => return Ok(handle),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                if start.elapsed() >= wait {
                    return Err(DriverError::NoSuchElement(format!(
                        "{e} (gave up after {}ms)",
                        wait.as_millis()
                    )));
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(interval)).await;
        interval = (interval * 3 / 2).min(500);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted session: `find_element` succeeds only for selector values
    /// present in `matches`, and every call is logged.
    struct ScriptedSession {
        matches: Vec<String>,
        session_lost: bool,
        find_calls: Mutex<Vec<String>>,
        tap_calls: Mutex<u32>,
    }

    impl ScriptedSession {
        fn new(matches: &[&str]) -> Self {
            Self {
                matches: matches.iter().map(|s| s.to_string()).collect(),
                session_lost: false,
                find_calls: Mutex::new(Vec::new()),
                tap_calls: Mutex::new(0),
            }
        }

        fn lost() -> Self {
            Self {
                session_lost: true,
                ..Self::new(&[])
            }
        }

        fn find_calls(&self) -> Vec<String> {
            self.find_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UiAutomation for ScriptedSession {
        async fn find_element(
            &self,
            _using: &str,
            value: &str,
        ) -> Result<ElementHandle, DriverError> {
            self.find_calls.lock().unwrap().push(value.to_string());
            if self.session_lost {
                return Err(DriverError::Session("connection dropped".to_string()));
            }
            if self.matches.iter().any(|m| value.contains(m.as_str())) {
                Ok(ElementHandle("el-1".to_string()))
            } else {
                Err(DriverError::NoSuchElement(format!("no match for {value}")))
            }
        }

        async fn click(&self, _: &ElementHandle) -> Result<(), DriverError> {
            Ok(())
        }
        async fn clear(&self, _: &ElementHandle) -> Result<(), DriverError> {
            Ok(())
        }
        async fn send_keys(&self, _: &ElementHandle, _: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn type_text(&self, _: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn tap_at(&self, _: i32, _: i32, _: u64) -> Result<(), DriverError> {
            *self.tap_calls.lock().unwrap() += 1;
            Ok(())
        }
        async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
            Ok(Vec::new())
        }
        async fn page_source(&self) -> Result<String, DriverError> {
            Ok(String::new())
        }
        async fn close(&self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    fn submit_target() -> LocatorTarget {
        LocatorTarget::new("submit button")
            .attribute_is("content-desc", "Log in")
            .text_is("Log In")
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let session = ScriptedSession::new(&["Log in"]);
        let located = resolve(&session, &submit_target(), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(located.strategy_index(), 0);
        // The text strategy was never attempted.
        assert_eq!(session.find_calls(), vec!["Log in"]);
    }

    #[tokio::test]
    async fn exhaustion_reports_every_attempt_in_order() {
        let session = ScriptedSession::new(&[]);
        let err = resolve(&session, &submit_target(), Duration::from_millis(10))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("submit button"));
        let first = message.find("attribute content-desc=\"Log in\"").unwrap();
        let second = message.find("text \"Log In\"").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn coordinate_fallback_taps_once() {
        let session = ScriptedSession::new(&[]);
        let chain = LocatorTarget::new("submit button")
            .text_is("Log In")
            .coordinates(540, 1180);
        let located = resolve(&session, &chain, Duration::from_millis(10))
            .await
            .unwrap();
        assert!(matches!(located, Located::Tapped { strategy: 1 }));
        assert_eq!(*session.tap_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn session_loss_aborts_the_chain() {
        let session = ScriptedSession::lost();
        let err = resolve(&session, &submit_target(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Session(_)));
        // The chain stopped at the first strategy.
        assert_eq!(session.find_calls().len(), 1);
    }

    #[test]
    fn content_desc_maps_to_accessibility_id() {
        let strategy = Strategy::AttributeIs {
            name: "content-desc".to_string(),
            value: "Log in".to_string(),
        };
        assert_eq!(
            strategy.to_protocol(),
            Some(("accessibility id", "Log in".to_string()))
        );
    }

    #[test]
    fn other_attributes_map_to_xpath() {
        let strategy = Strategy::AttributeContains {
            name: "content-desc".to_string(),
            substring: "success".to_string(),
        };
        let (using, value) = strategy.to_protocol().unwrap();
        assert_eq!(using, "xpath");
        assert_eq!(value, "//*[contains(@content-desc, \"success\")]");
    }
}
