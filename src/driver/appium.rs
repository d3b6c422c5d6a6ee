//! Appium HTTP client
//!
//! Talks the W3C WebDriver protocol (plus Appium's vendor extensions) to a
//! device-automation server. The client owns no session; creating one yields
//! an `AppiumSession` bound to a single target application instance.

use crate::driver::capabilities::Capabilities;
use crate::driver::error::DriverError;
use crate::driver::traits::{ElementHandle, UiAutomation};
use crate::driver::wait::{wait_until, PollConfig};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Default Appium server endpoint
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4723/wd/hub";

/// W3C element key used in find-element responses
const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Client for a device-automation server, before any session exists.
pub struct AppiumClient {
    base_url: String,
    client: reqwest::Client,
}

/// Envelope every WebDriver response arrives in. Legacy servers put the
/// session id at the top level, W3C ones inside `value`.
#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

struct WireError {
    error: String,
    message: String,
}

impl AppiumClient {
    pub fn new(base_url: &str) -> Result<Self, DriverError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| DriverError::Session(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Check if the server is up and accepting sessions
    pub async fn is_ready(&self) -> bool {
        let url = format!("{}/status", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v["value"]["ready"].as_bool())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Poll `GET /status` until the server reports ready or the wait elapses
    pub async fn wait_ready(&self, timeout_ms: u64) -> Result<(), DriverError> {
        let ready = wait_until(
            || async { self.is_ready().await },
            PollConfig::with_timeout(timeout_ms),
        )
        .await;

        if ready {
            Ok(())
        } else {
            Err(DriverError::Session(format!(
                "automation server at {} not ready within {}ms",
                self.base_url, timeout_ms
            )))
        }
    }

    /// Create a session with the given capability set
    pub async fn create_session(self, caps: &Capabilities) -> Result<AppiumSession, DriverError> {
        let url = format!("{}/session", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&caps.to_w3c_payload())
            .send()
            .await
            .map_err(|e| DriverError::Session(format!("failed to reach automation server: {e}")))?;

        let body: WireResponse = resp
            .json()
            .await
            .map_err(|e| DriverError::Session(format!("malformed session response: {e}")))?;

        if let Some(err) = decode_wire_error(&body.value) {
            return Err(DriverError::Session(format!(
                "{}: {}",
                err.error, err.message
            )));
        }

        let session_id = body
            .session_id
            .or_else(|| body.value["sessionId"].as_str().map(str::to_string))
            .ok_or_else(|| DriverError::Session("no session id in response".to_string()))?;

        Ok(AppiumSession {
            base_url: self.base_url,
            client: self.client,
            session_id,
        })
    }
}

/// One live session against the automation server, bound to one target
/// application instance.
#[derive(Debug)]
pub struct AppiumSession {
    base_url: String,
    client: reqwest::Client,
    session_id: String,
}

impl AppiumSession {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, suffix)
    }

    async fn post(&self, suffix: &str, body: Value) -> Result<Value, DriverError> {
        let resp = self
            .client
            .post(self.url(suffix))
            .json(&body)
            .send()
            .await
            .map_err(|e| DriverError::Session(format!("request failed: {e}")))?;
        unwrap_value(resp).await
    }

    async fn get(&self, suffix: &str) -> Result<Value, DriverError> {
        let resp = self
            .client
            .get(self.url(suffix))
            .send()
            .await
            .map_err(|e| DriverError::Session(format!("request failed: {e}")))?;
        unwrap_value(resp).await
    }
}

/// Pull `value` out of a response envelope, classifying protocol errors.
async fn unwrap_value(resp: reqwest::Response) -> Result<Value, DriverError> {
    let status = resp.status();
    let body: WireResponse = resp
        .json()
        .await
        .map_err(|e| DriverError::Protocol(format!("malformed response: {e}")))?;

    if let Some(err) = decode_wire_error(&body.value) {
        return Err(classify(err));
    }
    if !status.is_success() {
        return Err(DriverError::Protocol(format!("HTTP {status}")));
    }
    Ok(body.value)
}

fn decode_wire_error(value: &Value) -> Option<WireError> {
    let error = value.get("error")?.as_str()?.to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(WireError { error, message })
}

fn classify(err: WireError) -> DriverError {
    match err.error.as_str() {
        "no such element" => DriverError::NoSuchElement(err.message),
        "invalid session id" | "session not created" => {
            DriverError::Session(format!("{}: {}", err.error, err.message))
        }
        _ => DriverError::Protocol(format!("{}: {}", err.error, err.message)),
    }
}

#[async_trait]
impl UiAutomation for AppiumSession {
    async fn find_element(&self, using: &str, value: &str) -> Result<ElementHandle, DriverError> {
        let resp = self
            .post("/element", json!({ "using": using, "value": value }))
            .await?;

        // Tolerate both the W3C element key and the legacy "ELEMENT" one.
        let id = resp[W3C_ELEMENT_KEY]
            .as_str()
            .or_else(|| resp["ELEMENT"].as_str())
            .ok_or_else(|| DriverError::Protocol(format!("no element id in response: {resp}")))?;

        Ok(ElementHandle(id.to_string()))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.post(&format!("/element/{}/click", element.0), json!({}))
            .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.post(&format!("/element/{}/clear", element.0), json!({}))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.post(
            &format!("/element/{}/value", element.0),
            json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        // The endpoint expects each character as a separate string.
        let chars: Vec<String> = text.chars().map(|c| c.to_string()).collect();
        self.post("/keys", json!({ "value": chars })).await?;
        Ok(())
    }

    async fn tap_at(&self, x: i32, y: i32, duration_ms: u64) -> Result<(), DriverError> {
        // W3C pointer action: move, press, hold, release.
        let actions = json!({
            "actions": [{
                "type": "pointer",
                "id": "finger1",
                "parameters": { "pointerType": "touch" },
                "actions": [
                    { "type": "pointerMove", "duration": 0, "x": x, "y": y },
                    { "type": "pointerDown", "button": 0 },
                    { "type": "pause", "duration": duration_ms },
                    { "type": "pointerUp", "button": 0 }
                ]
            }]
        });
        self.post("/actions", actions).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        use base64::Engine;
        let value = self.get("/screenshot").await?;
        let encoded = value.as_str().ok_or_else(|| {
            DriverError::Protocol("screenshot response is not a string".to_string())
        })?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| DriverError::Protocol(format!("failed to decode screenshot: {e}")))
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        let value = self.get("/source").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn close(&self) -> Result<(), DriverError> {
        let resp = self
            .client
            .delete(self.url(""))
            .send()
            .await
            .map_err(|e| DriverError::Session(format!("failed to close session: {e}")))?;
        unwrap_value(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn caps() -> Capabilities {
        Capabilities::android("emulator-5554", "com.example.app", ".MainActivity")
    }

    async fn open_session(server: &MockServer) -> AppiumSession {
        server
            .mock_async(|when, then| {
                when.method(POST).path("/session");
                then.status(200).json_body(json!({
                    "value": { "sessionId": "abc123", "capabilities": {} }
                }));
            })
            .await;

        AppiumClient::new(&server.base_url())
            .unwrap()
            .create_session(&caps())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_session_parses_w3c_session_id() {
        let server = MockServer::start_async().await;
        let session = open_session(&server).await;
        assert_eq!(session.session_id(), "abc123");
    }

    #[tokio::test]
    async fn create_session_parses_legacy_session_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/session");
                then.status(200).json_body(json!({
                    "sessionId": "legacy-1",
                    "value": {}
                }));
            })
            .await;

        let session = AppiumClient::new(&server.base_url())
            .unwrap()
            .create_session(&caps())
            .await
            .unwrap();
        assert_eq!(session.session_id(), "legacy-1");
    }

    #[tokio::test]
    async fn create_session_surfaces_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/session");
                then.status(500).json_body(json!({
                    "value": { "error": "session not created", "message": "no device online" }
                }));
            })
            .await;

        let err = AppiumClient::new(&server.base_url())
            .unwrap()
            .create_session(&caps())
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Session(_)));
        assert!(err.to_string().contains("no device online"));
    }

    #[tokio::test]
    async fn find_element_maps_no_such_element() {
        let server = MockServer::start_async().await;
        let session = open_session(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/session/abc123/element");
                then.status(404).json_body(json!({
                    "value": { "error": "no such element", "message": "nothing matched" }
                }));
            })
            .await;

        let err = session
            .find_element("accessibility id", "Log in")
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::NoSuchElement(_)));
    }

    #[tokio::test]
    async fn find_element_accepts_w3c_element_key() {
        let server = MockServer::start_async().await;
        let session = open_session(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/session/abc123/element");
                then.status(200).json_body(json!({
                    "value": { "element-6066-11e4-a52e-4f735466cecf": "el-42" }
                }));
            })
            .await;

        let handle = session
            .find_element("accessibility id", "Log in")
            .await
            .unwrap();
        assert_eq!(handle, ElementHandle("el-42".to_string()));
    }

    #[tokio::test]
    async fn screenshot_decodes_base64() {
        let server = MockServer::start_async().await;
        let session = open_session(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/session/abc123/screenshot");
                then.status(200).json_body(json!({ "value": "aGVsbG8=" }));
            })
            .await;

        let bytes = session.screenshot().await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn close_deletes_the_session() {
        let server = MockServer::start_async().await;
        let session = open_session(&server).await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/session/abc123");
                then.status(200).json_body(json!({ "value": null }));
            })
            .await;

        session.close().await.unwrap();
        delete.assert_async().await;
    }
}
