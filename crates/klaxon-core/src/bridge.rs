//! [`BrowserDriver`] implementation backed by a bridge connection.
//!
//! This module provides [`BridgeDriver`], which implements the
//! [`BrowserDriver`] trait by communicating with a browser bridge process
//! using the binary protocol defined in [`crate::protocol`].
//!
//! # Example
//!
//! ```no_run
//! use klaxon_core::bridge::BridgeDriver;
//! use klaxon_core::driver::BrowserDriver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut driver = BridgeDriver::direct("localhost", 4444);
//! driver.connect().await?;
//! driver.navigate("http://localhost:8000/alerts").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use tokio::sync::Mutex;

use tracing::{debug, instrument};

use crate::client::{BridgeClient, BridgeClientError};
use crate::dialog::DialogState;
use crate::driver::{BrowserDriver, BrowserInfo, DriverError};
use crate::element::{ElementInfo, Locator};
use crate::protocol::{ErrorCode, Request, Response};

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Maps a [`BridgeClientError`] to a [`DriverError`].
///
/// Coded bridge errors become the matching typed variant; the
/// unexpected-dialog code recovers the dialog text from the error detail.
fn map_client_error(err: BridgeClientError) -> DriverError {
    match err {
        BridgeClientError::NotConnected => DriverError::NotConnected,
        BridgeClientError::ConnectionFailed(msg) => DriverError::ConnectionLost(msg),
        BridgeClientError::Io(e) => DriverError::Io(e),
        BridgeClientError::Protocol(e) => DriverError::CommandFailed(e.to_string()),
        BridgeClientError::Timeout => DriverError::Timeout,
        BridgeClientError::BridgeError {
            code,
            message,
            detail,
        } => match code {
            ErrorCode::NoSuchElement => DriverError::NoSuchElement(message),
            ErrorCode::NoDialogOpen => DriverError::NoDialogOpen,
            ErrorCode::UnexpectedDialogOpen => DriverError::UnexpectedDialog {
                text: detail.unwrap_or(message),
            },
            ErrorCode::JavascriptError => DriverError::ScriptFailed(message),
            ErrorCode::InvalidDialogState => DriverError::InvalidDialogState(message),
            ErrorCode::Unknown => DriverError::CommandFailed(message),
        },
    }
}

/// Checks that the response is [`Response::Ok`] and returns a
/// [`DriverError::CommandFailed`] if it is not.
fn expect_ok(response: Response) -> Result<(), DriverError> {
    match response {
        Response::Ok => Ok(()),
        other => Err(DriverError::CommandFailed(format!(
            "unexpected response: {other:?}"
        ))),
    }
}

/// Extracts a [`Response::Text`] payload.
fn expect_text(response: Response) -> Result<String, DriverError> {
    match response {
        Response::Text { value } => Ok(value),
        other => Err(DriverError::CommandFailed(format!(
            "unexpected response: {other:?}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// BridgeDriver
// ---------------------------------------------------------------------------

/// A [`BrowserDriver`] backed by a connection to a browser bridge.
///
/// The driver holds the bridge endpoint and lazily creates a
/// [`BridgeClient`] when [`connect`](BrowserDriver::connect) is called.
/// New connections are verified with a heartbeat.
///
/// The client is wrapped in a [`tokio::sync::Mutex`] so that the `&self`
/// trait methods can acquire mutable access for sending requests.
pub struct BridgeDriver {
    host: String,
    port: u16,
    client: Mutex<Option<BridgeClient>>,
}

impl BridgeDriver {
    /// Creates a driver for a bridge reachable at `host:port`.
    ///
    /// No connection is established until [`connect`](BrowserDriver::connect)
    /// is called.
    pub fn direct(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client: Mutex::new(None),
        }
    }

    /// Returns the configured host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Creates a new [`BridgeClient`] for the configured endpoint and
    /// verifies it with a heartbeat.
    async fn create_client(&self) -> Result<BridgeClient, DriverError> {
        let host_port = format!("{}:{}", self.host, self.port);
        let addr = tokio::net::lookup_host(&host_port)
            .await
            .map_err(|e| DriverError::ConnectionLost(e.to_string()))?
            .next()
            .ok_or_else(|| {
                DriverError::ConnectionLost(format!("could not resolve {host_port}"))
            })?;

        let mut client = BridgeClient::new(addr);
        client.connect().await.map_err(map_client_error)?;
        client.heartbeat().await.map_err(map_client_error)?;
        Ok(client)
    }

    /// Sends a request via the inner [`BridgeClient`], mapping errors to
    /// [`DriverError`].
    async fn send(&self, request: &Request) -> Result<Response, DriverError> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(DriverError::NotConnected)?;
        client.send(request).await.map_err(map_client_error)
    }
}

#[async_trait]
impl BrowserDriver for BridgeDriver {
    #[instrument(skip(self), level = "debug")]
    async fn connect(&mut self) -> Result<(), DriverError> {
        let client = self.create_client().await?;
        *self.client.lock().await = Some(client);
        debug!(host = %self.host, port = self.port, "bridge driver connected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        // try_lock: is_connected is a sync trait method; a held lock means a
        // request is in flight, so the connection exists.
        match self.client.try_lock() {
            Ok(guard) => guard.as_ref().map(|c| c.is_connected()).unwrap_or(false),
            Err(_) => true,
        }
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        expect_ok(
            self.send(&Request::Navigate {
                url: url.to_string(),
            })
            .await?,
        )
    }

    async fn find_element(&self, locator: &Locator) -> Result<ElementInfo, DriverError> {
        match self
            .send(&Request::FindElement {
                locator: locator.clone(),
            })
            .await?
        {
            Response::Json { json } => {
                serde_json::from_str(&json).map_err(|e| DriverError::JsonParse(e.to_string()))
            }
            other => Err(DriverError::CommandFailed(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    async fn click(&self, element_id: &str) -> Result<(), DriverError> {
        expect_ok(
            self.send(&Request::Click {
                element_id: element_id.to_string(),
            })
            .await?,
        )
    }

    async fn element_text(&self, element_id: &str) -> Result<String, DriverError> {
        expect_text(
            self.send(&Request::ElementText {
                element_id: element_id.to_string(),
            })
            .await?,
        )
    }

    async fn switch_to_frame(&self, element_id: &str) -> Result<(), DriverError> {
        expect_ok(
            self.send(&Request::SwitchFrame {
                element_id: element_id.to_string(),
            })
            .await?,
        )
    }

    async fn switch_to_default_content(&self) -> Result<(), DriverError> {
        expect_ok(self.send(&Request::SwitchDefaultContent).await?)
    }

    async fn dialog_state(&self) -> Result<DialogState, DriverError> {
        match self.send(&Request::DialogState).await? {
            Response::Dialog {
                open: true,
                kind: Some(kind),
                text: Some(text),
            } => Ok(DialogState::Open { kind, text }),
            Response::Dialog { open: false, .. } => Ok(DialogState::Closed),
            other => Err(DriverError::CommandFailed(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    async fn accept_dialog(&self) -> Result<(), DriverError> {
        expect_ok(self.send(&Request::DialogAccept).await?)
    }

    async fn dismiss_dialog(&self) -> Result<(), DriverError> {
        expect_ok(self.send(&Request::DialogDismiss).await?)
    }

    async fn dialog_send_keys(&self, text: &str) -> Result<(), DriverError> {
        expect_ok(
            self.send(&Request::DialogSendKeys {
                text: text.to_string(),
            })
            .await?,
        )
    }

    async fn title(&self) -> Result<String, DriverError> {
        expect_text(self.send(&Request::PageTitle).await?)
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        expect_text(self.send(&Request::CurrentUrl).await?)
    }

    async fn execute_script(&self, script: &str) -> Result<Option<String>, DriverError> {
        match self
            .send(&Request::ExecuteScript {
                script: script.to_string(),
            })
            .await?
        {
            Response::Value { value } => Ok(value),
            other => Err(DriverError::CommandFailed(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    async fn browser_info(&self) -> Result<BrowserInfo, DriverError> {
        match self.send(&Request::BrowserInfo).await? {
            Response::Json { json } => {
                serde_json::from_str(&json).map_err(|e| DriverError::JsonParse(e.to_string()))
            }
            other => Err(DriverError::CommandFailed(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }
}
