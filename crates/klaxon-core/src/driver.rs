//! Automation driver trait for backend-agnostic browser control.
//!
//! This module defines the [`BrowserDriver`] trait, which provides a common
//! interface for different automation backends (the TCP bridge in
//! [`bridge`](crate::bridge), or an in-process fake in tests). This allows
//! the executor, the wait helpers, and the handle types to work with any
//! backend without knowing the implementation details.
//!
//! All methods that talk to the browser are async and take `&self`;
//! implementations are expected to manage their own interior locking around
//! the underlying connection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialog::DialogState;
use crate::element::{ElementInfo, Locator};

/// Errors that can occur during driver operations.
///
/// This enum unifies errors from all backends behind a single type, allowing
/// consumers to handle failures uniformly regardless of the underlying
/// automation backend.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A command or operation failed with the given message.
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// The backend is not available or not connected.
    #[error("not connected to browser bridge")]
    NotConnected,

    /// The TCP connection to the bridge was lost.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data returned by the bridge.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// No element matched the locator.
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// A dialog operation was attempted but no dialog is open.
    #[error("no dialog open")]
    NoDialogOpen,

    /// A page operation was blocked by an open dialog.
    ///
    /// Carries the dialog's exact text for diagnostics.
    #[error("unexpected dialog open: {text}")]
    UnexpectedDialog {
        /// The open dialog's message text.
        text: String,
    },

    /// A script evaluation threw in the page.
    #[error("script error: {0}")]
    ScriptFailed(String),

    /// The operation is invalid for the current dialog kind
    /// (e.g. sending keys to a plain alert).
    #[error("invalid dialog state: {0}")]
    InvalidDialogState(String),
}

/// Browser identity as reported by the bridge.
///
/// Tests use the name to pre-declare known-broken browser/bridge
/// combinations as expected failures instead of retrying them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo {
    /// The browser name, lowercased (e.g. "chromium", "firefox").
    pub browser_name: String,

    /// The browser version string, if the bridge knows it.
    #[serde(default)]
    pub browser_version: Option<String>,
}

/// Trait for backend-agnostic browser automation.
///
/// Implementors provide navigation, element lookup, frame focus, and dialog
/// access using their specific backend. At most one dialog is open per
/// session at any time; the dialog operations act on that dialog and fail
/// with [`DriverError::NoDialogOpen`] when there is none.
///
/// # Required Methods
///
/// All methods are required; there is no meaningful default behavior for a
/// browser backend.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Establish connection to the automation backend.
    ///
    /// Verifies the backend is available.
    async fn connect(&mut self) -> Result<(), DriverError>;

    /// Check if the backend is ready to accept commands.
    fn is_connected(&self) -> bool;

    /// Load a URL in the current top-level browsing context.
    ///
    /// Fails with [`DriverError::UnexpectedDialog`] if a dialog is open.
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// Find a single element matching the locator in the current browsing
    /// context.
    async fn find_element(&self, locator: &Locator) -> Result<ElementInfo, DriverError>;

    /// Click an element by its bridge-assigned id.
    async fn click(&self, element_id: &str) -> Result<(), DriverError>;

    /// Read an element's current visible text.
    async fn element_text(&self, element_id: &str) -> Result<String, DriverError>;

    /// Switch the browsing context into a frame element.
    async fn switch_to_frame(&self, element_id: &str) -> Result<(), DriverError>;

    /// Switch the browsing context back to the top-level document.
    async fn switch_to_default_content(&self) -> Result<(), DriverError>;

    /// Query whether a dialog is currently open, and its kind and text.
    ///
    /// This is the presence predicate the wait helpers poll. It is
    /// side-effect free and never resolves the dialog.
    async fn dialog_state(&self) -> Result<DialogState, DriverError>;

    /// Accept the open dialog (OK).
    async fn accept_dialog(&self) -> Result<(), DriverError>;

    /// Dismiss the open dialog (Cancel).
    async fn dismiss_dialog(&self) -> Result<(), DriverError>;

    /// Type text into the open prompt's input field.
    async fn dialog_send_keys(&self, text: &str) -> Result<(), DriverError>;

    /// Read the page title.
    async fn title(&self) -> Result<String, DriverError>;

    /// Read the current URL.
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Evaluate a JavaScript snippet in the page.
    ///
    /// Returns the stringified result, or `None` for `null`/`undefined`.
    async fn execute_script(&self, script: &str) -> Result<Option<String>, DriverError>;

    /// Read browser name and version.
    async fn browser_info(&self) -> Result<BrowserInfo, DriverError>;
}
