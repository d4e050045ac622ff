//! Dialog kinds, state, and the borrowed dialog handle.
//!
//! A browser-native dialog (`alert`, `confirm`, `prompt`, or a beforeunload
//! confirmation) blocks page script until it is resolved. The bridge exposes
//! at most one open dialog per session; a second dialog queued behind it only
//! becomes reachable once the first is accepted or dismissed.
//!
//! [`Dialog`] is a borrowed handle over the driver's dialog operations. It
//! does not cache the dialog's text: every access goes to the remote end, so
//! a handle used after the dialog was resolved fails with
//! [`DriverError::NoDialogOpen`] rather than returning stale data.

use serde::{Deserialize, Serialize};

use crate::driver::{BrowserDriver, DriverError};

/// The kind of native dialog the page raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    /// `window.alert`: message and a single OK button.
    Alert,
    /// `window.confirm`: OK and Cancel.
    Confirm,
    /// `window.prompt`: text input with OK and Cancel.
    Prompt,
    /// A beforeunload confirmation raised during navigation.
    BeforeUnload,
}

impl std::fmt::Display for DialogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DialogKind::Alert => "alert",
            DialogKind::Confirm => "confirm",
            DialogKind::Prompt => "prompt",
            DialogKind::BeforeUnload => "beforeunload",
        };
        f.write_str(s)
    }
}

/// The bridge's answer to a dialog-presence query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    /// No dialog is open.
    Closed,
    /// A dialog is open and waiting to be resolved.
    Open {
        /// The dialog kind.
        kind: DialogKind,
        /// The dialog's message text.
        text: String,
    },
}

impl DialogState {
    /// Returns `true` if a dialog is open.
    pub fn is_open(&self) -> bool {
        matches!(self, DialogState::Open { .. })
    }
}

/// A borrowed handle to the currently open dialog.
///
/// Produced by [`wait::dialog`](crate::wait::dialog) once the presence
/// predicate reports an open dialog. The handle stays bound to "the open
/// dialog" rather than to a specific dialog instance: after
/// [`accept`](Self::accept) or [`dismiss`](Self::dismiss), any further call
/// through the same handle fails with [`DriverError::NoDialogOpen`].
pub struct Dialog<'d> {
    driver: &'d dyn BrowserDriver,
    kind: DialogKind,
}

impl std::fmt::Debug for Dialog<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialog")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<'d> Dialog<'d> {
    /// Create a handle for a dialog observed to be open with the given kind.
    pub fn new(driver: &'d dyn BrowserDriver, kind: DialogKind) -> Self {
        Self { driver, kind }
    }

    /// The dialog kind observed when this handle was produced.
    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    /// Read the dialog's message text from the remote end.
    ///
    /// Fails with [`DriverError::NoDialogOpen`] if the dialog has already
    /// been resolved.
    pub async fn text(&self) -> Result<String, DriverError> {
        match self.driver.dialog_state().await? {
            DialogState::Open { text, .. } => Ok(text),
            DialogState::Closed => Err(DriverError::NoDialogOpen),
        }
    }

    /// Accept the dialog (OK).
    pub async fn accept(&self) -> Result<(), DriverError> {
        self.driver.accept_dialog().await
    }

    /// Dismiss the dialog (Cancel).
    pub async fn dismiss(&self) -> Result<(), DriverError> {
        self.driver.dismiss_dialog().await
    }

    /// Type text into the dialog's input field.
    ///
    /// Only valid for prompts; the bridge rejects it for plain alerts with an
    /// invalid-dialog-state error.
    pub async fn send_keys(&self, text: &str) -> Result<(), DriverError> {
        self.driver.dialog_send_keys(text).await
    }
}
