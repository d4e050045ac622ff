//! Action types and logging for browser automation operations.
//!
//! This module defines the various actions that can be performed against a
//! browser bridge, along with the [`ActionLog`] type for recording executed
//! actions.
//!
//! # Action Types
//!
//! Actions fall into several categories:
//!
//! - **Page interaction**: [`ActionType::Navigate`], [`ActionType::Click`], [`ActionType::GetText`]
//! - **Frame focus**: [`ActionType::SwitchFrame`], [`ActionType::SwitchDefault`]
//! - **Dialogs**: [`ActionType::DialogText`], [`ActionType::AcceptDialog`], [`ActionType::DismissDialog`], [`ActionType::DialogKeys`]
//! - **Waiting**: [`ActionType::WaitDialog`], [`ActionType::WaitTitle`]
//! - **Page reads**: [`ActionType::GetTitle`], [`ActionType::GetUrl`], [`ActionType::BrowserInfo`]
//! - **Scripting**: [`ActionType::ExecScript`]
//! - **Logging**: [`ActionType::LogComment`]
//!
//! # Example
//!
//! ```
//! use klaxon_core::action::{ActionType, ActionResult, ActionLog};
//! use klaxon_core::element::Locator;
//!
//! let action = ActionType::Click {
//!     locator: Locator::Id("alert".to_string()),
//! };
//!
//! let log = ActionLog::new(action, ActionResult::Success, None);
//! println!("Action {} at {}", log.id, log.timestamp);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::Locator;

/// The result of executing an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionResult {
    /// The action completed successfully.
    Success,

    /// The action failed with the given error message.
    Failure(String),
}

/// Types of actions that can be performed against a browser bridge.
///
/// Actions are serialized as JSON with a `type` tag discriminator for
/// session log persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionType {
    /// Load a URL in the top-level browsing context.
    Navigate {
        /// The URL to load.
        url: String,
    },

    /// Click an element.
    Click {
        /// How to locate the element.
        locator: Locator,
    },

    /// Read an element's visible text.
    GetText {
        /// How to locate the element.
        locator: Locator,
    },

    /// Switch the browsing context into a frame element.
    SwitchFrame {
        /// How to locate the frame element.
        locator: Locator,
    },

    /// Switch the browsing context back to the top-level document.
    SwitchDefault,

    /// Read the open dialog's message text.
    DialogText,

    /// Accept the open dialog (OK).
    AcceptDialog,

    /// Dismiss the open dialog (Cancel).
    DismissDialog,

    /// Type text into the open prompt.
    DialogKeys {
        /// The text to type.
        text: String,
    },

    /// Wait for a dialog to open.
    WaitDialog {
        /// Maximum time to wait in milliseconds.
        timeout_ms: u64,
    },

    /// Wait for the page title to equal a value.
    WaitTitle {
        /// The expected title.
        title: String,
        /// Maximum time to wait in milliseconds.
        timeout_ms: u64,
    },

    /// Read the page title.
    GetTitle,

    /// Read the current URL.
    GetUrl,

    /// Evaluate a JavaScript snippet in the page.
    ExecScript {
        /// The script source.
        script: String,
    },

    /// Read browser name and version.
    BrowserInfo,

    /// Log a comment (for documentation purposes).
    LogComment {
        /// The comment text to log.
        message: String,
    },
}

impl ActionType {
    /// Returns a short, static name for this action type suitable for use in
    /// tracing span metadata. Avoids Debug-formatting large enum payloads.
    pub fn name(&self) -> &'static str {
        match self {
            ActionType::Navigate { .. } => "navigate",
            ActionType::Click { .. } => "click",
            ActionType::GetText { .. } => "get_text",
            ActionType::SwitchFrame { .. } => "switch_frame",
            ActionType::SwitchDefault => "switch_default",
            ActionType::DialogText => "dialog_text",
            ActionType::AcceptDialog => "accept_dialog",
            ActionType::DismissDialog => "dismiss_dialog",
            ActionType::DialogKeys { .. } => "dialog_keys",
            ActionType::WaitDialog { .. } => "wait_dialog",
            ActionType::WaitTitle { .. } => "wait_title",
            ActionType::GetTitle => "get_title",
            ActionType::GetUrl => "get_url",
            ActionType::ExecScript { .. } => "exec_script",
            ActionType::BrowserInfo => "browser_info",
            ActionType::LogComment { .. } => "log_comment",
        }
    }
}

/// A logged action with metadata.
///
/// Each action executed through the executor is logged with a unique
/// identifier, timestamp, the action details, and the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    /// Unique identifier for this log entry.
    pub id: Uuid,

    /// When the action was executed.
    pub timestamp: DateTime<Utc>,

    /// The action that was performed.
    pub action: ActionType,

    /// The result of the action.
    pub result: ActionResult,

    /// How long the action took in milliseconds (e.g., for `WaitDialog`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Free-form label attached by the caller (used by the log converter to
    /// emit comments).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl ActionLog {
    /// Creates a new action log entry.
    ///
    /// The entry is assigned a new UUID and timestamped with the current time.
    pub fn new(action: ActionType, result: ActionResult, duration_ms: Option<u64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            result,
            duration_ms,
            tag: None,
        }
    }
}
