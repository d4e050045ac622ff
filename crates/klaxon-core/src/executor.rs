//! Action execution for browser automation.
//!
//! This module provides the [`ActionExecutor`] type, which handles the actual
//! execution of automation actions against a browser bridge. It abstracts the
//! execution logic from the CLI, making it reusable.
//!
//! # Example
//!
//! ```no_run
//! use klaxon_core::executor::ActionExecutor;
//! use klaxon_core::action::ActionType;
//!
//! #[tokio::main]
//! async fn main() {
//!     let executor = ActionExecutor::with_bridge("localhost", 4444);
//!
//!     let result = executor.execute(ActionType::Navigate {
//!         url: "http://localhost:8000/alerts".to_string(),
//!     }).await;
//!
//!     if result.success {
//!         println!("Navigated!");
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info_span, Instrument};

use crate::action::ActionType;
use crate::dialog::DialogState;
use crate::driver::BrowserDriver;
use crate::element::Locator;
use crate::wait;

/// Result of executing an action.
///
/// Contains success/failure status along with optional data returned by the
/// action (dialog text, element text, browser info, etc.).
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether the action completed successfully.
    pub success: bool,
    /// Human-readable description of the result.
    pub message: String,
    /// Additional data returned by the action (element text, dialog text,
    /// JSON for browser info, etc.).
    pub data: Option<String>,
}

impl ExecutionResult {
    /// Creates a successful result with a message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a failure result with an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Adds data to the result.
    pub fn with_data(mut self, data: String) -> Self {
        self.data = Some(data);
        self
    }
}

/// Executes automation actions against a browser bridge.
///
/// The executor holds a [`BrowserDriver`] and provides methods to execute
/// various [`ActionType`]s. It handles all the high-level action dispatch,
/// delegating low-level operations to the driver.
pub struct ActionExecutor {
    /// The automation driver backend.
    driver: Arc<dyn BrowserDriver>,
}

impl ActionExecutor {
    /// Creates a new executor with any [`BrowserDriver`] backend.
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self { driver }
    }

    /// Convenience constructor: create an executor using the
    /// [`BridgeDriver`](crate::bridge::BridgeDriver) backend.
    ///
    /// The driver is **not** connected yet. Use
    /// [`with_bridge_connected`](Self::with_bridge_connected) to connect
    /// immediately.
    pub fn with_bridge(host: impl Into<String>, port: u16) -> Self {
        Self::new(Arc::new(crate::bridge::BridgeDriver::direct(host, port)))
    }

    /// Like [`with_bridge`](Self::with_bridge) but connects immediately.
    pub async fn with_bridge_connected(
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self, crate::driver::DriverError> {
        let mut driver = crate::bridge::BridgeDriver::direct(host, port);
        driver.connect().await?;
        Ok(Self::new(Arc::new(driver)))
    }

    /// Returns a reference to the underlying driver.
    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Executes an action and returns the result.
    pub async fn execute(&self, action: ActionType) -> ExecutionResult {
        let action_name = action.name();
        let span = info_span!("execute_action", action = action_name);
        async {
            let start = Instant::now();
            let result = self.execute_inner(action).await;
            let elapsed = start.elapsed();
            debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                success = result.success,
                "action complete"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Resolve a locator to an element id, formatting failures uniformly.
    async fn resolve(&self, locator: &Locator) -> Result<String, ExecutionResult> {
        match self.driver.find_element(locator).await {
            Ok(info) => Ok(info.element_id),
            Err(e) => Err(ExecutionResult::failure(e.to_string())),
        }
    }

    async fn execute_inner(&self, action: ActionType) -> ExecutionResult {
        match action {
            ActionType::Navigate { ref url } => match self.driver.navigate(url).await {
                Ok(_) => ExecutionResult::success(format!("Navigated to '{}'", url)),
                Err(e) => ExecutionResult::failure(e.to_string()),
            },

            ActionType::Click { ref locator } => {
                let element_id = match self.resolve(locator).await {
                    Ok(id) => id,
                    Err(failure) => return failure,
                };
                match self.driver.click(&element_id).await {
                    Ok(_) => ExecutionResult::success(format!("Clicked {}", locator)),
                    Err(e) => ExecutionResult::failure(e.to_string()),
                }
            }

            ActionType::GetText { ref locator } => {
                let element_id = match self.resolve(locator).await {
                    Ok(id) => id,
                    Err(failure) => return failure,
                };
                match self.driver.element_text(&element_id).await {
                    Ok(text) => ExecutionResult::success(format!("Got text of {}", locator))
                        .with_data(text),
                    Err(e) => ExecutionResult::failure(e.to_string()),
                }
            }

            ActionType::SwitchFrame { ref locator } => {
                let element_id = match self.resolve(locator).await {
                    Ok(id) => id,
                    Err(failure) => return failure,
                };
                match self.driver.switch_to_frame(&element_id).await {
                    Ok(_) => ExecutionResult::success(format!("Switched into frame {}", locator)),
                    Err(e) => ExecutionResult::failure(e.to_string()),
                }
            }

            ActionType::SwitchDefault => {
                match self.driver.switch_to_default_content().await {
                    Ok(_) => ExecutionResult::success("Switched to top-level document"),
                    Err(e) => ExecutionResult::failure(e.to_string()),
                }
            }

            ActionType::DialogText => match self.driver.dialog_state().await {
                Ok(DialogState::Open { kind, text }) => {
                    ExecutionResult::success(format!("Dialog open ({kind})")).with_data(text)
                }
                Ok(DialogState::Closed) => ExecutionResult::failure("no dialog open"),
                Err(e) => ExecutionResult::failure(e.to_string()),
            },

            ActionType::AcceptDialog => match self.driver.accept_dialog().await {
                Ok(_) => ExecutionResult::success("Dialog accepted"),
                Err(e) => ExecutionResult::failure(e.to_string()),
            },

            ActionType::DismissDialog => match self.driver.dismiss_dialog().await {
                Ok(_) => ExecutionResult::success("Dialog dismissed"),
                Err(e) => ExecutionResult::failure(e.to_string()),
            },

            ActionType::DialogKeys { ref text } => {
                match self.driver.dialog_send_keys(text).await {
                    Ok(_) => ExecutionResult::success(format!("Typed '{}' into dialog", text)),
                    Err(e) => ExecutionResult::failure(e.to_string()),
                }
            }

            ActionType::WaitDialog { timeout_ms } => {
                let start = Instant::now();
                let timeout = Duration::from_millis(timeout_ms);

                match wait::dialog(self.driver.as_ref(), timeout).await {
                    Ok(dialog) => {
                        let elapsed_ms = start.elapsed().as_millis() as u64;
                        let text = match dialog.text().await {
                            Ok(text) => text,
                            Err(e) => return ExecutionResult::failure(e.to_string()),
                        };
                        ExecutionResult::success(format!(
                            "Dialog ({}) appeared after {}ms",
                            dialog.kind(),
                            elapsed_ms
                        ))
                        .with_data(text)
                    }
                    Err(e) => ExecutionResult::failure(e.to_string()),
                }
            }

            ActionType::WaitTitle {
                ref title,
                timeout_ms,
            } => {
                let timeout = Duration::from_millis(timeout_ms);
                match wait::until_title_is(self.driver.as_ref(), title, timeout).await {
                    Ok(_) => ExecutionResult::success(format!("Title is '{}'", title)),
                    Err(e) => ExecutionResult::failure(e.to_string()),
                }
            }

            ActionType::GetTitle => match self.driver.title().await {
                Ok(title) => ExecutionResult::success("Got title").with_data(title),
                Err(e) => ExecutionResult::failure(e.to_string()),
            },

            ActionType::GetUrl => match self.driver.current_url().await {
                Ok(url) => ExecutionResult::success("Got URL").with_data(url),
                Err(e) => ExecutionResult::failure(e.to_string()),
            },

            ActionType::ExecScript { ref script } => {
                match self.driver.execute_script(script).await {
                    Ok(Some(value)) => {
                        ExecutionResult::success("Script evaluated").with_data(value)
                    }
                    Ok(None) => ExecutionResult::success("Script evaluated")
                        .with_data("null".to_string()),
                    Err(e) => ExecutionResult::failure(e.to_string()),
                }
            }

            ActionType::BrowserInfo => match self.driver.browser_info().await {
                Ok(info) => match serde_json::to_string(&info) {
                    Ok(json) => ExecutionResult::success(format!(
                        "Connected to {}",
                        info.browser_name
                    ))
                    .with_data(json),
                    Err(e) => {
                        ExecutionResult::failure(format!("JSON serialization error: {}", e))
                    }
                },
                Err(e) => ExecutionResult::failure(e.to_string()),
            },

            ActionType::LogComment { ref message } => {
                ExecutionResult::success(format!("Logged: {}", message))
            }
        }
    }
}
