//! Polling helpers for dialog presence and page conditions.
//!
//! The central contract here is [`dialog`]: repeatedly query the driver's
//! dialog-presence predicate until a dialog is open or a bounded timeout
//! elapses, and hand back a [`Dialog`] handle bound to it. The first check
//! happens immediately, before any sleep: a dialog raised from a timer
//! shortly after the triggering click must still be caught without the
//! caller sleeping first.
//!
//! The wait itself is side-effect free: it never resolves the dialog.
//!
//! # Example
//!
//! ```no_run
//! use klaxon_core::driver::BrowserDriver;
//! use klaxon_core::wait;
//!
//! # async fn example(driver: &dyn BrowserDriver) -> Result<(), Box<dyn std::error::Error>> {
//! let dialog = wait::dialog(driver, wait::DEFAULT_DIALOG_TIMEOUT).await?;
//! assert_eq!(dialog.text().await?, "cheese");
//! dialog.accept().await?;
//! # Ok(())
//! # }
//! ```

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::dialog::{Dialog, DialogState};
use crate::driver::{BrowserDriver, DriverError};
use crate::element::Locator;

/// How long [`dialog`] waits by default.
pub const DEFAULT_DIALOG_TIMEOUT: Duration = Duration::from_secs(3);

/// Interval between presence checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors returned by the wait helpers.
#[derive(Error, Debug)]
pub enum WaitError {
    /// No dialog appeared before the timeout elapsed.
    #[error("no dialog appeared within {waited_ms}ms")]
    DialogNotFound {
        /// Elapsed wait time in milliseconds.
        waited_ms: u64,
    },

    /// A page condition did not become true before the timeout elapsed.
    #[error("condition not met within {waited_ms}ms: {what}")]
    ConditionNotMet {
        /// Description of the condition being waited for.
        what: String,
        /// Elapsed wait time in milliseconds.
        waited_ms: u64,
    },

    /// The driver failed while polling.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Wait for a dialog to open, returning a handle bound to it.
///
/// Polls [`BrowserDriver::dialog_state`] every [`POLL_INTERVAL`] until the
/// predicate reports an open dialog or `timeout` elapses. The first check is
/// performed immediately. Driver failures during polling abort the wait.
///
/// On timeout, fails with [`WaitError::DialogNotFound`] carrying the elapsed
/// milliseconds; the caller's test fails with it.
pub async fn dialog(
    driver: &dyn BrowserDriver,
    timeout: Duration,
) -> Result<Dialog<'_>, WaitError> {
    let start = Instant::now();

    loop {
        if let DialogState::Open { kind, .. } = driver.dialog_state().await? {
            return Ok(Dialog::new(driver, kind));
        }

        if start.elapsed() >= timeout {
            return Err(WaitError::DialogNotFound {
                waited_ms: start.elapsed().as_millis() as u64,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Wait until the page title equals `expected`.
pub async fn until_title_is(
    driver: &dyn BrowserDriver,
    expected: &str,
    timeout: Duration,
) -> Result<(), WaitError> {
    let start = Instant::now();

    loop {
        if driver.title().await? == expected {
            return Ok(());
        }

        if start.elapsed() >= timeout {
            return Err(WaitError::ConditionNotMet {
                what: format!("title to be '{expected}'"),
                waited_ms: start.elapsed().as_millis() as u64,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Wait until the element matched by `locator` contains `needle` in its text.
///
/// An element that does not exist yet counts as the condition not being met;
/// the poll continues. Other driver failures abort the wait.
pub async fn until_text_present(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    needle: &str,
    timeout: Duration,
) -> Result<(), WaitError> {
    let start = Instant::now();

    loop {
        match probe_text(driver, locator).await {
            Ok(Some(text)) if text.contains(needle) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }

        if start.elapsed() >= timeout {
            return Err(WaitError::ConditionNotMet {
                what: format!("text '{needle}' in element {locator}"),
                waited_ms: start.elapsed().as_millis() as u64,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// One text probe: `Ok(None)` when the element is not there yet.
async fn probe_text(
    driver: &dyn BrowserDriver,
    locator: &Locator,
) -> Result<Option<String>, DriverError> {
    match driver.find_element(locator).await {
        Ok(info) => Ok(Some(driver.element_text(&info.element_id).await?)),
        Err(DriverError::NoSuchElement(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
