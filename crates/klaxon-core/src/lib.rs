//! # klaxon-core
//!
//! Core library for browser dialog automation.
//!
//! This crate provides the foundational components for driving a browser
//! through a bridge process and handling native dialogs (alert, confirm,
//! prompt, beforeunload): a binary wire protocol, an async client, a
//! backend-agnostic driver trait, dialog/element handles, polling wait
//! helpers, an action execution layer, and session tracking.
//!
//! ## Modules
//!
//! - [`protocol`] - Binary wire protocol spoken between host and bridge
//! - [`client`] - Framed TCP client for the protocol
//! - [`driver`] - The [`BrowserDriver`](driver::BrowserDriver) trait and error type
//! - [`bridge`] - Bridge-backed driver implementation
//! - [`dialog`] - Dialog kinds, state, and the borrowed dialog handle
//! - [`element`] - Locators and element handles
//! - [`wait`] - Dialog-presence and page-condition polling
//! - [`action`] - Action types and logging for automation operations
//! - [`executor`] - Action execution engine with result handling
//! - [`session`] - Session state management with event broadcasting
//! - [`pages`] - Fixture page server for dialog tests
//!
//! ## Example
//!
//! ```no_run
//! use klaxon_core::bridge::BridgeDriver;
//! use klaxon_core::driver::BrowserDriver;
//! use klaxon_core::element::{Element, Locator};
//! use klaxon_core::wait;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut driver = BridgeDriver::direct("localhost", 4444);
//! driver.connect().await?;
//!
//! driver.navigate("http://localhost:8000/alerts.html").await?;
//! Element::find(&driver, Locator::Id("alert".into())).await?.click().await?;
//!
//! let dialog = wait::dialog(&driver, wait::DEFAULT_DIALOG_TIMEOUT).await?;
//! assert_eq!(dialog.text().await?, "cheese");
//! dialog.accept().await?;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod bridge;
pub mod client;
pub mod dialog;
pub mod driver;
pub mod element;
pub mod executor;
pub mod pages;
pub mod protocol;
pub mod session;
pub mod wait;
