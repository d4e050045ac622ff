//! Locators and element handles for page interaction.
//!
//! This module defines [`Locator`], the strategies used to find elements in
//! the page, [`ElementInfo`], the data the bridge returns for a found
//! element, and [`Element`], a borrowed handle for interacting with one.
//! These types are independent of any specific backend implementation.

use serde::{Deserialize, Serialize};

use crate::driver::{BrowserDriver, DriverError};

/// A strategy for locating a single element in the current browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "using", content = "value", rename_all = "kebab-case")]
pub enum Locator {
    /// Match by the element's `id` attribute.
    Id(String),
    /// Match by the element's `name` attribute.
    Name(String),
    /// Match by CSS selector.
    Css(String),
    /// Match by tag name.
    Tag(String),
}

impl Locator {
    /// Returns the strategy name as used in logs and CLI flags.
    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::Id(_) => "id",
            Locator::Name(_) => "name",
            Locator::Css(_) => "css",
            Locator::Tag(_) => "tag",
        }
    }

    /// Returns the selector value.
    pub fn value(&self) -> &str {
        match self {
            Locator::Id(v) | Locator::Name(v) | Locator::Css(v) | Locator::Tag(v) => v,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// Element data as reported by the bridge for a successful find.
///
/// The `element_id` is an opaque reference assigned by the bridge; it stays
/// valid until the document it belongs to is navigated away from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    /// Bridge-assigned opaque element reference.
    pub element_id: String,

    /// The element's tag name, lowercased.
    #[serde(default)]
    pub tag: Option<String>,

    /// The element's visible text at find time, if the bridge included it.
    #[serde(default)]
    pub text: Option<String>,
}

/// A borrowed handle to an element in the current browsing context.
///
/// Wraps an [`ElementInfo`] together with the driver that produced it so
/// interactions read naturally at the call site:
///
/// ```no_run
/// # use klaxon_core::driver::BrowserDriver;
/// # use klaxon_core::element::{Element, Locator};
/// # async fn example(driver: &dyn BrowserDriver) -> Result<(), Box<dyn std::error::Error>> {
/// let button = Element::find(driver, Locator::Id("alert".into())).await?;
/// button.click().await?;
/// # Ok(())
/// # }
/// ```
pub struct Element<'d> {
    driver: &'d dyn BrowserDriver,
    info: ElementInfo,
}

impl<'d> Element<'d> {
    /// Locate a single element and wrap it in a handle.
    pub async fn find(
        driver: &'d dyn BrowserDriver,
        locator: Locator,
    ) -> Result<Element<'d>, DriverError> {
        let info = driver.find_element(&locator).await?;
        Ok(Self { driver, info })
    }

    /// Wrap an already-found element.
    pub fn new(driver: &'d dyn BrowserDriver, info: ElementInfo) -> Self {
        Self { driver, info }
    }

    /// The bridge-assigned element reference.
    pub fn id(&self) -> &str {
        &self.info.element_id
    }

    /// The element's tag name, if known.
    pub fn tag(&self) -> Option<&str> {
        self.info.tag.as_deref()
    }

    /// Click the element.
    pub async fn click(&self) -> Result<(), DriverError> {
        self.driver.click(self.id()).await
    }

    /// Read the element's current visible text from the page.
    pub async fn text(&self) -> Result<String, DriverError> {
        self.driver.element_text(self.id()).await
    }

    /// Switch the browsing context into this element's frame.
    pub async fn enter_frame(&self) -> Result<(), DriverError> {
        self.driver.switch_to_frame(self.id()).await
    }
}
