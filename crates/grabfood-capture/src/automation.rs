//! Boundary to the browser automation layer.
//!
//! The capture pipeline never drives a browser itself. Anything that can
//! navigate, wait, click, type, scroll, report the page height and hand back
//! the network traffic it intercepted can be plugged in.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AutomationError;
use crate::types::InterceptedExchange;

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
    Id(String),
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css `{selector}`"),
            Locator::XPath(path) => write!(f, "xpath `{path}`"),
            Locator::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// Condition a collaborator waits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    Present(Locator),
    Clickable(Locator),
}

impl std::fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitCondition::Present(locator) => write!(f, "{locator} to be present"),
            WaitCondition::Clickable(locator) => write!(f, "{locator} to be clickable"),
        }
    }
}

#[async_trait]
pub trait BrowserAutomation: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), AutomationError>;

    /// Waits until `condition` holds. `Ok(false)` means the timeout elapsed.
    async fn wait_for(
        &mut self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<bool, AutomationError>;

    async fn click(&mut self, locator: &Locator) -> Result<(), AutomationError>;

    /// Replaces the element's current value with `text`.
    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), AutomationError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), AutomationError>;

    /// Current scrollable height of the document, in pixels.
    async fn page_height(&mut self) -> Result<u64, AutomationError>;

    /// Every exchange intercepted since navigation started, in arrival order.
    async fn intercepted_requests(&mut self) -> Result<Vec<InterceptedExchange>, AutomationError>;

    /// Releases the browser. Called once after capture, even on failure.
    async fn close(&mut self) -> Result<(), AutomationError> {
        Ok(())
    }
}
