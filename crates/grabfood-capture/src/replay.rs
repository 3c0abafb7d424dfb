//! Offline automation collaborator backed by a recorded session.
//!
//! A recording is a JSON document:
//!
//! ```json
//! {
//!   "pageHeights": [1200, 2400, 2400],
//!   "exchanges": [
//!     {
//!       "method": "POST",
//!       "url": "https://portal.grab.com/foodweb/v2/search",
//!       "status": 200,
//!       "headers": {"Content-Encoding": "gzip"},
//!       "bodyBase64": "H4sIAAAA..."
//!     }
//!   ]
//! }
//! ```
//!
//! `body` may be given instead of `bodyBase64` for plain-text responses.
//! Each scroll advances to the next page height; the last height repeats
//! once the list is exhausted.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::automation::{BrowserAutomation, Locator, WaitCondition};
use crate::error::{AutomationError, CaptureError};
use crate::types::InterceptedExchange;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecording {
    #[serde(default)]
    page_heights: Vec<u64>,
    #[serde(default)]
    exchanges: Vec<RecordedExchange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordedExchange {
    method: String,
    url: String,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    body_base64: Option<String>,
}

impl RecordedExchange {
    fn into_exchange(self, index: usize) -> Result<InterceptedExchange, CaptureError> {
        let response_body = match (self.body_base64, self.body) {
            (Some(encoded), _) => base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| CaptureError::InvalidRecording {
                    reason: format!("exchange {index}: bodyBase64 is not valid base64: {e}"),
                })?,
            (None, Some(text)) => text.into_bytes(),
            (None, None) => Vec::new(),
        };

        Ok(InterceptedExchange {
            method: self.method,
            url: self.url,
            status: self.status,
            response_headers: self.headers.into_iter().collect(),
            response_body,
        })
    }
}

/// Plays back a recorded session through [`BrowserAutomation`].
#[derive(Debug, Default)]
pub struct ReplayBrowser {
    heights: Vec<u64>,
    cursor: usize,
    exchanges: Vec<InterceptedExchange>,
    absent: HashSet<String>,
    journal: Vec<String>,
}

impl ReplayBrowser {
    #[must_use]
    pub fn new(heights: Vec<u64>, exchanges: Vec<InterceptedExchange>) -> Self {
        Self {
            heights,
            exchanges,
            ..Self::default()
        }
    }

    /// Parses a recording from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Json`] for malformed JSON and
    /// [`CaptureError::InvalidRecording`] for undecodable bodies.
    pub fn from_json(text: &str) -> Result<Self, CaptureError> {
        let recording: SessionRecording = serde_json::from_str(text)?;
        let exchanges = recording
            .exchanges
            .into_iter()
            .enumerate()
            .map(|(index, exchange)| exchange.into_exchange(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(recording.page_heights, exchanges))
    }

    /// Reads and parses a recording file.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Io`] if the file cannot be read, otherwise as
    /// [`ReplayBrowser::from_json`].
    pub fn from_path(path: &Path) -> Result<Self, CaptureError> {
        let text = std::fs::read_to_string(path).map_err(|e| CaptureError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Makes every wait on `locator` time out, as if the element never showed up.
    #[must_use]
    pub fn without_element(mut self, locator: &Locator) -> Self {
        self.absent.insert(locator.to_string());
        self
    }

    /// Actions performed so far, one line each.
    #[must_use]
    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    fn current_height(&self) -> u64 {
        match self.heights.len() {
            0 => 0,
            len => self.heights[self.cursor.min(len - 1)],
        }
    }
}

#[async_trait]
impl BrowserAutomation for ReplayBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), AutomationError> {
        self.journal.push(format!("navigate {url}"));
        Ok(())
    }

    async fn wait_for(
        &mut self,
        condition: &WaitCondition,
        _timeout: Duration,
    ) -> Result<bool, AutomationError> {
        let locator = match condition {
            WaitCondition::Present(locator) | WaitCondition::Clickable(locator) => locator,
        };
        let found = !self.absent.contains(&locator.to_string());
        self.journal.push(format!("wait {condition} -> {found}"));
        Ok(found)
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), AutomationError> {
        if self.absent.contains(&locator.to_string()) {
            return Err(AutomationError::new(format!("no element matches {locator}")));
        }
        self.journal.push(format!("click {locator}"));
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), AutomationError> {
        self.journal.push(format!("type {locator} {text:?}"));
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), AutomationError> {
        self.cursor += 1;
        self.journal.push("scroll".to_string());
        Ok(())
    }

    async fn page_height(&mut self) -> Result<u64, AutomationError> {
        Ok(self.current_height())
    }

    async fn intercepted_requests(&mut self) -> Result<Vec<InterceptedExchange>, AutomationError> {
        Ok(self.exchanges.clone())
    }

    async fn close(&mut self) -> Result<(), AutomationError> {
        self.journal.push("close".to_string());
        Ok(())
    }
}
