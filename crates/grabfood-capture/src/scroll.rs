//! Scroll-until-stable readiness loop.
//!
//! The results list grows as the page is scrolled; the search responses we
//! want are only all intercepted once the page height stops changing. Pages
//! that keep injecting content never stabilise, so the loop is bounded by a
//! round count and a wall-clock budget.

use std::time::Duration;

use tokio::time::Instant;

use crate::automation::BrowserAutomation;
use crate::error::AutomationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPolicy {
    /// Pause after each scroll before the height is re-read.
    pub delay: Duration,
    /// Upper bound on scroll rounds. Values below 1 are treated as 1.
    pub max_rounds: u32,
    /// Wall-clock budget for the whole loop.
    pub max_elapsed: Duration,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
            max_rounds: 50,
            max_elapsed: Duration::from_secs(180),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveUpReason {
    MaxRounds,
    Deadline,
}

impl std::fmt::Display for GiveUpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GiveUpReason::MaxRounds => write!(f, "round limit reached"),
            GiveUpReason::Deadline => write!(f, "time budget exhausted"),
        }
    }
}

/// Terminal state of [`scroll_until_stable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Two consecutive height readings matched.
    Stable { rounds: u32, height: u64 },
    /// The page was still growing when the budget ran out.
    GaveUp {
        rounds: u32,
        last_height: u64,
        reason: GiveUpReason,
    },
}

impl ScrollOutcome {
    #[must_use]
    pub fn is_stable(&self) -> bool {
        matches!(self, ScrollOutcome::Stable { .. })
    }

    #[must_use]
    pub fn rounds(&self) -> u32 {
        match *self {
            ScrollOutcome::Stable { rounds, .. } | ScrollOutcome::GaveUp { rounds, .. } => rounds,
        }
    }
}

/// Scrolls to the bottom, waits `policy.delay`, and compares page heights
/// until two consecutive readings are equal or the policy budget runs out.
///
/// # Errors
///
/// Propagates any [`AutomationError`] from the collaborator.
pub async fn scroll_until_stable<B>(
    browser: &mut B,
    policy: &ScrollPolicy,
) -> Result<ScrollOutcome, AutomationError>
where
    B: BrowserAutomation + ?Sized,
{
    let started = Instant::now();
    let max_rounds = policy.max_rounds.max(1);
    let mut last_height = browser.page_height().await?;

    for round in 1..=max_rounds {
        browser.scroll_to_bottom().await?;
        tokio::time::sleep(policy.delay).await;
        let height = browser.page_height().await?;

        tracing::debug!(round, last_height, height, "scrolled results page");

        if height == last_height {
            return Ok(ScrollOutcome::Stable {
                rounds: round,
                height,
            });
        }
        last_height = height;

        if started.elapsed() >= policy.max_elapsed {
            return Ok(ScrollOutcome::GaveUp {
                rounds: round,
                last_height,
                reason: GiveUpReason::Deadline,
            });
        }
    }

    Ok(ScrollOutcome::GaveUp {
        rounds: max_rounds,
        last_height,
        reason: GiveUpReason::MaxRounds,
    })
}
