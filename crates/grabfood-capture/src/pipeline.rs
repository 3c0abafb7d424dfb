//! Capture session orchestration.
//!
//! Stages run strictly in order:
//! `Idle → LocationSubmitted → Scrolling → Captured → Deduplicated → Written → Done`.
//! The registry and aggregate statistics only leave the pipeline inside a
//! [`CaptureReport`], which callers get from [`CapturePipeline::run`] or by
//! joining the [`CaptureHandle`] returned from [`CapturePipeline::spawn`].

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use grabfood_core::AppConfig;
use tokio::task::JoinHandle;

use crate::automation::{BrowserAutomation, Locator, WaitCondition};
use crate::decode::ResponseDecoder;
use crate::dedup::{ingest, IngestSummary, MerchantRegistry};
use crate::error::{AutomationError, CaptureError};
use crate::output::{write_outputs, OutputSummary};
use crate::scroll::{scroll_until_stable, ScrollOutcome, ScrollPolicy};
use crate::stats::AggregateStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Idle,
    LocationSubmitted,
    Scrolling,
    Captured,
    Deduplicated,
    Written,
    Done,
}

impl std::fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CaptureStage::Idle => "idle",
            CaptureStage::LocationSubmitted => "location_submitted",
            CaptureStage::Scrolling => "scrolling",
            CaptureStage::Captured => "captured",
            CaptureStage::Deduplicated => "deduplicated",
            CaptureStage::Written => "written",
            CaptureStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Elements the pipeline interacts with on the listing site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelectors {
    pub cookie_accept: Locator,
    /// Marker that the app shell has rendered.
    pub layout_ready: Locator,
    pub location_input: Locator,
    pub submit_button: Locator,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            cookie_accept: Locator::XPath(r#"//button[contains(text(), "Accept")]"#.to_string()),
            layout_ready: Locator::Css(".ant-layout".to_string()),
            location_input: Locator::Id("location-input".to_string()),
            submit_button: Locator::Css(".ant-btn.submitBtn___2roqB.ant-btn-primary".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub json_gz: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub page_url: String,
    pub search_url: String,
    pub location: Option<String>,
    pub selectors: PageSelectors,
    pub cookie_timeout: Duration,
    pub ready_timeout: Duration,
    pub submit_timeout: Duration,
    /// Pause between focusing the location input and typing into it.
    pub input_settle: Duration,
    pub scroll: ScrollPolicy,
    /// Where to write results. `None` skips the `Written` stage.
    pub output: Option<OutputPaths>,
}

impl CaptureSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_url: config.page_url.clone(),
            search_url: config.search_url.clone(),
            location: config.location.clone(),
            selectors: PageSelectors::default(),
            cookie_timeout: Duration::from_secs(config.cookie_timeout_secs),
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
            submit_timeout: Duration::from_secs(config.submit_timeout_secs),
            input_settle: Duration::from_millis(config.input_settle_ms),
            scroll: ScrollPolicy {
                delay: Duration::from_millis(config.scroll_delay_ms),
                max_rounds: config.scroll_max_rounds,
                max_elapsed: Duration::from_secs(config.scroll_max_secs),
            },
            output: Some(OutputPaths {
                csv: config.output_csv.clone(),
                json_gz: config.output_json_gz.clone(),
            }),
        }
    }
}

/// Everything a finished capture session produced.
#[derive(Debug)]
pub struct CaptureReport {
    pub registry: MerchantRegistry,
    pub stats: AggregateStats,
    pub scroll: ScrollOutcome,
    pub exchanges_seen: usize,
    pub search_responses: usize,
    pub undecodable_responses: usize,
    pub ingest: IngestSummary,
    pub output: Option<OutputSummary>,
    /// Stages entered, in order.
    pub stages: Vec<CaptureStage>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Handle to a capture running on the tokio runtime.
///
/// Results are only reachable through [`CaptureHandle::join`].
#[must_use = "the capture report is only available after joining"]
#[derive(Debug)]
pub struct CaptureHandle {
    inner: JoinHandle<Result<CaptureReport, CaptureError>>,
}

impl CaptureHandle {
    /// Waits for the capture to finish.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's own error, or [`CaptureError::Join`] if the
    /// task panicked or was cancelled.
    pub async fn join(self) -> Result<CaptureReport, CaptureError> {
        self.inner.await?
    }
}

#[derive(Debug, Clone)]
pub struct CapturePipeline {
    settings: CaptureSettings,
    decoder: ResponseDecoder,
}

impl CapturePipeline {
    #[must_use]
    pub fn new(settings: CaptureSettings) -> Self {
        let decoder = ResponseDecoder::new(settings.search_url.clone());
        Self { settings, decoder }
    }

    #[must_use]
    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Runs a capture session to completion on the current task.
    ///
    /// The browser is closed afterwards whether or not the session succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::MissingLocation`] when no location is set,
    /// [`CaptureError::NotReady`] or [`CaptureError::Automation`] when a
    /// required page interaction fails, and [`CaptureError::EmptyResult`] or
    /// an I/O error from the write stage.
    pub async fn run<B>(&self, browser: &mut B) -> Result<CaptureReport, CaptureError>
    where
        B: BrowserAutomation + ?Sized,
    {
        let result = self.drive(browser).await;
        if let Err(error) = browser.close().await {
            tracing::warn!(%error, "failed to close browser after capture");
        }
        result
    }

    /// Runs the capture on a spawned task.
    pub fn spawn<B>(self, mut browser: B) -> CaptureHandle
    where
        B: BrowserAutomation + 'static,
    {
        let inner = tokio::spawn(async move { self.run(&mut browser).await });
        CaptureHandle { inner }
    }

    async fn drive<B>(&self, browser: &mut B) -> Result<CaptureReport, CaptureError>
    where
        B: BrowserAutomation + ?Sized,
    {
        let started_at = Utc::now();
        let settings = &self.settings;
        let location = settings
            .location
            .as_deref()
            .ok_or(CaptureError::MissingLocation)?;
        let mut stages = StageLog::new();

        browser
            .navigate(&settings.page_url)
            .await
            .map_err(automation(CaptureStage::Idle))?;
        self.accept_cookies(browser).await;
        self.require(
            browser,
            WaitCondition::Present(settings.selectors.layout_ready.clone()),
            settings.ready_timeout,
            CaptureStage::Idle,
        )
        .await?;

        self.submit_location(browser, location).await?;
        stages.advance(CaptureStage::LocationSubmitted);

        stages.advance(CaptureStage::Scrolling);
        let scroll = scroll_until_stable(browser, &settings.scroll)
            .await
            .map_err(automation(CaptureStage::Scrolling))?;
        match scroll {
            ScrollOutcome::Stable { rounds, height } => {
                tracing::info!(rounds, height, "results page stabilised");
            }
            ScrollOutcome::GaveUp {
                rounds,
                last_height,
                reason,
            } => {
                tracing::warn!(
                    rounds,
                    last_height,
                    %reason,
                    "results page never stabilised; continuing with what was captured"
                );
            }
        }

        let exchanges = browser
            .intercepted_requests()
            .await
            .map_err(automation(CaptureStage::Captured))?;
        let batch = self.decoder.decode_all(&exchanges);
        stages.advance(CaptureStage::Captured);
        tracing::info!(
            exchanges = exchanges.len(),
            search_responses = batch.matched,
            undecodable = batch.failed,
            "captured search responses"
        );

        let mut registry = MerchantRegistry::new();
        let mut stats = AggregateStats::default();
        let mut summary = IngestSummary::default();
        for payload in &batch.payloads {
            summary.absorb(ingest(payload, &mut registry, &mut stats));
        }
        stages.advance(CaptureStage::Deduplicated);
        tracing::info!(
            unique = registry.len(),
            duplicates = summary.duplicates,
            malformed = summary.malformed,
            "deduplicated merchants"
        );

        let output = match &settings.output {
            Some(paths) => {
                let written = write_outputs(&registry, &paths.csv, &paths.json_gz)?;
                stages.advance(CaptureStage::Written);
                Some(written)
            }
            None => None,
        };

        stages.advance(CaptureStage::Done);

        Ok(CaptureReport {
            registry,
            stats,
            scroll,
            exchanges_seen: exchanges.len(),
            search_responses: batch.matched,
            undecodable_responses: batch.failed,
            ingest: summary,
            output,
            stages: stages.into_inner(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Dismisses the cookie banner if one shows up. Never fails.
    async fn accept_cookies<B>(&self, browser: &mut B)
    where
        B: BrowserAutomation + ?Sized,
    {
        let button = &self.settings.selectors.cookie_accept;
        let condition = WaitCondition::Clickable(button.clone());
        match browser
            .wait_for(&condition, self.settings.cookie_timeout)
            .await
        {
            Ok(true) => {
                if let Err(error) = browser.click(button).await {
                    tracing::warn!(%error, "cookie banner present but could not be accepted");
                }
            }
            Ok(false) => tracing::debug!("no cookie banner"),
            Err(error) => tracing::warn!(%error, "cookie banner check failed"),
        }
    }

    async fn submit_location<B>(&self, browser: &mut B, location: &str) -> Result<(), CaptureError>
    where
        B: BrowserAutomation + ?Sized,
    {
        let selectors = &self.settings.selectors;
        let stage = CaptureStage::Idle;

        browser
            .click(&selectors.location_input)
            .await
            .map_err(automation(stage))?;
        tokio::time::sleep(self.settings.input_settle).await;
        browser
            .type_text(&selectors.location_input, location)
            .await
            .map_err(automation(stage))?;
        browser
            .click(&selectors.submit_button)
            .await
            .map_err(automation(stage))?;

        tracing::info!(location, "submitted delivery location");

        self.require(
            browser,
            WaitCondition::Present(selectors.layout_ready.clone()),
            self.settings.submit_timeout,
            stage,
        )
        .await
    }

    async fn require<B>(
        &self,
        browser: &mut B,
        condition: WaitCondition,
        timeout: Duration,
        stage: CaptureStage,
    ) -> Result<(), CaptureError>
    where
        B: BrowserAutomation + ?Sized,
    {
        let ready = browser
            .wait_for(&condition, timeout)
            .await
            .map_err(automation(stage))?;
        if ready {
            Ok(())
        } else {
            Err(CaptureError::NotReady {
                stage,
                condition: condition.to_string(),
                timeout_secs: timeout.as_secs(),
            })
        }
    }
}

fn automation(stage: CaptureStage) -> impl FnOnce(AutomationError) -> CaptureError {
    move |source| CaptureError::Automation { stage, source }
}

struct StageLog {
    stages: Vec<CaptureStage>,
}

impl StageLog {
    fn new() -> Self {
        Self {
            stages: vec![CaptureStage::Idle],
        }
    }

    fn advance(&mut self, next: CaptureStage) {
        let from = self.stages.last().copied().unwrap_or(CaptureStage::Idle);
        tracing::debug!(%from, to = %next, "capture stage transition");
        self.stages.push(next);
    }

    fn into_inner(self) -> Vec<CaptureStage> {
        self.stages
    }
}
