//! Capture and normalization of GrabFood search results.
//!
//! A [`BrowserAutomation`] collaborator drives the listing site; this crate
//! decodes the search responses it intercepted, deduplicates merchants, keeps
//! running delivery statistics, and writes CSV and gzip JSON output.

pub mod automation;
pub mod decode;
pub mod dedup;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod replay;
pub mod scroll;
pub mod stats;
pub mod types;

pub use automation::{BrowserAutomation, Locator, WaitCondition};
pub use decode::{DecodedBatch, ResponseDecoder};
pub use dedup::{ingest, IngestSummary, MerchantRegistry};
pub use error::{AutomationError, CaptureError, DecodeError};
pub use output::{write_outputs, OutputSummary};
pub use pipeline::{
    CaptureHandle, CapturePipeline, CaptureReport, CaptureSettings, CaptureStage, OutputPaths,
    PageSelectors,
};
pub use replay::ReplayBrowser;
pub use scroll::{GiveUpReason, ScrollOutcome, ScrollPolicy};
pub use stats::AggregateStats;
pub use types::{InterceptedExchange, SearchResponsePayload};
