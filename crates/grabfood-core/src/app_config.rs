use std::path::PathBuf;

/// Resolved settings for one capture session.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Landing page opened before the location is submitted.
    pub page_url: String,
    /// Exact URL of the search endpoint whose `POST` responses are captured.
    pub search_url: String,
    /// Free-text delivery location typed into the location input.
    pub location: Option<String>,
    pub output_csv: PathBuf,
    pub output_json_gz: PathBuf,
    pub scroll_delay_ms: u64,
    pub scroll_max_rounds: u32,
    pub scroll_max_secs: u64,
    pub cookie_timeout_secs: u64,
    pub ready_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    pub input_settle_ms: u64,
}
