//! CSV and gzip JSON sinks for the merchant registry.
//!
//! Both outputs are rendered fully in memory before anything touches the
//! filesystem, then each file is replaced atomically (temp file in the
//! destination directory, synced, renamed).

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use grabfood_core::{ID_COLUMN, MERCHANT_COLUMNS};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::dedup::MerchantRegistry;
use crate::error::CaptureError;

/// What [`write_outputs`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub rows: usize,
    pub csv_path: PathBuf,
    pub json_gz_path: PathBuf,
}

/// Writes `registry` to a CSV file and a gzip-compressed JSON file.
///
/// # Errors
///
/// Returns [`CaptureError::EmptyResult`] without creating any file when the
/// registry is empty, and [`CaptureError::Io`], [`CaptureError::Csv`] or
/// [`CaptureError::Json`] when rendering or writing fails.
pub fn write_outputs(
    registry: &MerchantRegistry,
    csv_path: &Path,
    json_gz_path: &Path,
) -> Result<OutputSummary, CaptureError> {
    if registry.is_empty() {
        return Err(CaptureError::EmptyResult);
    }

    let csv_bytes = render_csv(registry, csv_path)?;
    let json_gz_bytes = render_json_gz(registry, json_gz_path)?;

    atomic_write(json_gz_path, &json_gz_bytes)?;
    tracing::info!(path = %json_gz_path.display(), rows = registry.len(), "wrote gzip JSON output");

    atomic_write(csv_path, &csv_bytes)?;
    tracing::info!(path = %csv_path.display(), rows = registry.len(), "wrote CSV output");

    Ok(OutputSummary {
        rows: registry.len(),
        csv_path: csv_path.to_path_buf(),
        json_gz_path: json_gz_path.to_path_buf(),
    })
}

/// Renders the registry as CSV: an id column followed by the record
/// columns, one row per merchant in insertion order.
///
/// # Errors
///
/// Returns [`CaptureError::Csv`] if a record cannot be encoded.
pub fn render_csv(registry: &MerchantRegistry, path: &Path) -> Result<Vec<u8>, CaptureError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(std::iter::once(ID_COLUMN).chain(MERCHANT_COLUMNS))?;
    for (id, record) in registry {
        let cells = record.cells();
        writer.write_record(std::iter::once(id.as_str()).chain(cells.iter().map(String::as_str)))?;
    }

    writer
        .into_inner()
        .map_err(|e| CaptureError::io(path, e.into_error()))
}

/// Renders the registry as a 4-space indented JSON object keyed by merchant
/// id, gzip-compressed.
///
/// # Errors
///
/// Returns [`CaptureError::Json`] or [`CaptureError::Io`] if encoding fails.
pub fn render_json_gz(
    registry: &MerchantRegistry,
    path: &Path,
) -> Result<Vec<u8>, CaptureError> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(encoder, formatter);
    registry.serialize(&mut serializer)?;

    serializer
        .into_inner()
        .finish()
        .map_err(|e| CaptureError::io(path, e))
}

fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), CaptureError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| CaptureError::io(dir, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| CaptureError::io(dir, e))?;
    temp.write_all(contents)
        .and_then(|()| temp.flush())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| CaptureError::io(path, e))?;
    temp.persist(path)
        .map_err(|e| CaptureError::io(path, e.error))?;
    Ok(())
}
