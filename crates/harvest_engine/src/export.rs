use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use harvest_core::{HarvestResult, FIELD_NAMES};
use serde_json::json;

use crate::persist::{AtomicFileWriter, PersistError};

/// Where and how to write the export.
///
/// Every field is quote-wrapped (embedded quotes doubled), so delimiter
/// characters inside values survive unchanged.
#[derive(Clone)]
pub struct ExportOptions {
    pub path: PathBuf,
    pub delimiter: u8,
    /// Optional JSON run summary written next to the export.
    pub summary_path: Option<PathBuf>,
    /// Clock used for the summary's `exported_utc` field.
    pub exported_utc: Arc<dyn Fn() -> String + Send + Sync>,
}

impl ExportOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            summary_path: None,
            exported_utc: Arc::new(String::new),
        }
    }
}

impl fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportOptions")
            .field("path", &self.path)
            .field("delimiter", &char::from(self.delimiter))
            .field("summary_path", &self.summary_path)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub row_count: usize,
    pub page_count: u32,
    pub output_path: PathBuf,
    pub summary_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize the header and every record, one quoted row per line.
pub fn render_delimited(result: &HarvestResult, delimiter: u8) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(result.header())?;
    for record in result.records() {
        writer.write_record(record.fields())?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Write the export (and the optional summary), replacing any previous file.
///
/// Both documents are rendered before anything is written, and the summary is
/// written first: a failed summary leaves the previous export untouched.
pub fn export(result: &HarvestResult, options: &ExportOptions) -> Result<ExportSummary, ExportError> {
    let bytes = render_delimited(result, options.delimiter)?;
    let summary = match &options.summary_path {
        Some(path) => Some((path, render_summary(result, options)?)),
        None => None,
    };

    let summary_path = match summary {
        Some((path, text)) => {
            let (writer, filename) = AtomicFileWriter::for_target(path)?;
            Some(writer.write(&filename, text)?)
        }
        None => None,
    };
    let (writer, filename) = AtomicFileWriter::for_target(&options.path)?;
    let output_path = writer.write(&filename, bytes)?;

    Ok(ExportSummary {
        row_count: result.len(),
        page_count: result.page_count(),
        output_path,
        summary_path,
    })
}

fn render_summary(result: &HarvestResult, options: &ExportOptions) -> Result<String, ExportError> {
    let summary = json!({
        "row_count": result.len(),
        "page_count": result.page_count(),
        "average_price": average_price(result),
        "unique_dealers": unique_dealers(result),
        "field_names": FIELD_NAMES,
        "exported_utc": (options.exported_utc)(),
    });
    Ok(serde_json::to_string_pretty(&summary)?)
}

fn unique_dealers(result: &HarvestResult) -> usize {
    result
        .records()
        .iter()
        .map(|r| r.dealer.as_str())
        .filter(|dealer| !dealer.is_empty())
        .collect::<BTreeSet<_>>()
        .len()
}

fn average_price(result: &HarvestResult) -> Option<f64> {
    let prices: Vec<u64> = result.records().iter().filter_map(|r| r.price).collect();
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<u64>() as f64 / prices.len() as f64)
}

/// Parse an exported file back into its header and rows, undoing the quoting.
pub fn read_export(
    path: &Path,
    delimiter: u8,
) -> Result<(Vec<String>, Vec<Vec<String>>), ExportError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)?;
    let header = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for row in reader.records() {
        rows.push(row?.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}
