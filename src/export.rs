//! CSV export of delivered results

use std::fs::File;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::request::ScrapeResult;

pub const CSV_HEADER: [&str; 3] = ["Index", "Value", "Snippet"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No scraped data to export.")]
    NoData,

    #[error("failed to create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Write the header and one row per result, in result order
pub fn write_csv<W: Write>(writer: W, results: &[ScrapeResult]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADER)?;
    for result in results {
        let index = result.index.to_string();
        writer.write_record([index.as_str(), result.value.as_str(), result.snippet.as_str()])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Export results to a new file at `path`. An empty result set is refused.
pub fn export_csv(path: &Path, results: &[ScrapeResult]) -> Result<(), ExportError> {
    if results.is_empty() {
        return Err(ExportError::NoData);
    }

    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_csv(file, results)
}
