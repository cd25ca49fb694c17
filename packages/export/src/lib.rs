#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV export of [`PropertyRecord`]s.
//!
//! Output is spreadsheet-friendly for Spanish-locale tools: `;` delimited,
//! UTF-8 with a byte-order mark, one header row with the columns listed in
//! [`COLUMNS`]. Flags are written as `0`/`1` and absent values as empty
//! cells.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use propscrape_listing_models::{COLUMNS, PropertyRecord};

/// UTF-8 byte-order mark written before the header row.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Field delimiter.
pub const DELIMITER: u8 = b';';

/// Errors that can occur while exporting records.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Writing to the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized as a CSV row.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the BOM, the header row and one row per record to `writer`.
///
/// The header is written even when `records` is empty.
///
/// # Errors
///
/// Returns [`ExportError`] if writing or serializing fails.
pub fn write_records<W: Write>(mut writer: W, records: &[PropertyRecord]) -> Result<(), ExportError> {
    writer.write_all(UTF8_BOM)?;
    write_csv(writer, records)
}

/// Like [`write_records`] but without the byte-order mark, for terminal
/// output.
///
/// # Errors
///
/// Returns [`ExportError`] if writing or serializing fails.
pub fn write_csv<W: Write>(writer: W, records: &[PropertyRecord]) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(COLUMNS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes `records` to a new file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_records_to_path(path: &Path, records: &[PropertyRecord]) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_records(BufWriter::new(file), records)?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
