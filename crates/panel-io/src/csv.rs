//! Comma-delimited tables.

use panel_core::{PanelError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Reads a CSV file with a header row.
///
/// Column types are inferred from the whole file. If strict parsing fails the
/// file is read again leniently: records whose field count differs from the
/// header's are skipped, values that do not fit the inferred type become null
/// and invalid UTF-8 is replaced.
///
/// # Errors
/// Returns [`PanelError::Parse`] if the lenient read fails as well.
#[instrument(fields(path = %path.display()))]
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    match read_options(false)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
    {
        Ok(frame) => {
            debug!(rows = frame.height(), cols = frame.width(), "Read CSV");
            Ok(frame)
        }
        Err(strict) => {
            warn!(error = %strict, "Strict CSV parse failed, retrying leniently");
            let (records, skipped) = well_formed_records(path)?;
            if skipped > 0 {
                warn!(skipped, "Skipped malformed CSV rows");
            }
            let frame = read_options(true)
                .into_reader_with_file_handle(Cursor::new(records))
                .finish()
                .map_err(|e| PanelError::Parse(format!("{}: {e}", path.display())))?;
            debug!(rows = frame.height(), cols = frame.width(), "Read CSV leniently");
            Ok(frame)
        }
    }
}

fn read_options(lenient: bool) -> CsvReadOptions {
    let encoding = if lenient {
        CsvEncoding::LossyUtf8
    } else {
        CsvEncoding::Utf8
    };
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_ignore_errors(lenient)
        .with_parse_options(CsvParseOptions::default().with_encoding(encoding))
}

/// Re-encodes the header and every record with as many fields as the header.
///
/// Returns the re-encoded bytes and the number of records dropped.
fn well_formed_records(path: &Path) -> Result<(Vec<u8>, usize)> {
    let parse_error = |e: ::csv::Error| PanelError::Parse(format!("{}: {e}", path.display()));
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(parse_error)?;
    let mut writer = ::csv::Writer::from_writer(Vec::new());

    let mut records = reader.byte_records();
    let Some(header) = records.next().transpose().map_err(parse_error)? else {
        return Err(PanelError::Parse(format!("{} is empty", path.display())));
    };
    writer.write_byte_record(&header).map_err(parse_error)?;

    let mut skipped = 0usize;
    for record in records {
        match record {
            Ok(record) if record.len() == header.len() => {
                writer.write_byte_record(&record).map_err(parse_error)?;
            }
            _ => skipped += 1,
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PanelError::Parse(format!("{}: {e}", path.display())))?;
    Ok((bytes, skipped))
}

/// Writes `frame` as CSV with a header row, creating parent directories.
///
/// # Errors
/// Returns an error if the file cannot be created or serialization fails.
#[instrument(skip(frame), fields(path = %path.display(), rows = frame.height()))]
pub fn write_csv(frame: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(frame)?;
    debug!("Wrote CSV");
    Ok(())
}
