//! Excel workbooks.
//!
//! The first worksheet is read with its first row as the header. Cell values
//! are typed per column: integral numbers become `Int64`, other numbers
//! `Float64`, booleans `Boolean`, and anything mixed or textual `String`.
//! Date cells are rendered as ISO strings.
//!
//! Writing produces a one-sheet `.xlsx` workbook in the same layout.

use calamine::{Data, Reader, open_workbook_auto};
use panel_core::{PanelError, Result, normalize};
use polars::prelude::*;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

/// Largest magnitude at which an `f64` still holds every integer exactly.
const MAX_EXACT_INT: f64 = 9.007_199_254_740_992e15;

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Self::Null,
            Data::Int(v) => Self::Int(*v),
            Data::Float(v) => Self::Float(*v),
            Data::Bool(v) => Self::Bool(*v),
            Data::String(s) if s.trim().is_empty() => Self::Null,
            Data::String(s) => Self::Text(s.clone()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
                    Self::Text(dt.format("%Y-%m-%d").to_string())
                }
                Some(dt) => Self::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => Self::Float(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && v.abs() < MAX_EXACT_INT => Some(*v as i64),
            _ => None,
        }
    }

    fn render(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Bool(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

/// Reads the first worksheet of a workbook into a DataFrame.
///
/// # Errors
/// Returns [`PanelError::Spreadsheet`] if the workbook cannot be opened or has
/// no worksheet.
#[instrument(fields(path = %path.display()))]
pub fn read_excel(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PanelError::Spreadsheet(format!("{}: {e}", path.display())))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PanelError::Spreadsheet(format!("{} has no sheets", path.display())))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| PanelError::Spreadsheet(format!("{}: {e}", path.display())))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let names = header_names(header);

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (i, column) in cells.iter_mut().enumerate() {
            column.push(row.get(i).map_or(Cell::Null, Cell::from_data));
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| typed_column(name, &values))
        .collect::<Vec<_>>();
    let frame = DataFrame::new(columns)?;
    debug!(sheet = %sheet, rows = frame.height(), cols = frame.width(), "Read workbook");
    Ok(frame)
}

/// Writes `frame` to the first worksheet of a new `.xlsx` workbook.
///
/// The header goes in the first row. Numeric columns are written as numbers,
/// booleans as booleans and everything else as text; nulls leave the cell
/// empty. Parent directories are created.
///
/// # Errors
/// Returns [`PanelError::Spreadsheet`] if the workbook cannot be written, or
/// [`PanelError::InvalidParameter`] if the frame exceeds worksheet limits.
#[instrument(skip(frame), fields(path = %path.display(), rows = frame.height()))]
pub fn write_excel(frame: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let xlsx = |e: XlsxError| PanelError::Spreadsheet(format!("{}: {e}", path.display()));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (index, column) in frame.get_columns().iter().enumerate() {
        let col = u16::try_from(index).map_err(|_| {
            PanelError::InvalidParameter(format!("{} has too many columns", path.display()))
        })?;
        sheet.write_string(0, col, column.name().as_str()).map_err(xlsx)?;

        match column.dtype() {
            DataType::Boolean => {
                for (i, value) in column.as_materialized_series().bool()?.into_iter().enumerate() {
                    if let Some(value) = value {
                        sheet.write_boolean(sheet_row(i)?, col, value).map_err(xlsx)?;
                    }
                }
            }
            DataType::Int32
            | DataType::Int64
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => {
                let cast = column.cast(&DataType::Float64)?;
                for (i, value) in cast.as_materialized_series().f64()?.into_iter().enumerate() {
                    if let Some(value) = value {
                        sheet.write_number(sheet_row(i)?, col, value).map_err(xlsx)?;
                    }
                }
            }
            _ => {
                for (i, value) in normalize::string_values(column)?.into_iter().enumerate() {
                    if let Some(value) = value {
                        sheet.write_string(sheet_row(i)?, col, &value).map_err(xlsx)?;
                    }
                }
            }
        }
    }

    workbook.save(path).map_err(xlsx)?;
    debug!("Wrote workbook");
    Ok(())
}

/// Worksheet row of the `i`-th data row, below the header.
fn sheet_row(i: usize) -> Result<u32> {
    u32::try_from(i + 1)
        .map_err(|_| PanelError::InvalidParameter(format!("row {i} exceeds worksheet limits")))
}

/// Renders header cells, naming blanks `Unnamed: i` and suffixing repeats `.1`, `.2`, ...
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let base = Cell::from_data(cell)
                .as_int()
                .map(|v| v.to_string())
                .or_else(|| Cell::from_data(cell).render())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Unnamed: {i}"));
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn typed_column(name: String, values: &[Cell]) -> Column {
    let name = PlSmallStr::from(name);
    let present = || values.iter().filter(|c| **c != Cell::Null);

    if present().all(|c| c.as_int().is_some()) {
        let ints: Vec<Option<i64>> = values.iter().map(Cell::as_int).collect();
        return Column::new(name, ints);
    }
    if present().all(|c| matches!(c, Cell::Int(_) | Cell::Float(_))) {
        let floats: Vec<Option<f64>> = values
            .iter()
            .map(|c| match c {
                Cell::Int(v) => Some(*v as f64),
                Cell::Float(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Column::new(name, floats);
    }
    if present().all(|c| matches!(c, Cell::Bool(_))) {
        let bools: Vec<Option<bool>> = values
            .iter()
            .map(|c| match c {
                Cell::Bool(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Column::new(name, bools);
    }
    let strings: Vec<Option<String>> = values.iter().map(Cell::render).collect();
    Column::new(name, strings)
}
