use calamine::{open_workbook, Data, Reader, Xls, Xlsx};
use log::debug;

use std::{fmt::Display, fs::File, io::BufReader, path::Path};

use crate::{
    config::Separator,
    error::{Error, Result},
    table::{Cell, Table},
};

/// The kinds of input file that can be loaded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Csv,
    Xlsx,
    Xls,
}

impl Format {
    /// Works out the input format from the extension of `path`, ignoring
    /// case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the extension is missing or is
    /// not one of `.csv`, `.xlsx` or `.xls`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(Format::Csv),
            "xlsx" => Ok(Format::Xlsx),
            "xls" => Ok(Format::Xls),
            _ => Err(Error::UnsupportedFormat {
                extension: if extension.is_empty() {
                    String::new()
                } else {
                    format!(".{extension}")
                },
            }),
        }
    }
}

/// Reads the sales extract at `path` into a [`Table`].
///
/// CSV files are split on `separator` and use their first record as the
/// header. Spreadsheets are read from their first sheet, whose first row is
/// the header; `separator` is not used for them.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for an unrecognised extension, and
/// [`Error::FileAccess`] if the file cannot be opened or parsed.
pub fn load(path: impl AsRef<Path>, separator: Separator) -> Result<Table> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let table = match format {
        Format::Csv => read_csv(path, separator)?,
        Format::Xlsx => read_workbook::<Xlsx<BufReader<File>>>(path)?,
        Format::Xls => read_workbook::<Xls<BufReader<File>>>(path)?,
    };
    debug!(
        "loaded {} rows x {} columns from {} ({format:?})",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

fn read_csv(path: &Path, separator: Separator) -> Result<Table> {
    let file = File::open(path).map_err(|e| Error::file_access(path, e))?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(separator.byte())
        .from_reader(file);
    let headers = rdr
        .headers()
        .map_err(|e| Error::file_access(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut table = Table::new(headers);
    for result in rdr.records() {
        let record = result.map_err(|e| Error::file_access(path, e))?;
        table.push_row(record.iter().map(Cell::from_field).collect());
    }
    Ok(table)
}

fn read_workbook<R>(path: &Path) -> Result<Table>
where
    R: Reader<BufReader<File>>,
    R::Error: Display,
{
    // Report a missing file as such, rather than as a workbook error.
    path.metadata().map_err(|e| Error::file_access(path, e))?;
    let mut workbook: R = open_workbook(path).map_err(|e| Error::file_access(path, e))?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(Table::default());
    };
    let range = range.map_err(|e| Error::file_access(path, e))?;
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };
    let mut table = Table::new(header.iter().map(|d| cell_from_data(d).to_string()).collect());
    for row in rows {
        table.push_row(row.iter().map(cell_from_data).collect());
    }
    Ok(table)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(Cell::Number(dt.as_f64()), Cell::DateTime),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}
