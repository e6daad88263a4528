use chrono::{NaiveDate, NaiveDateTime};

use std::fmt::Display;

/// A single value read from the input.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    /// A date-time typed cell, as stored by spreadsheets.
    DateTime(NaiveDateTime),
    /// A calendar date, produced by date filtering.
    Date(NaiveDate),
}

impl Cell {
    /// Wraps a raw delimited-text field.
    ///
    /// Empty fields become [`Cell::Empty`]; everything else is kept as text,
    /// exactly as written. Numeric columns are read through
    /// [`Cell::as_number`].
    #[must_use]
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(field.to_string())
        }
    }

    /// Returns the numeric value of this cell, if it has one.
    ///
    /// Text is accepted when it parses as a finite number once surrounding
    /// whitespace is trimmed.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Tabular data held in memory: a header of column names plus rows of cells.
///
/// Every row has exactly one cell per column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given header.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding it with empty cells or truncating it to fit the
    /// header.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the position of the first column called `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the cells of column `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Stores `values` as column `name`, replacing it if it already exists
    /// and appending it otherwise.
    ///
    /// # Panics
    ///
    /// If `values` does not have one cell per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        assert_eq!(values.len(), self.rows.len(), "column length mismatch");
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Keeps only the rows for which `keep` returns true.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) {
        self.rows.retain(|row| keep(row));
    }
}
