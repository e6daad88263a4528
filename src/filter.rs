use chrono::{DateTime, NaiveDate, NaiveTime};
use log::debug;

use crate::{
    error::{Error, Result},
    table::{Cell, Table},
};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// An inclusive range of calendar dates. A missing bound leaves that side
/// open.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Parses `value` as a calendar date, discarding any time of day.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY` and `DD.MM.YYYY`, each
/// optionally followed by a time (` HH:MM[:SS]` or `THH:MM[:SS]`), as well
/// as RFC 3339 timestamps.
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use sales_report::filter::parse_date;
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1);
/// assert_eq!(parse_date("2024-03-01"), day);
/// assert_eq!(parse_date("2024-03-01 17:40:00"), day);
/// assert_eq!(parse_date("yesterday"), None);
/// ```
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Some(date) = parse_date_only(value) {
        return Some(date);
    }
    if let Some((date, time)) = value.split_once([' ', 'T']) {
        let time = time.trim();
        if TIME_FORMATS
            .iter()
            .any(|fmt| NaiveTime::parse_from_str(time, fmt).is_ok())
        {
            if let Some(date) = parse_date_only(date) {
                return Some(date);
            }
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

fn parse_date_only(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn cell_date(cell: &Cell) -> Result<NaiveDate> {
    match cell {
        Cell::Date(date) => Ok(*date),
        Cell::DateTime(dt) => Ok(dt.date()),
        Cell::Text(s) => parse_date(s).ok_or_else(|| Error::DateParse { value: s.clone() }),
        other => Err(Error::DateParse {
            value: other.to_string(),
        }),
    }
}

/// Converts `date_column` to calendar dates and keeps the rows inside
/// `range`.
///
/// Returns `Ok(None)` when no rows are left, which means there is nothing to
/// report.
///
/// # Errors
///
/// Returns [`Error::DateParse`] if any value in `date_column` is not a date,
/// whether or not its row would have been kept, and
/// [`Error::MissingColumn`] if the column does not exist.
pub fn filter_by_date(
    mut table: Table,
    date_column: &str,
    range: DateRange,
) -> Result<Option<Table>> {
    let dates = table
        .column(date_column)
        .ok_or_else(|| Error::MissingColumn {
            column: date_column.to_string(),
        })?
        .map(cell_date)
        .collect::<Result<Vec<_>>>()?;
    table.set_column(date_column, dates.into_iter().map(Cell::Date).collect());

    let loaded = table.len();
    if let Some(idx) = table.column_index(date_column) {
        table.retain_rows(|row| matches!(row[idx], Cell::Date(date) if range.contains(date)));
    }
    debug!(
        "kept {} of {loaded} rows between {:?} and {:?}",
        table.len(),
        range.start,
        range.end
    );
    if table.is_empty() {
        Ok(None)
    } else {
        Ok(Some(table))
    }
}
