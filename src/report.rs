use log::info;
use rust_xlsxwriter::{Chart, ChartType, Format, RowNum, Workbook, Worksheet, XlsxError};

use std::{fmt::Display, io::Write, path::Path};

use crate::{
    amount::Amount,
    error::{Error, Result},
};

pub const MANAGER_SHEET: &str = "Manager report";
pub const PRODUCT_SHEET: &str = "Top-5 products";
pub const CHART_TITLE: &str = "Managers common";
const SERIES_NAME: &str = "Sum of sales";

/// Sales totals grouped by one column, largest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Totals {
    /// Name of the column the rows were grouped by.
    pub key_label: String,
    /// Name of the column holding the summed totals.
    pub value_label: String,
    pub rows: Vec<(String, Amount)>,
}

impl Totals {
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Amount> {
        self.rows.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }
}

/// Holds the aggregated sales data for one report.
///
/// To build a `Report` from sales data, use [`crate::aggregate::aggregate`].
///
/// To save it as a spreadsheet, use [`Report::write`].
///
/// To get a printable version of the report, use its [`Display`]
/// implementation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    /// Total sales per manager.
    pub managers: Totals,
    /// Total sales of the five best-selling products.
    pub top_products: Totals,
}

impl Report {
    /// Writes the report as a spreadsheet to `path`, replacing any existing
    /// file.
    ///
    /// The workbook has a "Manager report" sheet, with a column chart of
    /// sales per manager, and a "Top-5 products" sheet. The chart is left out
    /// when there are no manager rows to plot. The workbook is written to a
    /// temporary file next to `path` and then renamed into place, so `path`
    /// is never left holding a partial report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] if the workbook cannot be built or saved.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let buf = self
            .workbook()
            .and_then(|mut wb| wb.save_to_buffer())
            .map_err(|e| Error::write(path, e))?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".sales-report-")
            .suffix(".xlsx")
            .tempfile_in(dir)
            .map_err(|e| Error::write(path, e))?;
        tmp.write_all(&buf).map_err(|e| Error::write(path, e))?;
        tmp.as_file().sync_all().map_err(|e| Error::write(path, e))?;
        tmp.persist(path).map_err(|e| Error::write(path, e.error))?;
        info!("wrote report to {}", path.display());
        Ok(())
    }

    fn workbook(&self) -> std::result::Result<Workbook, XlsxError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name(MANAGER_SHEET)?;
        let last = write_totals(sheet, &self.managers, &header)?;
        sheet.set_column_width(0, 25)?;
        if last > 0 {
            let mut chart = Chart::new(ChartType::Column);
            chart
                .add_series()
                .set_name(SERIES_NAME)
                .set_categories((MANAGER_SHEET, 1, 0, last, 0))
                .set_values((MANAGER_SHEET, 1, 1, last, 1));
            chart.title().set_name(CHART_TITLE);
            chart.legend().set_hidden();
            sheet.insert_chart(1, 3, &chart)?;
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name(PRODUCT_SHEET)?;
        write_totals(sheet, &self.top_products, &header)?;
        sheet.set_column_width(0, 30)?;
        sheet.set_column_width(1, 20)?;

        Ok(workbook)
    }
}

/// Writes a header row and one row per total; returns the last row written.
fn write_totals(
    sheet: &mut Worksheet,
    totals: &Totals,
    header: &Format,
) -> std::result::Result<RowNum, XlsxError> {
    sheet.write_string_with_format(0, 0, &totals.key_label, header)?;
    sheet.write_string_with_format(0, 1, &totals.value_label, header)?;
    let mut last = 0;
    for (row, (key, total)) in (1..).zip(&totals.rows) {
        sheet.write_string(row, 0, key)?;
        sheet.write_number(row, 1, total.value())?;
        last = row;
    }
    Ok(last)
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_totals(f, &self.managers)?;
        writeln!(f)?;
        fmt_totals(f, &self.top_products)
    }
}

fn fmt_totals(f: &mut std::fmt::Formatter<'_>, totals: &Totals) -> std::fmt::Result {
    let width = totals
        .rows
        .iter()
        .map(|(key, _)| key.len())
        .chain([totals.key_label.len()])
        .max()
        .unwrap_or_default();
    writeln!(f, "{:width$} {:>12}", totals.key_label, totals.value_label)?;
    let length = width + 13;
    writeln!(f, "{:-<length$}", "")?;
    for (key, total) in &totals.rows {
        writeln!(f, "{key:width$} {total:>12}")?;
    }
    Ok(())
}
