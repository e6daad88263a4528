use log::info;

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
};

use crate::{
    aggregate::aggregate,
    config::{ColumnMapping, Config, Separator},
    error::{Error, Result},
    filter::{filter_by_date, DateRange},
    loader::load,
    report::Report,
    validate::validate,
};

/// Everything one report run needs to know.
#[derive(Clone, Debug)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    pub separator: Separator,
    pub columns: ColumnMapping,
    pub range: DateRange,
}

impl Job {
    /// Creates a job for `input` using the separator and column names from
    /// `config`. The report goes to [`default_output_path`], covering all
    /// dates.
    #[must_use]
    pub fn new(config: &Config, input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        Self {
            output: default_output_path(&input),
            input,
            separator: config.separator,
            columns: config.columns.clone(),
            range: DateRange::default(),
        }
    }
}

/// The result of a successful run.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The report was written to `path`.
    Written { path: PathBuf, report: Report },
    /// No rows fell within the date range, so no report was written.
    NoData,
}

/// Returns where the report for `input` goes by default: next to the input,
/// named after it with a `_report.xlsx` suffix.
///
/// # Examples
///
/// ```
/// # use std::path::Path;
/// # use sales_report::pipeline::default_output_path;
/// assert_eq!(
///     default_output_path(Path::new("data/march.csv")),
///     Path::new("data/march_report.xlsx"),
/// );
/// ```
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{stem}_report.xlsx"))
}

/// Loads, validates, filters and aggregates the sales data for `job`, then
/// writes the report.
///
/// A panic inside any stage is reported as [`Error::Internal`] rather than
/// unwinding into the caller. The process panic hook still runs first, so
/// its message reaches stderr as usual.
///
/// # Errors
///
/// Returns the first error raised by any stage. The output file is only
/// touched once every earlier stage has succeeded.
pub fn run(job: &Job) -> Result<Outcome> {
    guarded(|| run_stages(job))
}

fn guarded(stages: impl FnOnce() -> Result<Outcome>) -> Result<Outcome> {
    panic::catch_unwind(AssertUnwindSafe(stages))
        .unwrap_or_else(|payload| Err(Error::Internal(panic_message(payload.as_ref()))))
}

fn run_stages(job: &Job) -> Result<Outcome> {
    let table = load(&job.input, job.separator)?;
    validate(&table, &job.columns)?;
    let Some(mut table) = filter_by_date(table, &job.columns.date, job.range)? else {
        info!("no rows between {:?} and {:?}", job.range.start, job.range.end);
        return Ok(Outcome::NoData);
    };
    let report = aggregate(&mut table, &job.columns)?;
    report.write(&job.output)?;
    Ok(Outcome::Written {
        path: job.output.clone(),
        report,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with no message".to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::{amount::Amount, error::ErrorKind};

    fn job(input: &str) -> (TempDir, Job) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file("testdata/config.ini").unwrap();
        let mut job = Job::new(&config, input);
        job.output = dir.path().join("report.xlsx");
        (dir, job)
    }

    fn amounts(rows: &[(&str, f64)]) -> Vec<(String, Amount)> {
        rows.iter()
            .map(|(k, v)| ((*k).to_string(), Amount::new(*v)))
            .collect()
    }

    #[test]
    fn run_fn_writes_report_for_two_row_csv() {
        let (_dir, job) = job("testdata/sales.csv");
        let Outcome::Written { path, report } = run(&job).unwrap() else {
            panic!("expected a report");
        };
        assert_eq!(path, job.output);
        assert!(path.exists());
        let expected = amounts(&[("Alice", 20.0), ("Bob", 20.0)]);
        assert_eq!(report.managers.rows, expected);
        assert_eq!(
            report.top_products.rows,
            amounts(&[("Widget", 20.0), ("Gadget", 20.0)])
        );
    }

    #[test]
    fn run_fn_gives_same_totals_on_repeat() {
        let (_dir, job) = job("testdata/sales_week.csv");
        let first = run(&job).unwrap();
        let second = run(&job).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn run_fn_returns_no_data_without_touching_output() {
        let (_dir, mut job) = job("testdata/sales_week.csv");
        job.range = DateRange::new(NaiveDate::from_ymd_opt(2030, 1, 1), None);
        assert_eq!(run(&job).unwrap(), Outcome::NoData);
        assert!(!job.output.exists());
    }

    #[test]
    fn run_fn_leaves_existing_output_alone_when_no_data() {
        let (_dir, mut job) = job("testdata/sales_week.csv");
        std::fs::write(&job.output, b"previous report").unwrap();
        job.range = DateRange::new(NaiveDate::from_ymd_opt(2030, 1, 1), None);
        assert_eq!(run(&job).unwrap(), Outcome::NoData);
        assert_eq!(std::fs::read(&job.output).unwrap(), b"previous report");
    }

    #[test]
    fn run_fn_fails_without_output_on_bad_quantity() {
        let (_dir, job) = job("testdata/sales_bad_qty.csv");
        let err = run(&job).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidNumericValue);
        assert!(!job.output.exists());
    }

    #[test]
    fn run_fn_fails_on_missing_column() {
        let (_dir, job) = job("testdata/sales_no_price.csv");
        assert_eq!(run(&job).unwrap_err().kind(), ErrorKind::MissingColumn);
    }

    #[test]
    fn run_fn_fails_on_missing_input() {
        let (_dir, job) = job("testdata/nonexistent.csv");
        assert_eq!(run(&job).unwrap_err().kind(), ErrorKind::FileAccess);
    }

    #[test]
    fn job_new_fn_puts_report_next_to_input() {
        let config = Config::from_file("testdata/config.ini").unwrap();
        let job = Job::new(&config, "testdata/sales.csv");
        assert_eq!(job.output, Path::new("testdata/sales_report.xlsx"));
        assert_eq!(job.range, DateRange::default());
    }

    #[test]
    fn guarded_fn_turns_panic_into_internal_error() {
        let err = guarded(|| panic!("boom")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "unexpected error: boom");
    }

    #[test]
    fn panic_message_fn_reads_str_and_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
