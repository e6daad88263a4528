use std::{fs, path::Path};

use assert_cmd::Command;
use calamine::{open_workbook, Data, Reader, Xlsx};
use predicates::str::contains;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::tempdir;

fn sales_report() -> Command {
    let mut cmd = Command::cargo_bin("sales-report").expect("binary exists");
    cmd.args(["--config", "testdata/config.ini"]);
    cmd
}

fn sheet_rows(path: &Path, sheet: &str) -> Vec<Vec<Data>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("open report");
    let range = workbook.worksheet_range(sheet).expect("read sheet");
    range.rows().map(<[Data]>::to_vec).collect()
}

fn row(name: &str, total: f64) -> Vec<Data> {
    vec![Data::String(name.into()), Data::Float(total)]
}

#[test]
fn writes_report_for_semicolon_csv() {
    let dir = tempdir().expect("temp dir");
    let output = dir.path().join("out.xlsx");
    sales_report()
        .args(["testdata/sales.csv", "--output", output.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Success! Report written to"))
        .stdout(contains("Alice"));

    let managers = sheet_rows(&output, "Manager report");
    assert_eq!(managers[1..], [row("Alice", 20.0), row("Bob", 20.0)]);
    let products = sheet_rows(&output, "Top-5 products");
    assert_eq!(products[1..], [row("Widget", 20.0), row("Gadget", 20.0)]);
}

#[test]
fn writes_report_next_to_input_by_default() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("sales.csv");
    fs::copy("testdata/sales.csv", &input).expect("copy fixture");
    sales_report()
        .arg(input.to_str().unwrap())
        .assert()
        .success();
    assert!(dir.path().join("sales_report.xlsx").exists());
}

#[test]
fn date_range_limits_report_and_keeps_top_five() {
    let dir = tempdir().expect("temp dir");
    let output = dir.path().join("week.xlsx");
    sales_report()
        .args([
            "testdata/sales_week.csv",
            "--start",
            "2024-03-01",
            "--end",
            "2024-03-07",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let managers = sheet_rows(&output, "Manager report");
    assert_eq!(
        managers[1..],
        [
            row("Dave", 100.0),
            row("Alice", 45.0),
            row("Carol", 32.0),
            row("Bob", 15.0),
        ]
    );
    let products = sheet_rows(&output, "Top-5 products");
    assert_eq!(
        products[1..],
        [
            row("Sprocket", 100.0),
            row("Widget", 30.0),
            row("Gizmo", 30.0),
            row("Bracket", 15.0),
            row("Doohickey", 10.0),
        ]
    );
}

#[test]
fn reports_no_data_when_range_excludes_everything() {
    let dir = tempdir().expect("temp dir");
    let output = dir.path().join("empty.xlsx");
    sales_report()
        .args([
            "testdata/sales_week.csv",
            "--end",
            "2024-02-29",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("No data for the report"));
    assert!(!output.exists());
}

#[test]
fn fails_when_column_is_missing() {
    let dir = tempdir().expect("temp dir");
    let output = dir.path().join("out.xlsx");
    sales_report()
        .args([
            "testdata/sales_no_price.csv",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("ERROR:"))
        .stderr(contains("'Price'"));
    assert!(!output.exists());
}

#[test]
fn fails_for_unsupported_format() {
    sales_report()
        .arg("testdata/sales.txt")
        .assert()
        .failure()
        .stderr(contains("unsupported file format"));
}

#[test]
fn fails_for_missing_config() {
    Command::cargo_bin("sales-report")
        .expect("binary exists")
        .args(["testdata/sales.csv", "--config", "testdata/bogus.ini"])
        .assert()
        .failure()
        .stderr(contains("configuration error"));
}

#[test]
fn rejects_malformed_start_date() {
    sales_report()
        .args(["testdata/sales.csv", "--start", "03/01/2024"])
        .assert()
        .failure()
        .stderr(contains("--start"));
}

#[test]
fn reads_xlsx_input() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("sales.xlsx");
    let output = dir.path().join("report.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm");
    for (col, name) in (0..).zip(["Date", "Qty", "Price", "Manager", "Product"]) {
        sheet.write_string(0, col, name).unwrap();
    }
    let lines = [
        ((2024, 5, 1), 2.0, 10.0, "Alice", "Widget"),
        ((2024, 5, 2), 1.0, 30.0, "Bob", "Gadget"),
        ((2024, 6, 1), 9.0, 99.0, "Bob", "Gadget"),
    ];
    for (row, ((y, m, d), qty, price, manager, product)) in (1..).zip(lines) {
        let date = ExcelDateTime::from_ymd(y, m, d)
            .unwrap()
            .and_hms(15, 30, 0)
            .unwrap();
        sheet
            .write_datetime_with_format(row, 0, &date, &date_format)
            .unwrap();
        sheet.write_number(row, 1, qty).unwrap();
        sheet.write_number(row, 2, price).unwrap();
        sheet.write_string(row, 3, manager).unwrap();
        sheet.write_string(row, 4, product).unwrap();
    }
    workbook.save(&input).unwrap();

    sales_report()
        .args([
            input.to_str().unwrap(),
            "--end",
            "2024-05-31",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let managers = sheet_rows(&output, "Manager report");
    assert_eq!(managers[1..], [row("Bob", 30.0), row("Alice", 20.0)]);
}
