use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use sales_report::{Config, DateRange, Job, Outcome};

use std::{env, path::PathBuf, process::ExitCode};

/// Builds a spreadsheet report of sales per manager and the top five
/// products from a CSV or XLSX sales extract.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to CSV or XLSX file
    input_file: PathBuf,
    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long)]
    start: Option<NaiveDate>,
    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Settings file with the CSV separator and column names
    #[arg(short, long, default_value = "config.ini")]
    config: PathBuf,
    /// Report path [default: <INPUT_FILE stem>_report.xlsx]
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Show progress (-v) or debugging (-vv) messages
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if env::var("RUST_LOG").is_err() {
        let level = match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        };
        builder.filter_module("sales_report", level);
    }
    let _ = builder.format_timestamp_millis().try_init();
}

fn run(args: &Args) -> Result<()> {
    let config = Config::from_file(&args.config)?;
    let mut job = Job::new(&config, &args.input_file);
    if let Some(output) = &args.output {
        job.output.clone_from(output);
    }
    job.range = DateRange::new(args.start, args.end);
    let outcome = sales_report::run(&job)
        .with_context(|| format!("processing {}", args.input_file.display()))?;
    match outcome {
        Outcome::Written { path, report } => {
            print!("{report}");
            println!();
            println!("Success! Report written to {}", path.display());
        }
        Outcome::NoData => println!("No data for the report"),
    }
    Ok(())
}
