#![doc = include_str!("../README.md")]

pub mod aggregate;
pub mod amount;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod table;
pub mod validate;

pub use amount::Amount;
pub use config::{ColumnMapping, Config, Separator};
pub use error::{Error, ErrorKind, Result};
pub use filter::DateRange;
pub use pipeline::{run, Job, Outcome};
pub use report::{Report, Totals};
pub use table::{Cell, Table};
