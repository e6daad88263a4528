use serde::{de::value::MapDeserializer, Deserialize};
use serde_with::DeserializeFromStr;

use std::{collections::BTreeMap, fmt::Display, fs, path::Path, str::FromStr};

use crate::error::{Error, Result};

/// Binds each logical column role to the column name used in the input file.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ColumnMapping {
    pub date: String,
    pub quantity: String,
    pub price: String,
    pub manager: String,
    pub product_name: String,
    /// Column created by the report run to hold `quantity * price`.
    pub total_sum: String,
}

impl ColumnMapping {
    /// Returns the columns that must exist in the input, in the order they
    /// are checked.
    #[must_use]
    pub fn required(&self) -> [&str; 5] {
        [
            &self.date,
            &self.quantity,
            &self.price,
            &self.manager,
            &self.product_name,
        ]
    }
}

/// The single-byte delimiter used for delimited-text input.
///
/// Parses from a one-character ASCII string. The two-character escape `\t`
/// stands for a tab.
#[derive(Clone, Copy, Debug, DeserializeFromStr, Eq, PartialEq)]
pub struct Separator(u8);

impl Separator {
    #[must_use]
    pub fn byte(self) -> u8 {
        self.0
    }
}

impl Default for Separator {
    fn default() -> Self {
        Self(b',')
    }
}

impl Display for Separator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            b'\t' => f.write_str("\\t"),
            b => write!(f, "{}", char::from(b)),
        }
    }
}

impl FromStr for Separator {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "\\t" {
            return Ok(Self(b'\t'));
        }
        match s.as_bytes() {
            [b] if b.is_ascii() => Ok(Self(*b)),
            _ => Err(Error::Configuration(format!(
                "separator must be a single ASCII character, got {s:?}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Settings {
    csv_separator: Separator,
}

/// Report settings read from an INI-style configuration file.
///
/// The file needs a `[SETTINGS]` section with `csv_separator`, and a
/// `[COLUMNS]` section naming the input columns:
///
/// ```ini
/// [SETTINGS]
/// csv_separator = ;
///
/// [COLUMNS]
/// date = Date
/// quantity = Qty
/// price = Price
/// manager = Manager
/// product_name = Product
/// total_sum = Total
/// ```
///
/// Lines starting with `#` or `;` are comments. Keys not listed above are
/// ignored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub separator: Separator,
    pub columns: ColumnMapping,
}

impl Config {
    /// Reads configuration from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file cannot be read, is not
    /// valid INI, or lacks a required section or key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("can't find or read {}: {e}", path.display()))
        })?;
        text.parse::<Self>().map_err(|e| match e {
            Error::Configuration(msg) => {
                Error::Configuration(format!("reading {}: {msg}", path.display()))
            }
            other => other,
        })
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut sections = parse_ini(s)?;
        if sections.is_empty() {
            return Err(Error::Configuration("no sections found".into()));
        }
        let settings: Settings = deserialize_section(&mut sections, "SETTINGS")?;
        let columns: ColumnMapping = deserialize_section(&mut sections, "COLUMNS")?;
        Ok(Self {
            separator: settings.csv_separator,
            columns,
        })
    }
}

type Section = BTreeMap<String, String>;

fn parse_ini(text: &str) -> Result<BTreeMap<String, Section>> {
    let mut sections: BTreeMap<String, Section> = BTreeMap::new();
    let mut current: Option<String> = None;
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        let Some(section) = &current else {
            return Err(Error::Configuration(format!(
                "line {}: key outside of any section: {line}",
                idx + 1
            )));
        };
        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::Configuration(format!(
                "line {}: bad line format (missing =): {line}",
                idx + 1
            )));
        };
        let key = key.trim().to_string();
        let entries = sections.entry(section.clone()).or_default();
        if entries.insert(key.clone(), value.trim().to_string()).is_some() {
            return Err(Error::Configuration(format!(
                "line {}: duplicate key '{key}' in [{section}]",
                idx + 1
            )));
        }
    }
    Ok(sections)
}

fn deserialize_section<T>(sections: &mut BTreeMap<String, Section>, name: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let section = sections
        .remove(name)
        .ok_or_else(|| Error::Configuration(format!("missing section [{name}]")))?;
    let de: MapDeserializer<'_, _, serde::de::value::Error> =
        MapDeserializer::new(section.into_iter());
    T::deserialize(de).map_err(|e| Error::Configuration(format!("[{name}]: {e}")))
}
