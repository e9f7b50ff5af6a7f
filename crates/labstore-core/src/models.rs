//! Data models for labstore.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};

/// One row of data: column name to value, in insertion order.
pub type Row = serde_json::Map<String, Value>;

/// The committed history, in commit order.
pub type Table = Vec<Row>;

/// Columns that likely hold a participant identifier, in order of preference.
pub const DEFAULT_ID_COLUMNS: &[&str] = &["id", "participant", "participant_id"];

/// Columns moved to the front of the canonical column order.
pub const DEFAULT_METADATA_COLUMNS: &[&str] = &[
    "id",
    "participant",
    "participant_id",
    "sender",
    "sender_type",
    "sender_id",
    "timestamp",
    "meta",
];

/// Convert a timestamp into the value stored in a row (RFC 3339, millisecond precision).
pub fn timestamp_value<Tz: TimeZone>(at: &DateTime<Tz>) -> Value
where
    Tz::Offset: fmt::Display,
{
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Settings that shape column ordering, id discovery and exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Columns brought to the front of `keys()`, in this order
    pub priority_columns: Vec<String>,
    /// Columns checked, in order, when guessing a participant id
    pub id_columns: Vec<String>,
    /// Column separator for CSV blobs and downloads (default: ",")
    pub csv_separator: String,
    /// Omit underscore-prefixed columns from blobs and downloads (default: true)
    pub clean: bool,
    /// Filename prefix used by callers that don't supply one (default: "study")
    pub filename_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            priority_columns: DEFAULT_METADATA_COLUMNS.iter().map(|c| c.to_string()).collect(),
            id_columns: DEFAULT_ID_COLUMNS.iter().map(|c| c.to_string()).collect(),
            csv_separator: ",".to_string(),
            clean: true,
            filename_prefix: "study".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn with_priority_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_csv_separator(mut self, separator: impl Into<String>) -> Self {
        self.csv_separator = separator.into();
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }
}

/// Persisted session: committed rows plus the derived state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub data: Table,
    pub state: Row,
}

/// Notifications announced through the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    Set,
    Commit,
    Update,
    Clear,
}

impl StoreEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreEvent::Set => "set",
            StoreEvent::Commit => "commit",
            StoreEvent::Update => "update",
            StoreEvent::Clear => "clear",
        }
    }
}

impl fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a `set` announces itself on the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notify {
    #[default]
    Emit,
    Suppress,
}

/// Filter applied to the `sender` column of each row.
///
/// Rows without a string `sender` are matched as if it were empty.
#[derive(Debug, Clone, Default)]
pub enum SenderFilter {
    /// Keep every row.
    #[default]
    Any,
    /// Keep rows whose sender equals the given string exactly.
    Exact(String),
    /// Keep rows whose sender matches the regular expression.
    Pattern(Regex),
}

impl SenderFilter {
    /// Compile a regular expression filter.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(SenderFilter::Pattern)
            .map_err(|e| StoreError::invalid("sender filter", e.to_string()))
    }

    pub fn matches(&self, row: &Row) -> bool {
        let sender = row.get("sender").and_then(Value::as_str).unwrap_or("");
        match self {
            SenderFilter::Any => true,
            SenderFilter::Exact(expected) => sender == expected,
            SenderFilter::Pattern(re) => re.is_match(sender),
        }
    }
}

impl From<&str> for SenderFilter {
    fn from(sender: &str) -> Self {
        SenderFilter::Exact(sender.to_string())
    }
}

impl From<String> for SenderFilter {
    fn from(sender: String) -> Self {
        SenderFilter::Exact(sender)
    }
}

impl From<Regex> for SenderFilter {
    fn from(re: Regex) -> Self {
        SenderFilter::Pattern(re)
    }
}

/// Column selection for `Store::select`.
pub enum Selector {
    Column(String),
    Columns(Vec<String>),
    /// Evaluated against the discovered column names.
    Predicate(Box<dyn Fn(&str) -> bool>),
}

impl Selector {
    pub fn predicate(f: impl Fn(&str) -> bool + 'static) -> Self {
        Selector::Predicate(Box::new(f))
    }

    /// Parse a textual selector: `/regex/`, a comma-separated list, or one column.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Some(pattern) = text
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            let re = Regex::new(pattern).map_err(|e| StoreError::invalid("select", e.to_string()))?;
            return Ok(Selector::predicate(move |column| re.is_match(column)));
        }

        let mut columns: Vec<String> = text
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        match columns.len() {
            0 => Err(StoreError::invalid(
                "select",
                "expected a column name, a comma-separated list of columns, or a /regex/",
            )),
            1 => Ok(Selector::Column(columns.swap_remove(0))),
            _ => Ok(Selector::Columns(columns)),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Column(c) => f.debug_tuple("Column").field(c).finish(),
            Selector::Columns(cs) => f.debug_tuple("Columns").field(cs).finish(),
            Selector::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Selector {
    fn from(column: &str) -> Self {
        Selector::Column(column.to_string())
    }
}

impl From<String> for Selector {
    fn from(column: String) -> Self {
        Selector::Column(column)
    }
}

impl From<Vec<String>> for Selector {
    fn from(columns: Vec<String>) -> Self {
        Selector::Columns(columns)
    }
}

impl From<&[&str]> for Selector {
    fn from(columns: &[&str]) -> Self {
        Selector::Columns(columns.iter().map(|c| c.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Selector {
    fn from(columns: [&str; N]) -> Self {
        Selector::Columns(columns.iter().map(|c| c.to_string()).collect())
    }
}

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    JsonL,
}

impl FileFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            FileFormat::Csv => "text/csv",
            FileFormat::Json => "application/json",
            FileFormat::JsonL => "application/jsonl",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::JsonL => "jsonl",
        }
    }
}

impl FromStr for FileFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            "jsonl" => Ok(FileFormat::JsonL),
            other => Err(StoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Exported bytes tagged with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl Blob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A blob plus the filename suggested for saving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub blob: Blob,
}
