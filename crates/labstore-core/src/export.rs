//! Exporters: CSV, JSON and JSONL text, MIME-typed blobs, filename suggestions.
//!
//! Every exporter takes a `clean` flag choosing between `clean_data()` and
//! the raw table. CSV columns follow `keys()`; JSON objects keep each row's
//! own key order.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::models::{Blob, Download, FileFormat, Row};
use crate::store::Store;

impl Store {
    fn rows(&self, clean: bool) -> Cow<'_, [Row]> {
        if clean {
            Cow::Owned(self.clean_data())
        } else {
            Cow::Borrowed(&self.data)
        }
    }

    /// The table as a single JSON array.
    pub fn export_json(&self, clean: bool) -> Result<String> {
        Ok(serde_json::to_string(&self.rows(clean))?)
    }

    /// One JSON object per line, without a trailing newline.
    pub fn export_jsonl(&self, clean: bool) -> Result<String> {
        let lines = self
            .rows(clean)
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }

    /// The table as CSV, columns in `keys()` order.
    ///
    /// With `clean`, underscore-prefixed columns are left out of both the
    /// header and the rows.
    pub fn export_csv(&self, separator: &str, clean: bool) -> String {
        let columns: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|k| !clean || !k.starts_with('_'))
            .collect();
        to_csv(&self.rows(clean), &columns, separator)
    }

    /// Export in `format` and tag the text with its MIME type.
    ///
    /// CSV uses the configured separator.
    pub fn export_blob(&self, format: FileFormat, clean: bool) -> Result<Blob> {
        let text = match format {
            FileFormat::Csv => self.export_csv(&self.config().csv_separator, clean),
            FileFormat::Json => self.export_json(clean)?,
            FileFormat::JsonL => self.export_jsonl(clean)?,
        };
        debug!(%format, bytes = text.len(), clean, "exported blob");

        Ok(Blob {
            bytes: text.into_bytes(),
            mime: format.mime(),
        })
    }

    /// Like `export_blob`, with the format given by name (`csv`, `json`, `jsonl`).
    pub fn export_blob_str(&self, format: &str, clean: bool) -> Result<Blob> {
        self.export_blob(format.parse()?, clean)
    }

    /// First available value among the configured id columns.
    pub fn guess_id(&self) -> Option<Value> {
        self.guess_id_from(&self.config().id_columns)
    }

    pub fn guess_id_from<S: AsRef<str>>(&self, columns: &[S]) -> Option<Value> {
        self.get_any(columns)
    }

    /// Suggested filename: `prefix--[id--]<date>[.extension]`.
    ///
    /// The id comes from user data, so path separators and control
    /// characters in it are replaced with `_`.
    pub fn make_filename(&self, prefix: &str, extension: Option<&str>) -> String {
        self.make_filename_at(prefix, extension, &Local::now())
    }

    /// `make_filename` with an explicit clock reading.
    pub fn make_filename_at<Tz: TimeZone>(
        &self,
        prefix: &str,
        extension: Option<&str>,
        now: &DateTime<Tz>,
    ) -> String
    where
        Tz::Offset: fmt::Display,
    {
        let mut name = format!("{prefix}--");
        if let Some(id) = self.guess_id().filter(is_truthy) {
            name.push_str(&filename_segment(&render_cell(&id)));
            name.push_str("--");
        }
        name.push_str(&date_string(now));
        if let Some(ext) = extension.filter(|e| !e.is_empty()) {
            name.push('.');
            name.push_str(ext);
        }
        name
    }

    /// Blob plus suggested `data--...` filename, ready for a download collaborator.
    pub fn download(&self, format: FileFormat) -> Result<Download> {
        let blob = self.export_blob(format, self.config().clean)?;
        Ok(Download {
            filename: self.make_filename("data", Some(format.extension())),
            blob,
        })
    }
}

// ─── CSV ──────────────────────────────────────────────────────────────────────

/// Render rows as CSV with the given columns. Lines are `\n`-separated,
/// without a trailing newline.
pub fn to_csv(rows: &[Row], columns: &[String], separator: &str) -> String {
    let header = columns
        .iter()
        .map(|c| escape_field(c, separator))
        .collect::<Vec<_>>()
        .join(separator);

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header);
    for row in rows {
        let line = columns
            .iter()
            .map(|c| match row.get(c) {
                Some(value) => escape_field(&render_cell(value), separator),
                None => String::new(),
            })
            .collect::<Vec<_>>()
            .join(separator);
        lines.push(line);
    }
    lines.join("\n")
}

/// Quote a field only if it contains the separator, a quote or a line break.
pub fn escape_field(field: &str, separator: &str) -> String {
    let needs_quotes = (!separator.is_empty() && field.contains(separator))
        || field.contains(['"', '\n', '\r']);
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Plain-text rendering of a value: strings as-is, `null` as empty,
/// numbers and booleans by their JSON text, arrays and objects as compact JSON.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn filename_segment(text: &str) -> String {
    text.chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect()
}

fn date_string<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format("%Y-%m-%d--%H:%M:%S").to_string()
}
