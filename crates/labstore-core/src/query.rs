//! Column discovery and selection over the committed table.


use serde_json::Value;
use tracing::trace;

use crate::models::{Row, Selector, SenderFilter};
use crate::store::Store;

impl Store {
    /// Canonical column order of the committed table, using the configured
    /// priority columns.
    pub fn keys(&self) -> Vec<String> {
        self.keys_with(false, &self.config().priority_columns)
    }

    /// Column names across all committed rows (and the state, if asked).
    ///
    /// Columns named in `prioritize` come first, in that order; the rest
    /// follow alphabetically.
    pub fn keys_with<S: AsRef<str>>(&self, include_state: bool, prioritize: &[S]) -> Vec<String> {
        let state = include_state.then_some(&self.state);
        discover_keys(&self.data, state, prioritize)
    }

    /// Values of one column from rows whose sender passes `filter`.
    ///
    /// Rows lacking the column yield `None`, so the result lines up with
    /// the filtered rows.
    pub fn extract(&self, column: &str, filter: impl Into<SenderFilter>) -> Vec<Option<Value>> {
        let filter = filter.into();
        self.data
            .iter()
            .filter(|row| filter.matches(row))
            .map(|row| row.get(column).cloned())
            .collect()
    }

    /// Project rows whose sender passes `filter` onto the selected columns.
    ///
    /// Each returned row is a new row holding only the selected columns the
    /// source row actually has, in selector order.
    pub fn select(&self, selector: impl Into<Selector>, filter: impl Into<SenderFilter>) -> Vec<Row> {
        let columns = match selector.into() {
            Selector::Column(column) => vec![column],
            Selector::Columns(columns) => columns,
            Selector::Predicate(predicate) => self
                .keys()
                .into_iter()
                .filter(|column| predicate(column.as_str()))
                .collect(),
        };
        let filter = filter.into();

        self.data
            .iter()
            .filter(|row| filter.matches(row))
            .map(|row| pick(row, &columns))
            .collect()
    }

    /// The table without underscore-prefixed columns.
    pub fn clean_data(&self) -> Vec<Row> {
        clean_rows(&self.data)
    }
}

/// Sorted, de-duplicated keys with the prioritized ones moved to the front.
pub fn discover_keys<S: AsRef<str>>(rows: &[Row], state: Option<&Row>, prioritize: &[S]) -> Vec<String> {
    // Ordered by UTF-16 code units, so astral-plane names sort before U+E000..U+FFFF
    let mut unique: Vec<&str> = rows
        .iter()
        .chain(state)
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();
    unique.sort_unstable_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));
    unique.dedup();

    let mut keys: Vec<String> = Vec::with_capacity(unique.len());
    for column in prioritize {
        let column: &str = column.as_ref();
        if unique.iter().any(|u| *u == column) && !keys.iter().any(|k| k == column) {
            keys.push(column.to_string());
        }
    }
    let prioritized = keys.len();
    let remaining: Vec<String> = unique
        .into_iter()
        .filter(|column| !keys.iter().any(|k| k == column))
        .map(str::to_string)
        .collect();
    keys.extend(remaining);

    trace!(columns = keys.len(), prioritized, "discovered keys");
    keys
}

/// Copies of `rows` without the columns whose names start with `_`.
pub fn clean_rows(rows: &[Row]) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            row.iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .collect()
}

fn pick(row: &Row, columns: &[String]) -> Row {
    let mut picked = Row::new();
    for column in columns {
        if let Some(value) = row.get(column) {
            picked.insert(column.clone(), value.clone());
        }
    }
    picked
}
