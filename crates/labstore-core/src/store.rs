//! The data store: staging row, committed table and derived state.
//!
//! Values accrue in `staging` through many independent `set` calls until
//! `commit` appends the row to the table. Every `set` also lands in `state`,
//! which keeps the most recently set value of every column across staging
//! and history, and survives commits.

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::events::{Emitter, EventChannel};
use crate::models::{Notify, Row, Snapshot, StoreConfig, StoreEvent, Table};

pub struct Store {
    config: StoreConfig,
    channel: Box<dyn EventChannel>,
    pub(crate) data: Table,
    pub(crate) staging: Row,
    pub(crate) state: Row,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store with default settings and no listeners.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_channel(config, Emitter::new())
    }

    /// Create an empty store announcing its events through `channel`.
    pub fn with_channel(config: StoreConfig, channel: impl EventChannel + 'static) -> Self {
        Self {
            config,
            channel: Box::new(channel),
            data: Vec::new(),
            staging: Row::new(),
            state: Row::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn emit(&self, event: StoreEvent) -> Result<()> {
        self.channel.emit(event, self)
    }

    // ─── Writing ──────────────────────────────────────────────────────────────

    /// Merge values into the staging row and the state, then emit `set`.
    pub fn set(&mut self, partial: Row) -> Result<()> {
        self.set_with(partial, Notify::Emit)
    }

    /// Set a single column.
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let mut partial = Row::new();
        partial.insert(key.into(), value.into());
        self.set(partial)
    }

    /// Merge values, emitting `set` only when `notify` asks for it.
    ///
    /// Staging and state are both updated before any listener runs.
    pub fn set_with(&mut self, partial: Row, notify: Notify) -> Result<()> {
        debug!(columns = partial.len(), ?notify, "set");
        for (key, value) in partial {
            self.state.insert(key.clone(), value.clone());
            self.staging.insert(key, value);
        }

        match notify {
            Notify::Emit => self.emit(StoreEvent::Set),
            Notify::Suppress => Ok(()),
        }
    }

    /// Move the staging row into the table and return its index.
    ///
    /// Staging starts over empty; the state is kept.
    pub fn commit(&mut self) -> Result<usize> {
        // Taking ownership detaches the row from staging entirely, nested values included.
        let row = std::mem::take(&mut self.staging);
        self.data.push(row);
        let index = self.data.len() - 1;
        debug!(index, "commit");

        self.emit(StoreEvent::Commit)?;
        Ok(index)
    }

    /// Replace the row at `index` with `transform(row)`.
    ///
    /// `index == len()` appends the transform of an empty row. Indices past
    /// the end are rejected so the table never contains holes.
    pub fn update<F>(&mut self, index: usize, transform: F) -> Result<()>
    where
        F: FnOnce(Row) -> Row,
    {
        let len = self.data.len();
        if index > len {
            return Err(StoreError::invalid(
                "update",
                format!("row index {index} is out of range for a table of {len} rows"),
            ));
        }

        if index == len {
            self.data.push(transform(Row::new()));
        } else {
            // The row is only replaced once `transform` has returned
            let updated = transform(self.data[index].clone());
            self.data[index] = updated;
        }
        debug!(index, "update");

        self.emit(StoreEvent::Update)
    }

    /// Erase table, staging and state.
    ///
    /// `clear` is emitted first, so listeners still see the old contents.
    pub fn clear(&mut self) -> Result<()> {
        self.emit(StoreEvent::Clear)?;

        debug!(rows = self.data.len(), "clear");
        self.data.clear();
        self.staging.clear();
        self.state.clear();
        Ok(())
    }

    /// Replace table and state with a persisted session. Staging is left
    /// alone and nothing is emitted.
    pub fn hydrate(&mut self, snapshot: Snapshot) {
        debug!(
            rows = snapshot.data.len(),
            columns = snapshot.state.len(),
            "hydrate"
        );
        self.data = snapshot.data;
        self.state = snapshot.state;
    }

    /// Independent copy of table and state, the inverse of `hydrate`.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            data: self.data.clone(),
            state: self.state.clone(),
        }
    }

    // ─── Reading ──────────────────────────────────────────────────────────────

    /// Most recently set value of a column.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.get(key).cloned()
    }

    /// Value of the first listed column present in the state.
    ///
    /// Presence is what counts: a column set to `0`, `false`, `""` or `null`
    /// is returned.
    pub fn get_any<S: AsRef<str>>(&self, keys: &[S]) -> Option<Value> {
        keys.iter()
            .find_map(|k| self.state.get(k.as_ref()))
            .cloned()
    }

    pub fn state(&self) -> StateView<'_> {
        StateView { state: &self.state }
    }

    pub fn state_mut(&mut self) -> StateWriter<'_> {
        StateWriter { store: self }
    }

    /// The row currently being assembled.
    pub fn staging(&self) -> &Row {
        &self.staging
    }

    /// Committed rows, read-only.
    pub fn data(&self) -> &[Row] {
        &self.data
    }

    /// Copy of a committed row.
    pub fn row(&self, index: usize) -> Option<Row> {
        self.data.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("rows", &self.data.len())
            .field("staging", &self.staging)
            .field("state", &self.state)
            .finish()
    }
}

// ─── State access ─────────────────────────────────────────────────────────────

/// Read-only view of the state.
#[derive(Debug, Clone, Copy)]
pub struct StateView<'a> {
    state: &'a Row,
}

impl<'a> StateView<'a> {
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        let state: &'a Row = self.state;
        state.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    /// Column names in the order they were first set.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        let state: &'a Row = self.state;
        state.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let state: &'a Row = self.state;
        state.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn to_row(&self) -> Row {
        self.state.clone()
    }
}

/// Write access to the state: reads come from the state, writes go
/// through `Store::set` and therefore land in staging too.
pub struct StateWriter<'a> {
    store: &'a mut Store,
}

impl StateWriter<'_> {
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.state.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.state.keys().cloned().collect()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.store.set_value(key, value)
    }

    pub fn set_many(&mut self, values: Row) -> Result<()> {
        self.store.set(values)
    }
}
