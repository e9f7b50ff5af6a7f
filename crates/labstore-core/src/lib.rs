//! labstore-core: tabular data-accrual store for experiment runners.
//!
//! Values trickle into a staging row through `set`, `commit` moves the row
//! into the append-only table, and the state keeps the latest value of every
//! column. Queries and exports read the committed table.

pub mod error;
pub mod events;
pub mod export;
pub mod models;
pub mod query;
pub mod storage;
pub mod store;

pub use error::{ListenerError, Result, StoreError};
pub use events::{Emitter, EventChannel};
pub use models::{
    timestamp_value, Blob, Download, FileFormat, Notify, Row, Selector, SenderFilter, Snapshot,
    StoreConfig, StoreEvent, Table, DEFAULT_ID_COLUMNS, DEFAULT_METADATA_COLUMNS,
};
pub use store::{StateView, StateWriter, Store};
