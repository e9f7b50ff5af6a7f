//! Recorded store operations, one JSON object per line.
//!
//! ```text
//! {"op":"set","values":{"participant":"p1"},"silent":true}
//! {"op":"set","values":{"rt":512}}
//! {"op":"commit"}
//! {"op":"update","index":0,"values":{"correct":true}}
//! {"op":"clear"}
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use labstore_core::{Notify, Row, Store};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Op {
    Set {
        values: Row,
        #[serde(default)]
        silent: bool,
    },
    Commit,
    /// Merge `values` into the committed row at `index`.
    Update { index: usize, values: Row },
    Clear,
}

/// Counters reported after a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub operations: usize,
    pub commits: usize,
    pub clears: usize,
}

pub fn parse_ops(content: &str) -> Result<Vec<Op>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid operation on line {}", i + 1))
        })
        .collect()
}

pub fn read_ops(path: &Path) -> Result<Vec<Op>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read operation log {}", path.display()))?;
    parse_ops(&content)
}

pub fn apply(store: &mut Store, ops: Vec<Op>) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for (i, op) in ops.into_iter().enumerate() {
        debug!(step = i, ?op, "replaying");
        match op {
            Op::Set { values, silent } => {
                let notify = if silent { Notify::Suppress } else { Notify::Emit };
                store.set_with(values, notify)?;
            }
            Op::Commit => {
                store.commit()?;
                summary.commits += 1;
            }
            Op::Update { index, values } => {
                store.update(index, move |mut row| {
                    row.extend(values);
                    row
                })?;
            }
            Op::Clear => {
                store.clear()?;
                summary.clears += 1;
            }
        }
        summary.operations += 1;
    }
    Ok(summary)
}
