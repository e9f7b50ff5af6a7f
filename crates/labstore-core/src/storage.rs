//! File helpers: YAML store config and JSON session snapshots.
//!
//! The store itself never touches the file system; callers that persist a
//! session decide where and when these are used.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::models::{Blob, Snapshot, StoreConfig};

// ─── Directory helpers ────────────────────────────────────────────────────────

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

// ─── YAML config I/O ─────────────────────────────────────────────────────────

pub fn save_yaml<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let content = serde_yaml::to_string(data)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T>
where
    T: Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    // An empty document means "all defaults".
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// Load a store config; a missing file gives the defaults.
pub fn load_config(path: &Path) -> Result<StoreConfig> {
    let config: StoreConfig = load_yaml(path)?;
    info!(path = %path.display(), "loaded store config");
    Ok(config)
}

pub fn save_config(path: &Path, config: &StoreConfig) -> Result<()> {
    ensure_parent(path)?;
    save_yaml(path, config)
}

// ─── JSON snapshot I/O ───────────────────────────────────────────────────────

pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    ensure_parent(path)?;
    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, content)?;
    info!(
        path = %path.display(),
        rows = snapshot.data.len(),
        "saved snapshot"
    );
    Ok(())
}

/// Read a snapshot written by `save_snapshot`. Missing `data` or `state`
/// fields default to empty.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    info!(
        path = %path.display(),
        rows = snapshot.data.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

/// Write an exported blob's bytes to `path`.
pub fn write_blob(path: &Path, blob: &Blob) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, &blob.bytes)?;
    Ok(())
}
