//! Durable storage for the value table.
//!
//! The document is a JSON object mapping each state key in its textual form
//! to `{"hit": .., "stand": ..}`. Reading reports an absent document as
//! `Ok(None)`; every other failure is an error that the agent turns into an
//! empty table.

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::rl::{ActionValues, QTable, StateKey, StateKeyParseError};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("policy store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("policy document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid state key '{key}': {source}")]
    BadKey {
        key: String,
        #[source]
        source: StateKeyParseError,
    },
}

/// Result of restoring a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded { entries: usize },
    Missing,
    Corrupt,
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded { .. })
    }
}

pub trait PolicyStore {
    /// Read the stored table, or `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<QTable>, StoreError>;

    /// Replace the stored table. Either the whole table lands or the
    /// previous document is left in place.
    fn write(&mut self, table: &QTable) -> Result<(), StoreError>;

    /// Where the table lives, for log output.
    fn describe(&self) -> String;
}

pub fn encode(table: &QTable) -> Result<String, StoreError> {
    let document: BTreeMap<String, ActionValues> = table
        .iter()
        .map(|(key, values)| (key.to_string(), *values))
        .collect();
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Any unparsable key rejects the whole document.
pub fn decode(text: &str) -> Result<QTable, StoreError> {
    let document: BTreeMap<String, ActionValues> = serde_json::from_str(text)?;
    document
        .into_iter()
        .map(|(key, values)| {
            key.parse::<StateKey>()
                .map(|state| (state, values))
                .map_err(|source| StoreError::BadKey { key, source })
        })
        .collect()
}
