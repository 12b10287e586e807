use super::{PolicyStore, StoreError, decode, encode};
use crate::rl::QTable;

/// In-process store holding the encoded document, so a round trip goes
/// through the same text format as the file store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    document: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
        }
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }
}

impl PolicyStore for MemoryStore {
    fn read(&self) -> Result<Option<QTable>, StoreError> {
        self.document.as_deref().map(decode).transpose()
    }

    fn write(&mut self, table: &QTable) -> Result<(), StoreError> {
        self.document = Some(encode(table)?);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
