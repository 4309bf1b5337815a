use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::Subtype;
use crate::error::Result;

/// The independently persisted slices of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Currency,
    Items,
    ClientInfo,
    PaymentTerms,
}

impl DraftField {
    pub fn key(&self) -> &'static str {
        match self {
            DraftField::Currency => "currency",
            DraftField::Items => "items",
            DraftField::ClientInfo => "clientInfo",
            DraftField::PaymentTerms => "paymentTerms",
        }
    }
}

/// Key-value storage scoped by invoice subtype. Values are serialized JSON.
pub trait DraftStore {
    fn get(&self, subtype: Subtype, field: DraftField) -> Result<Option<String>>;
    fn set(&self, subtype: Subtype, field: DraftField, value: &str) -> Result<()>;
    /// Forget every slice stored for `subtype`.
    fn clear(&self, subtype: Subtype) -> Result<()>;
}

/// Stores each slice as `<root>/<subtype>/<field>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, subtype: Subtype, field: DraftField) -> PathBuf {
        self.root
            .join(subtype.as_str())
            .join(format!("{}.json", field.key()))
    }
}

impl DraftStore for FileStore {
    fn get(&self, subtype: Subtype, field: DraftField) -> Result<Option<String>> {
        let path = self.path(subtype, field);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, subtype: Subtype, field: DraftField, value: &str) -> Result<()> {
        let path = self.path(subtype, field);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, value)?;
        Ok(())
    }

    fn clear(&self, subtype: Subtype) -> Result<()> {
        let dir = self.root.join(subtype.as_str());
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<(Subtype, DraftField), String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(Subtype, DraftField), String>> {
        // A poisoned map still holds usable data.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DraftStore for MemoryStore {
    fn get(&self, subtype: Subtype, field: DraftField) -> Result<Option<String>> {
        Ok(self.lock().get(&(subtype, field)).cloned())
    }

    fn set(&self, subtype: Subtype, field: DraftField, value: &str) -> Result<()> {
        self.lock().insert((subtype, field), value.to_string());
        Ok(())
    }

    fn clear(&self, subtype: Subtype) -> Result<()> {
        self.lock().retain(|(s, _), _| *s != subtype);
        Ok(())
    }
}
