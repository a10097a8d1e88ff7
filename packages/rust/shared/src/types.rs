//! Core domain types: the document registry and the rehydration change record.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DocVendorError, Result};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A single registry entry. `id` names the document file (`<id>.mdx`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Document identifier, equal to the file stem.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Any other fields, carried through untouched and in their original order.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RegistryEntry {
    /// Entry with no extra fields.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// The ordered list of documents, stored as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    pub entries: Vec<RegistryEntry>,
}

impl Registry {
    /// Read a registry file. A missing file is reported as [`DocVendorError::MissingRegistry`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocVendorError::MissingRegistry {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(DocVendorError::io(path, e)),
        };

        serde_json::from_str(&content).map_err(|e| DocVendorError::registry(path, e.to_string()))
    }

    /// Write the registry as pretty-printed JSON with a trailing newline.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ChangeRecord
// ---------------------------------------------------------------------------

/// Report of the most recent rehydration run. Regenerated, never appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Paths of every document rewritten by the run.
    pub modified: Vec<String>,
    /// When the run finished.
    pub timestamp: DateTime<Utc>,
}

impl ChangeRecord {
    /// A record stamped with the current time.
    pub fn now(modified: Vec<String>) -> Self {
        Self {
            modified,
            timestamp: Utc::now(),
        }
    }

    /// Overwrite `path` with this record.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

/// Write a JSON file (pretty-printed, newline-terminated), creating parent directories.
fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(data)?;
    json.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DocVendorError::io(parent, e))?;
    }
    std::fs::write(path, json).map_err(|e| DocVendorError::io(path, e))?;
    tracing::debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}
