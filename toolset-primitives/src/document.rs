//! Registry document and atomic JSON persistence.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::toolset::Toolset;

/// Canonical registry document: `{ revision, toolsets: [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    revision: u64,
    toolsets: Vec<Toolset>,
}

impl RegistryDocument {
    /// Creates a document at revision zero.
    #[must_use]
    pub fn new(toolsets: Vec<Toolset>) -> Self {
        Self {
            revision: 0,
            toolsets,
        }
    }

    /// Creates a document at an explicit revision.
    #[must_use]
    pub fn with_revision(revision: u64, toolsets: Vec<Toolset>) -> Self {
        Self { revision, toolsets }
    }

    /// Returns the revision counter, incremented by every commit.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the toolsets in declaration order.
    #[must_use]
    pub fn toolsets(&self) -> &[Toolset] {
        &self.toolsets
    }

    /// Returns the first toolset declared with `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Toolset> {
        self.toolsets.iter().find(|toolset| toolset.id() == id)
    }

    /// Returns a mutable handle to the first toolset declared with `id`.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Toolset> {
        self.toolsets.iter_mut().find(|toolset| toolset.id() == id)
    }

    /// Returns `true` when `id` names a non-deprecated toolset.
    #[must_use]
    pub fn is_live(&self, id: &str) -> bool {
        self.get(id).is_some_and(Toolset::is_live)
    }

    /// Iterates over non-deprecated toolsets in declaration order.
    pub fn live(&self) -> impl Iterator<Item = &Toolset> {
        self.toolsets.iter().filter(|toolset| toolset.is_live())
    }

    /// Iterates over live toolsets that agents enable by default.
    pub fn defaults(&self) -> impl Iterator<Item = &Toolset> {
        self.live().filter(|toolset| toolset.is_default())
    }

    /// Appends a toolset.
    pub fn push(&mut self, toolset: Toolset) {
        self.toolsets.push(toolset);
    }

    /// Removes every toolset declared with `id`, returning the first one.
    pub fn remove(&mut self, id: &str) -> Option<Toolset> {
        let position = self.toolsets.iter().position(|toolset| toolset.id() == id)?;
        let removed = self.toolsets.remove(position);
        self.toolsets.retain(|toolset| toolset.id() != id);
        Some(removed)
    }

    /// Advances the revision counter.
    pub fn bump_revision(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }
}

/// Reads and parses a JSON document.
///
/// # Errors
///
/// Returns [`Error::MissingDocument`] when the file does not exist,
/// [`Error::Io`] for other read failures, and [`Error::MalformedDocument`]
/// when the content is not valid JSON.
pub fn read_json_document(path: &Path) -> Result<Value> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(Error::MissingDocument {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(Error::io(path, err)),
    };

    serde_json::from_slice(&data).map_err(|err| Error::malformed(path, err.to_string()))
}

/// Serializes `value` as pretty JSON and atomically replaces `path`.
///
/// # Errors
///
/// Returns [`Error::Serialization`] when encoding fails and [`Error::Io`]
/// when the file cannot be written.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut encoded = serde_json::to_vec_pretty(value)?;
    encoded.push(b'\n');
    write_atomic(path, &encoded)
}

/// Atomically replaces `path` with `contents`.
///
/// The content goes to a temporary file in the destination directory which is
/// then renamed over the target, so readers never observe a partial write.
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns [`Error::Io`] when the temporary file cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory).map_err(|err| Error::io(directory, err))?;

    let mut staged = NamedTempFile::new_in(directory).map_err(|err| Error::io(directory, err))?;
    staged
        .write_all(contents)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|err| Error::io(staged.path(), err))?;
    staged
        .persist(path)
        .map_err(|err| Error::io(path, err.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "document written");
    Ok(())
}
