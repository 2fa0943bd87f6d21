//! Storage root ownership and path containment
//!
//! [`StorageRoot`] owns the single directory every blob is confined to. It is created once at
//! startup and is immutable afterwards; clones share the same canonical path.
//!
//! # Security Model
//!
//! [`StorageRoot::resolve_within`] is the only way a name becomes a filesystem path. It joins
//! the name under the root, normalises the result lexically and then requires the normalised
//! path's parent to equal the canonical root exactly. Prefix checks on raw strings are never
//! used. The check runs on every call.

use crate::{FilesError, FilesResult};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Handle to the confined storage directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageRoot {
    /// Canonical absolute path of the root directory
    path: PathBuf,
}

impl StorageRoot {
    /// Ensures the storage root exists and returns a handle to it
    ///
    /// Creates `base_path` and any missing parents. Calling this on an existing directory is
    /// a no-op apart from canonicalisation.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::StorageInit`] if the directory cannot be created, exists but is
    /// not a directory, or cannot be canonicalised.
    pub fn ensure(base_path: impl AsRef<Path>) -> FilesResult<Self> {
        let base_path = base_path.as_ref();

        fs::create_dir_all(base_path).map_err(|source| FilesError::StorageInit {
            path: base_path.to_path_buf(),
            source,
        })?;

        let path = base_path
            .canonicalize()
            .map_err(|source| FilesError::StorageInit {
                path: base_path.to_path_buf(),
                source,
            })?;

        if !path.is_dir() {
            return Err(FilesError::StorageInit {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "storage root is not a directory",
                ),
            });
        }

        tracing::debug!(root = %path.display(), "storage root ready");
        Ok(Self { path })
    }

    /// Returns the canonical absolute path of the root
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves `name` to an absolute path directly inside the root
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::PathEscape`] when the name is empty, absolute, contains a `..`
    /// segment, NUL or a backslash, starts with a drive-letter prefix, or normalises to
    /// anything other than a direct child of the root.
    pub fn resolve_within(&self, name: &str) -> FilesResult<PathBuf> {
        if has_foreign_syntax(name) || has_escaping_component(name) {
            return Err(FilesError::PathEscape(name.to_owned()));
        }

        let candidate = normalize_lexically(&self.path.join(name));

        if candidate.parent() != Some(self.path.as_path()) {
            return Err(FilesError::PathEscape(name.to_owned()));
        }

        Ok(candidate)
    }
}

/// Rejects input that only has meaning on other platforms or in C strings.
fn has_foreign_syntax(name: &str) -> bool {
    if name.is_empty() || name.contains('\0') || name.contains('\\') {
        return true;
    }

    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Absolute names and `..` segments are refused even when they would land back inside.
fn has_escaping_component(name: &str) -> bool {
    Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::Prefix(_) | Component::RootDir | Component::ParentDir
        )
    })
}

/// Resolves `.` and `..` without touching the filesystem.
///
/// `..` at the filesystem root stays at the root, matching how the OS resolves it.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    normalized
}
