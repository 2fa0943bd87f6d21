//! Stash File Storage
//!
//! This crate provides the storage boundary for the Stash upload service: mapping untrusted
//! client-supplied names onto a single confined directory, generating collision-free stored
//! names, and streaming blob bytes in and out without materialising whole files in memory.
//!
//! ## Design Principles
//!
//! - Every blob lives directly inside one storage root (no nested directories)
//! - Stored names are server-generated; clients only influence the extension
//! - Every resolution re-runs the containment check against the canonical root
//! - Content type detection is best-effort and pluggable
//! - No in-process locking: the filesystem is the only shared resource
//!
//! ## Storage Layout
//!
//! ```text
//! <storage_root>/           # default: <system temp dir>/uploads
//! ├── 3f2b9c0e5d7a4e1f9b8c6d5e4f3a2b1c.pdf
//! ├── 9a8b7c6d5e4f4a3b8c2d1e0f9a8b7c6d
//! └── ...
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use stash_files::{BlobStore, StorageRoot};
//! use std::io::Read;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = StorageRoot::ensure(std::env::temp_dir().join("uploads"))?;
//! let store = BlobStore::new(root);
//!
//! let name = store.put(&b"hello"[..], Some("report.final.pdf"))?;
//! let mut blob = store.get(name.as_str())?;
//!
//! let mut content = String::new();
//! blob.read_to_string(&mut content)?;
//! assert_eq!(content, "hello");
//! # Ok(())
//! # }
//! ```

mod name;
mod root;
mod sniff;
mod store;

pub use name::{extension_of, StoredName};
pub use root::StorageRoot;
pub use sniff::{ContentSniffer, DefaultSniffer, OCTET_STREAM};
pub use store::{BlobHandle, BlobStore};

use std::path::PathBuf;

/// Errors that can occur during storage operations
///
/// Client-class variants ([`FilesError::EmptyInput`], [`FilesError::PathEscape`],
/// [`FilesError::NotFound`]) carry only client-supplied names in their messages.
/// Absolute paths appear only in server-class variants, which callers log but do not echo.
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// The upload stream produced no bytes
    #[error("Upload is empty")]
    EmptyInput,

    /// A name resolved outside the storage root (traversal attempt or foreign path syntax)
    #[error("Path escapes the storage root: {0}")]
    PathEscape(String),

    /// A name resolved inside the root but no readable blob exists there
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Writing blob bytes to disk failed
    #[error("Failed to write blob {name}: {source}")]
    StorageWrite {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The storage root could not be created or opened
    #[error("Failed to initialise storage root {}: {source}", path.display())]
    StorageInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A server-generated name failed containment; indicates a bug, not a client error
    #[error("Generated name failed containment check: {0}")]
    InternalPath(String),
}

impl FilesError {
    /// Returns true for failures caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FilesError::EmptyInput | FilesError::PathEscape(_) | FilesError::NotFound(_)
        )
    }
}

/// Result type for storage operations
pub type FilesResult<T> = Result<T, FilesError>;
