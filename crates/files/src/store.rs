//! Blob store built on a [`StorageRoot`]
//!
//! [`BlobStore`] implements the two storage operations the HTTP layer needs:
//!
//! - [`BlobStore::put`] streams bytes from any [`Read`] into a freshly named file
//! - [`BlobStore::get`] opens a stored blob and reports its content type
//!
//! # Implementation Notes
//!
//! - I/O is blocking and sequential per call; async callers run it on a blocking pool
//! - Bytes are copied through fixed-size buffers, never collected into one allocation
//! - File handles are owned values, so every exit path closes them
//! - The store holds no mutable state; clones are cheap and share the sniffer

use crate::root::StorageRoot;
use crate::sniff::{ContentSniffer, DefaultSniffer, OCTET_STREAM, SNIFF_LEN};
use crate::{FilesError, FilesResult, StoredName};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

/// Size of the first read, which doubles as the empty-upload probe
const FIRST_CHUNK_LEN: usize = 64 * 1024;

/// Confined blob storage
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: StorageRoot,
    sniffer: Arc<dyn ContentSniffer>,
}

impl BlobStore {
    /// Creates a store over `root` using the [`DefaultSniffer`]
    pub fn new(root: StorageRoot) -> Self {
        Self::with_sniffer(root, DefaultSniffer)
    }

    /// Creates a store over `root` with a custom content type sniffer
    pub fn with_sniffer(root: StorageRoot, sniffer: impl ContentSniffer + 'static) -> Self {
        Self {
            root,
            sniffer: Arc::new(sniffer),
        }
    }

    /// Returns the storage root this store writes into
    #[must_use]
    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// Stores everything `reader` yields under a newly generated name
    ///
    /// The extension of `original_name` (from its last `.`) is appended to the random token.
    /// A file with the same name is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `reader` yields no bytes ([`FilesError::EmptyInput`]); nothing is written
    /// - the generated name fails containment ([`FilesError::InternalPath`])
    /// - reading the input or writing the file fails ([`FilesError::StorageWrite`]); a
    ///   partially written file may remain
    pub fn put<R: Read>(
        &self,
        mut reader: R,
        original_name: Option<&str>,
    ) -> FilesResult<StoredName> {
        let name = StoredName::generate(original_name);

        let mut first_chunk = vec![0u8; FIRST_CHUNK_LEN];
        let first_len = read_chunk(&mut reader, &mut first_chunk)
            .map_err(|source| write_error(&name, source))?;
        if first_len == 0 {
            return Err(FilesError::EmptyInput);
        }

        let destination = self.root.resolve_within(name.as_str()).map_err(|_| {
            tracing::error!(name = %name, "generated name escaped the storage root");
            FilesError::InternalPath(name.to_string())
        })?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&destination)
            .map_err(|source| write_error(&name, source))?;

        file.write_all(&first_chunk[..first_len])
            .map_err(|source| write_error(&name, source))?;
        drop(first_chunk);

        let rest = io::copy(&mut reader, &mut file).map_err(|source| write_error(&name, source))?;
        file.flush().map_err(|source| write_error(&name, source))?;

        tracing::debug!(
            name = %name,
            size_bytes = first_len as u64 + rest,
            "stored blob"
        );
        Ok(name)
    }

    /// Opens the blob stored under `stored_name`
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the name resolves outside the root ([`FilesError::PathEscape`])
    /// - nothing readable is stored under the name ([`FilesError::NotFound`])
    pub fn get(&self, stored_name: &str) -> FilesResult<BlobHandle> {
        let path = self.root.resolve_within(stored_name).map_err(|e| {
            tracing::warn!(name = stored_name, "rejected path escape attempt");
            e
        })?;

        let not_found = |_: io::Error| FilesError::NotFound(stored_name.to_owned());

        let mut file = File::open(&path).map_err(not_found)?;
        let metadata = file.metadata().map_err(not_found)?;
        if !metadata.is_file() {
            return Err(FilesError::NotFound(stored_name.to_owned()));
        }

        let mut head = Vec::with_capacity(SNIFF_LEN);
        (&mut file)
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .map_err(not_found)?;
        file.seek(SeekFrom::Start(0)).map_err(not_found)?;

        let content_type = self
            .sniffer
            .sniff(stored_name, &head)
            .filter(|mime| !mime.trim().is_empty())
            .unwrap_or_else(|| OCTET_STREAM.to_owned());

        tracing::debug!(name = stored_name, content_type = %content_type, "opened blob");
        Ok(BlobHandle {
            file,
            content_type,
            stored_name: stored_name.to_owned(),
            len: metadata.len(),
        })
    }
}

/// An opened blob, read lazily from disk
///
/// Reading consumes the handle's position; a fresh [`BlobStore::get`] is needed to read again.
#[derive(Debug)]
pub struct BlobHandle {
    file: File,
    content_type: String,
    stored_name: String,
    len: u64,
}

impl BlobHandle {
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Size of the blob in bytes when it was opened
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Releases the underlying file for callers that stream it themselves
    pub fn into_file(self) -> File {
        self.file
    }
}

impl Read for BlobHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Reads once, retrying on `Interrupted`.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

fn write_error(name: &StoredName, source: io::Error) -> FilesError {
    FilesError::StorageWrite {
        name: name.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::fs;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, BlobStore) {
        let temp = TempDir::new().unwrap();
        let root = StorageRoot::ensure(temp.path().join("uploads")).unwrap();
        (temp, BlobStore::new(root))
    }

    fn stored_files(store: &BlobStore) -> Vec<String> {
        fs::read_dir(store.root().path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn read_all(mut blob: BlobHandle) -> Vec<u8> {
        let mut content = Vec::new();
        blob.read_to_end(&mut content).unwrap();
        content
    }

    /// Yields `data` in one read, then fails
    struct FailingReader {
        data: Option<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                None => Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
            }
        }
    }

    /// Fails with `Interrupted` before every successful read
    struct InterruptingReader {
        inner: io::Cursor<Vec<u8>>,
        interrupt_next: bool,
    }

    impl Read for InterruptingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if std::mem::replace(&mut self.interrupt_next, false) {
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.interrupt_next = true;
            self.inner.read(buf)
        }
    }

    #[derive(Debug)]
    struct FixedSniffer(Option<&'static str>);

    impl ContentSniffer for FixedSniffer {
        fn sniff(&self, _name: &str, _head: &[u8]) -> Option<String> {
            self.0.map(str::to_owned)
        }
    }

    #[test]
    fn test_put_and_get_roundtrip() {
        let (_temp, store) = test_store();
        let content: Vec<u8> = (0..=255).collect();

        let name = store.put(content.as_slice(), Some("binary.dat")).unwrap();
        let blob = store.get(name.as_str()).unwrap();

        assert!(!blob.content_type().is_empty());
        assert_eq!(blob.stored_name(), name.as_str());
        assert_eq!(blob.len(), 256);
        assert_eq!(read_all(blob), content);
    }

    #[test]
    fn test_report_pdf_scenario() {
        let (_temp, store) = test_store();

        let name = store.put(&b"hello"[..], Some("report.final.pdf")).unwrap();

        assert_eq!(name.as_str().len(), 32 + ".pdf".len());
        assert!(name.as_str().ends_with(".pdf"));
        assert!(!name.as_str()[..32].contains('.'));

        let blob = store.get(name.as_str()).unwrap();
        assert!(matches!(
            blob.content_type(),
            "application/pdf" | "application/octet-stream"
        ));
        assert_eq!(read_all(blob), b"hello");
    }

    #[test]
    fn test_put_without_original_name_is_bare_token() {
        let (_temp, store) = test_store();

        let name = store.put(&b"x"[..], None).unwrap();

        assert_eq!(name.as_str().len(), 32);
        assert!(!name.as_str().contains('.'));
        assert_eq!(read_all(store.get(name.as_str()).unwrap()), b"x");
    }

    #[test]
    fn test_put_empty_is_rejected_without_writing() {
        let (_temp, store) = test_store();

        let result = store.put(io::empty(), Some("empty.txt"));

        assert!(matches!(result, Err(FilesError::EmptyInput)));
        assert!(stored_files(&store).is_empty());
    }

    #[test]
    fn test_put_writes_directly_into_root() {
        let (_temp, store) = test_store();

        let name = store.put(&b"flat"[..], Some("notes.txt")).unwrap();

        assert_eq!(stored_files(&store), vec![name.into_string()]);
    }

    #[test]
    fn test_put_streams_large_input() {
        let (_temp, store) = test_store();
        let size = 5 * 1024 * 1024 + 17;

        let name = store
            .put(io::repeat(0xAB).take(size), Some("big.bin"))
            .unwrap();
        let blob = store.get(name.as_str()).unwrap();

        assert_eq!(blob.len(), size);
        let content = read_all(blob);
        assert_eq!(content.len() as u64, size);
        assert!(content.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_put_retries_interrupted_reads() {
        let (_temp, store) = test_store();
        let reader = InterruptingReader {
            inner: io::Cursor::new(b"interrupted but whole".to_vec()),
            interrupt_next: true,
        };

        let name = store.put(reader, Some("i.txt")).unwrap();

        assert_eq!(read_all(store.get(name.as_str()).unwrap()), b"interrupted but whole");
    }

    #[test]
    fn test_put_reports_read_failure_as_write_error() {
        let (_temp, store) = test_store();
        let reader = FailingReader {
            data: Some(b"partial".to_vec()),
        };

        let err = store.put(reader, Some("upload.bin")).unwrap_err();

        match &err {
            FilesError::StorageWrite { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("expected StorageWrite, got {other:?}"),
        }
        assert!(err.source().is_some());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_put_hostile_extension_is_internal_error() {
        let (temp, store) = test_store();

        let result = store.put(&b"payload"[..], Some("x.a/../../../escaped"));

        assert!(matches!(result, Err(FilesError::InternalPath(_))));
        assert!(stored_files(&store).is_empty());
        assert!(!temp.path().join("escaped").exists());
    }

    #[test]
    fn test_concurrent_puts_do_not_collide() {
        let (_temp, store) = test_store();

        let (first, second) = std::thread::scope(|scope| {
            let a = scope.spawn(|| store.put(&b"first upload"[..], Some("a.txt")).unwrap());
            let b = scope.spawn(|| store.put(&b"second upload"[..], Some("a.txt")).unwrap());
            (a.join().unwrap(), b.join().unwrap())
        });

        assert_ne!(first, second);
        assert_eq!(read_all(store.get(first.as_str()).unwrap()), b"first upload");
        assert_eq!(read_all(store.get(second.as_str()).unwrap()), b"second upload");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_temp, store) = test_store();

        let result = store.get("0123456789abcdef0123456789abcdef.pdf");

        assert!(matches!(result, Err(FilesError::NotFound(_))));
    }

    #[test]
    fn test_get_traversal_is_path_escape() {
        let (temp, store) = test_store();
        fs::write(temp.path().join("secret.txt"), b"outside").unwrap();

        for name in ["../../../etc/passwd", "../secret.txt", "/etc/passwd"] {
            let result = store.get(name);
            assert!(
                matches!(result, Err(FilesError::PathEscape(_))),
                "expected escape for {name}"
            );
        }
    }

    #[test]
    fn test_get_directory_is_not_found() {
        let (_temp, store) = test_store();
        fs::create_dir(store.root().path().join("subdir")).unwrap();

        assert!(matches!(store.get("subdir"), Err(FilesError::NotFound(_))));
    }

    #[test]
    fn test_get_detects_png_from_content() {
        let (_temp, store) = test_store();
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

        let name = store.put(&png[..], None).unwrap();
        let blob = store.get(name.as_str()).unwrap();

        assert_eq!(blob.content_type(), "image/png");
        assert_eq!(read_all(blob), png);
    }

    #[test]
    fn test_get_falls_back_to_octet_stream() {
        let temp = TempDir::new().unwrap();
        let root = StorageRoot::ensure(temp.path().join("uploads")).unwrap();
        let store = BlobStore::with_sniffer(root, FixedSniffer(None));

        let name = store.put(&b"opaque"[..], Some("a.pdf")).unwrap();

        assert_eq!(store.get(name.as_str()).unwrap().content_type(), OCTET_STREAM);
    }

    #[test]
    fn test_get_uses_custom_sniffer() {
        let temp = TempDir::new().unwrap();
        let root = StorageRoot::ensure(temp.path().join("uploads")).unwrap();
        let store = BlobStore::with_sniffer(root, FixedSniffer(Some("text/x-custom")));

        let name = store.put(&b"abc"[..], None).unwrap();

        assert_eq!(store.get(name.as_str()).unwrap().content_type(), "text/x-custom");
    }

    #[test]
    fn test_blob_stream_is_not_restartable() {
        let (_temp, store) = test_store();
        let name = store.put(&b"once"[..], None).unwrap();

        let mut blob = store.get(name.as_str()).unwrap();
        let mut first = Vec::new();
        blob.read_to_end(&mut first).unwrap();
        let mut second = Vec::new();
        blob.read_to_end(&mut second).unwrap();

        assert_eq!(first, b"once");
        assert!(second.is_empty());
        assert_eq!(read_all(store.get(name.as_str()).unwrap()), b"once");
    }

    #[test]
    fn test_get_reads_partially_without_buffering() {
        let (_temp, store) = test_store();
        let name = store
            .put(io::repeat(7).take(1024 * 1024), Some("partial.bin"))
            .unwrap();

        let mut blob = store.get(name.as_str()).unwrap();
        let mut chunk = [0u8; 16];
        blob.read_exact(&mut chunk).unwrap();

        assert_eq!(chunk, [7u8; 16]);
        assert_eq!(blob.len(), 1024 * 1024);
    }
}
