//! Constants used throughout the Stash crates.

/// Directory created under the system temp directory when no upload directory is configured.
pub const DEFAULT_UPLOAD_DIR_NAME: &str = "uploads";

/// Default REST bind address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8080";

/// Default upload body limit (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Route prefix for file endpoints; downloads live at `<prefix>/download/<stored name>`.
pub const FILES_ROUTE_PREFIX: &str = "/api/files";

/// Environment variable overriding the storage root.
pub const UPLOAD_DIR_ENV: &str = "STASH_UPLOAD_DIR";

/// Environment variable overriding the REST bind address.
pub const REST_ADDR_ENV: &str = "STASH_REST_ADDR";

/// Environment variable overriding the upload body limit.
pub const MAX_UPLOAD_BYTES_ENV: &str = "STASH_MAX_UPLOAD_BYTES";
