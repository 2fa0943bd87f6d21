//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services by value
//! or `Arc`. Request handlers never read environment variables, which keeps behaviour
//! consistent across threads and test harnesses.
//!
//! The `*_from_env_value` helpers take the raw (optional) environment value so the parsing
//! rules can be tested without mutating the process environment.

use crate::constants::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_REST_ADDR, DEFAULT_UPLOAD_DIR_NAME};
use crate::{ConfigError, ConfigResult};
use stash_files::{BlobStore, StorageRoot};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    upload_dir: PathBuf,
    rest_addr: SocketAddr,
    max_upload_bytes: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        upload_dir: PathBuf,
        rest_addr: SocketAddr,
        max_upload_bytes: usize,
    ) -> ConfigResult<Self> {
        if upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidInput(
                "upload directory cannot be empty".into(),
            ));
        }

        if max_upload_bytes == 0 {
            return Err(ConfigError::InvalidInput(
                "max upload bytes must be greater than zero".into(),
            ));
        }

        Ok(Self {
            upload_dir,
            rest_addr,
            max_upload_bytes,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn rest_addr(&self) -> SocketAddr {
        self.rest_addr
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Ensure the storage root exists and open a blob store over it.
    ///
    /// This is the one fatal step of startup: the service cannot run without its root.
    pub fn open_store(&self) -> ConfigResult<BlobStore> {
        let root = StorageRoot::ensure(&self.upload_dir)?;
        tracing::info!("++ Storage root at {}", root.path().display());
        Ok(BlobStore::new(root))
    }
}

/// Resolve the upload directory.
///
/// If `value` is `None` or empty/whitespace, returns `<system temp dir>/uploads`.
pub fn upload_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_UPLOAD_DIR_NAME))
}

/// Parse the REST bind address, defaulting to `0.0.0.0:8080`.
pub fn rest_addr_from_env_value(value: Option<String>) -> ConfigResult<SocketAddr> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_REST_ADDR.to_string());

    value
        .parse()
        .map_err(|_| ConfigError::InvalidInput(format!("invalid bind address: {value}")))
}

/// Parse the upload body limit in bytes, defaulting to 100 MiB.
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> ConfigResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        Some(v) => match v.parse::<usize>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidInput(format!(
                "max upload bytes must be a positive integer, got: {v}"
            ))),
            Ok(bytes) => Ok(bytes),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn upload_dir_defaults_to_temp_uploads() {
        let expected = std::env::temp_dir().join("uploads");

        assert_eq!(upload_dir_from_env_value(None), expected);
        assert_eq!(upload_dir_from_env_value(Some("   ".into())), expected);
    }

    #[test]
    fn upload_dir_override_is_trimmed() {
        assert_eq!(
            upload_dir_from_env_value(Some(" /srv/stash ".into())),
            PathBuf::from("/srv/stash")
        );
    }

    #[test]
    fn rest_addr_default_and_override() {
        assert_eq!(rest_addr_from_env_value(None).unwrap(), addr("0.0.0.0:8080"));
        assert_eq!(
            rest_addr_from_env_value(Some("127.0.0.1:9000".into())).unwrap(),
            addr("127.0.0.1:9000")
        );
    }

    #[test]
    fn rest_addr_rejects_garbage() {
        let result = rest_addr_from_env_value(Some("not-an-address".into()));

        assert!(matches!(result, Err(ConfigError::InvalidInput(_))));
    }

    #[test]
    fn max_upload_bytes_parsing() {
        assert_eq!(
            max_upload_bytes_from_env_value(None).unwrap(),
            DEFAULT_MAX_UPLOAD_BYTES
        );
        assert_eq!(
            max_upload_bytes_from_env_value(Some("1024".into())).unwrap(),
            1024
        );
        assert!(max_upload_bytes_from_env_value(Some("0".into())).is_err());
        assert!(max_upload_bytes_from_env_value(Some("-5".into())).is_err());
        assert!(max_upload_bytes_from_env_value(Some("lots".into())).is_err());
    }

    #[test]
    fn new_rejects_invalid_values() {
        assert!(CoreConfig::new(PathBuf::new(), addr("127.0.0.1:1"), 10).is_err());
        assert!(CoreConfig::new(PathBuf::from("/tmp/x"), addr("127.0.0.1:1"), 0).is_err());
    }

    #[test]
    fn open_store_creates_root() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("uploads");
        let cfg = CoreConfig::new(dir.clone(), addr("127.0.0.1:0"), 10).unwrap();

        let store = cfg.open_store().unwrap();

        assert!(dir.is_dir());
        assert_eq!(store.root().path(), dir.canonicalize().unwrap());
    }

    #[test]
    fn open_store_fails_when_root_is_a_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("uploads");
        std::fs::write(&dir, "occupied").unwrap();
        let cfg = CoreConfig::new(dir, addr("127.0.0.1:0"), 10).unwrap();

        assert!(matches!(cfg.open_store(), Err(ConfigError::Storage(_))));
    }
}
