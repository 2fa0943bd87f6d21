#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage root unavailable: {0}")]
    Storage(#[from] stash_files::FilesError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
