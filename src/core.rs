use thiserror::Error;

/// Errors raised while bootstrapping the bridge.
#[derive(Error, Debug)]
pub enum DesklinkError {
    /// Configuration file could not be located or was invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error while preparing runtime directories.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file failed to parse.
    #[error("{0}")]
    TomlParse(String),
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, DesklinkError>;

impl DesklinkError {
    /// Build a parse error annotated with the offending file path.
    pub fn toml_parse(error: impl std::fmt::Display, path: &std::path::Path) -> Self {
        let clean_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        DesklinkError::TomlParse(format!("Failed to parse TOML at {clean_path:?}: {error}"))
    }
}
