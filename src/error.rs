use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransitError>;

/// Typed errors for the load/store/export pipeline. Command orchestration
/// wraps these in `anyhow` context at the CLI boundary.
#[derive(Debug, Error)]
pub enum TransitError {
    /// The decoded input contained no non-blank lines. The only fatal
    /// parse error; everything else degrades row by row.
    #[error("input contains no data lines")]
    EmptyInput,

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown encoding label '{0}'")]
    UnknownEncoding(String),

    #[error("synonym override {path}: {reason}")]
    Synonyms { path: PathBuf, reason: String },

    #[error("snapshot {path}: {reason}")]
    Cache { path: PathBuf, reason: String },

    #[error("snapshot version {found} is not supported (expected {expected})")]
    CacheVersion { found: u32, expected: u32 },

    #[error("invalid filter: {0}")]
    FilterSpec(String),
}
