//! Error types shared across the fingerprinting pipeline.

use thiserror::Error;

/// Everything that can go wrong between decoding a file and returning a
/// [`crate::aligner::Recognition`]. `NoMatch` is deliberately absent: per the
/// alignment contract a lookup that produces no votes is not an error, it is
/// surfaced as `Option::None` from [`crate::aligner::align`].
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("failed to decode audio file {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("catalog operation failed: {0}")]
    Catalog(String),

    #[error(
        "config mismatch on field `{field}`: catalog was fingerprinted with {stored}, current config has {current}"
    )]
    ConfigMismatch {
        field: &'static str,
        stored: String,
        current: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Diesel(#[from] diesel::result::Error),

    #[error("database connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("migration error: {0}")]
    Migration(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, FingerprintError>;
