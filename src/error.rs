//! Error types surfaced by the version model and release catalog.

use thiserror::Error;

/// Errors produced by the core of the toolkit.
///
/// Malformed individual release entries are tolerated and skipped during a
/// fetch; these variants cover the failures that are always surfaced.
#[derive(Debug, Error)]
pub enum Error {
    /// A version string or URL did not match the version grammar.
    #[error("invalid Godot version: {0}")]
    InvalidFormat(String),

    /// The host OS or CPU architecture could not be resolved to a supported
    /// platform.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// A requested version or asset is absent from the current cache.
    #[error("{0}")]
    NotFound(String),

    /// Network, timeout, or HTTP status failure. Aborts the in-progress
    /// fetch; releases accumulated from earlier pages are discarded.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local I/O failure while writing a download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
