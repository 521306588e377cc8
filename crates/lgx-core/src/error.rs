//! Error taxonomy for package operations.
//!
//! Every fallible operation in this crate returns [`Result`]. The verifier is
//! the one exception to fail-fast propagation: it accumulates errors into a
//! report instead of stopping at the first one.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the package core.
#[derive(Debug, Error)]
pub enum Error {
    /// Sanitizer rejection: absolute, traversal, backslash, non-NFC, empty.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Tar-level failure: bad checksum, truncation, unencodable path or size.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Gzip magic missing or a deflate/inflate failure.
    #[error("invalid compression: {0}")]
    InvalidCompression(String),

    /// JSON parse failure, missing or mistyped field, unsupported version.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Cross-consistency failure between the manifest and the archive tree.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Underlying filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller contract violation, e.g. a missing `main` for a directory
    /// source or removing a variant that does not exist.
    #[error("usage error: {0}")]
    Usage(String),
}
