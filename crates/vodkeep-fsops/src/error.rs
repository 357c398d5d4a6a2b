//! Crate-level error type for `vodkeep-fsops`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by storage-root path resolution and cleanup.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// The storage root could not be created or canonicalised.
    #[error("failed to prepare storage root {path}: {source}")]
    RootUnavailable {
        /// The configured storage root.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A candidate path normalised outside the storage root.
    #[error("path escapes storage root: {path}")]
    PathEscapesRoot {
        /// The offending path, as supplied.
        path: String,
    },
    /// Removing a file failed for a reason other than "already gone".
    #[error("failed to remove {path}: {source}")]
    RemoveFailed {
        /// The path that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
