// SPDX-License-Identifier: GPL-3.0-or-later

//! Error taxonomy for path validation.
//!
//! Denial messages echo only the caller-supplied path. The resolved real
//! path may lie outside the sandbox and must never appear in error text.

use thiserror::Error;

/// Errors produced by [`super::PathGuard::validate`].
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The input is not a usable absolute path (relative, empty, or
    /// containing a NUL byte).
    #[error("invalid path: {0}")]
    InvalidInput(String),

    /// The resolved path escapes every allowed root directory.
    #[error("access denied - path outside allowed directories: {0}")]
    PathDenied(String),

    /// The path was required to exist but does not.
    #[error("path does not exist: {0}")]
    NotFound(String),

    /// Resolution failed for a reason unrelated to existence, such as a
    /// permission error on an ancestor directory.
    #[error("failed to resolve path: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
