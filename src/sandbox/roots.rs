// SPDX-License-Identifier: GPL-3.0-or-later

//! The allow-list of root directories.
//!
//! Constructed once at startup and never mutated; every tool call checks
//! containment against it for the lifetime of the process.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

/// An ordered, de-duplicated set of canonical root directories.
///
/// Containment is checked component-wise (never by string prefix, so
/// `/allowed-evil` does not match the root `/allowed`). When
/// `case_insensitive` is set, components are compared with ASCII case
/// folding; this is a configuration-time decision for deployments on
/// case-insensitive filesystems.
#[derive(Debug, Clone)]
pub struct RootSet {
    roots: Vec<PathBuf>,
    case_insensitive: bool,
}

impl RootSet {
    /// Builds a `RootSet` from the configured directories.
    ///
    /// Each entry must exist and be a directory; entries are canonicalized
    /// (resolving symlinks and `.`/`..` segments) and de-duplicated while
    /// preserving order.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry does not exist, is not a directory,
    /// or cannot be canonicalized.
    pub fn new(dirs: Vec<PathBuf>, case_insensitive: bool) -> Result<Self> {
        if dirs.is_empty() {
            return Err(anyhow!("at least one allowed directory is required"));
        }

        let mut roots: Vec<PathBuf> = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if !dir.exists() {
                return Err(anyhow!("directory {} does not exist", dir.display()));
            }
            if !dir.is_dir() {
                return Err(anyhow!("{} is not a directory", dir.display()));
            }
            let canonical = dir
                .canonicalize()
                .with_context(|| format!("failed to resolve {}", dir.display()))?;
            if !roots.contains(&canonical) {
                roots.push(canonical);
            }
        }

        debug!("RootSet initialized with {} root(s)", roots.len());
        Ok(Self {
            roots,
            case_insensitive,
        })
    }

    /// Checks whether a canonical path is equal to or a descendant of any root.
    pub fn contains(&self, canonical: &Path) -> bool {
        self.roots.iter().any(|root| {
            if self.case_insensitive {
                starts_with_fold(canonical, root)
            } else {
                canonical.starts_with(root)
            }
        })
    }

    /// Iterates over the canonical roots in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    /// Number of roots in the set.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the set is empty (never true after successful construction).
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Component-wise `starts_with` with ASCII case folding.
fn starts_with_fold(path: &Path, prefix: &Path) -> bool {
    let mut path_components = path.components();
    for prefix_component in prefix.components() {
        let Some(path_component) = path_components.next() else {
            return false;
        };
        let a = path_component.as_os_str();
        let b = prefix_component.as_os_str();
        let folded = match (a.to_str(), b.to_str()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => a == b,
        };
        if !folded {
            return false;
        }
    }
    true
}
