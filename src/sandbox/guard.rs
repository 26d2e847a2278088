// SPDX-License-Identifier: GPL-3.0-or-later

//! Path validation for filesystem tools.
//!
//! Every tool call resolves its caller-supplied path to the canonical real
//! location and checks containment against the allowed roots before any
//! filesystem syscall. Not-yet-existing targets (write/create) are checked
//! against their deepest existing ancestor, so a symlinked parent cannot
//! redirect a "new file" write outside the sandbox.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::{RootSet, SandboxError};

/// Upper bound on symlink hops while resolving dangling links.
const MAX_SYMLINK_HOPS: u32 = 40;

/// A path that has passed containment validation.
///
/// Produced only by [`PathGuard::validate`]; tool handlers must hold one
/// before touching the filesystem. The containment guarantee is
/// point-in-time: the filesystem can change between check and use.
#[derive(Debug, Clone)]
pub struct ValidatedPath {
    path: PathBuf,
    exists: bool,
}

impl ValidatedPath {
    /// The canonical real absolute path.
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Whether the underlying filesystem entry existed at validation time.
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// Consumes the validation, yielding the canonical path.
    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

/// Resolves caller-supplied paths and enforces containment in a [`RootSet`].
///
/// Stateless apart from the read-only root set, so safe to call from any
/// number of in-flight requests without locking.
#[derive(Debug)]
pub struct PathGuard {
    roots: RootSet,
}

impl PathGuard {
    /// Creates a guard over the given root set.
    pub const fn new(roots: RootSet) -> Self {
        Self { roots }
    }

    /// The allowed roots this guard enforces.
    pub const fn roots(&self) -> &RootSet {
        &self.roots
    }

    /// Validates a caller-supplied path.
    ///
    /// The path must already be absolute; shorthand like `~` is the
    /// caller's job to expand. Symlinks and `.`/`..` segments are resolved
    /// before the containment check. For targets that do not exist yet,
    /// the deepest existing ancestor is resolved and the missing suffix is
    /// re-appended and normalized lexically.
    ///
    /// # Errors
    ///
    /// - [`SandboxError::InvalidInput`] for empty, NUL-containing, or
    ///   relative input.
    /// - [`SandboxError::PathDenied`] if the real location is outside all
    ///   roots. The message echoes only the caller-supplied path.
    /// - [`SandboxError::Io`] if resolution fails for a reason unrelated
    ///   to existence (e.g. permission denied on an ancestor).
    pub fn validate(&self, raw: &str) -> Result<ValidatedPath, SandboxError> {
        if raw.is_empty() {
            return Err(SandboxError::InvalidInput("empty path".to_string()));
        }
        if raw.contains('\0') {
            return Err(SandboxError::InvalidInput(
                "path contains NUL byte".to_string(),
            ));
        }

        let requested = Path::new(raw);
        if !requested.is_absolute() {
            return Err(SandboxError::InvalidInput(format!(
                "path must be absolute: {raw}"
            )));
        }

        let (resolved, exists) = resolve_real(requested, 0)?;

        if !self.roots.contains(&resolved) {
            debug!("denied: {raw}");
            // The resolved location may sit outside the sandbox; only the
            // caller-supplied path is safe to echo.
            return Err(SandboxError::PathDenied(raw.to_string()));
        }

        Ok(ValidatedPath {
            path: resolved,
            exists,
        })
    }
}

/// Resolves a path to its canonical real form, tolerating non-existence.
///
/// Returns the resolved path and whether the final target currently exists.
fn resolve_real(path: &Path, hops: u32) -> Result<(PathBuf, bool), SandboxError> {
    if hops > MAX_SYMLINK_HOPS {
        return Err(SandboxError::Io {
            source: std::io::Error::other("too many levels of symbolic links"),
        });
    }

    match std::fs::canonicalize(path) {
        Ok(real) => Ok((real, true)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            // The entry may still exist as a dangling symlink; its target
            // decides containment even though the target is missing.
            match std::fs::symlink_metadata(path) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    let target = resolve_dangling_link(path)?;
                    resolve_real(&target, hops + 1)
                }
                _ => {
                    let (ancestor, suffix) = split_at_existing_ancestor(path)?;
                    let (real_ancestor, _) = resolve_real(&ancestor, hops + 1)?;
                    // The missing suffix cannot contain symlinks yet, so a
                    // lexical cleanup of any `..` segments is sound.
                    Ok((normalize_lexically(&real_ancestor.join(suffix)), false))
                }
            }
        }
        Err(e) => Err(SandboxError::Io { source: e }),
    }
}

/// Resolves one hop of a dangling symlink against its canonical parent.
fn resolve_dangling_link(path: &Path) -> Result<PathBuf, SandboxError> {
    let parent = path.parent().ok_or_else(|| {
        SandboxError::InvalidInput(format!("cannot determine parent of {}", path.display()))
    })?;
    let canonical_parent = std::fs::canonicalize(parent)?;
    let target = std::fs::read_link(path)?;
    let joined = if target.is_absolute() {
        target
    } else {
        canonical_parent.join(target)
    };
    Ok(normalize_lexically(&joined))
}

/// Walks upward until an existing ancestor is found (dangling symlink
/// entries count as existing) and splits the path there.
fn split_at_existing_ancestor(path: &Path) -> Result<(PathBuf, PathBuf), SandboxError> {
    let mut current = path;
    loop {
        let Some(parent) = current.parent() else {
            // Ran out of ancestors without finding anything on disk.
            return Err(SandboxError::NotFound(path.display().to_string()));
        };
        if parent.as_os_str().is_empty() {
            return Err(SandboxError::NotFound(path.display().to_string()));
        }
        if std::fs::symlink_metadata(parent).is_ok() {
            let suffix = path
                .strip_prefix(parent)
                .map_err(|_| SandboxError::NotFound(path.display().to_string()))?;
            return Ok((parent.to_path_buf(), suffix.to_path_buf()));
        }
        current = parent;
    }
}

/// Collapses `.` and `..` segments without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut stack: Vec<std::ffi::OsString> = Vec::new();
    let mut prefix: Option<std::ffi::OsString> = None;
    let mut absolute = false;
    for component in path.components() {
        match component {
            Component::Prefix(p) => prefix = Some(p.as_os_str().to_os_string()),
            Component::RootDir => {
                absolute = true;
                stack.clear();
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !stack.is_empty() {
                    stack.pop();
                } else if !absolute {
                    stack.push(std::ffi::OsString::from(".."));
                }
            }
            Component::Normal(part) => stack.push(part.to_os_string()),
        }
    }
    let mut out = PathBuf::new();
    if let Some(prefix) = prefix {
        out.push(prefix);
    }
    if absolute {
        out.push(Path::new("/"));
    }
    for part in stack {
        out.push(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use std::fs;
    use tempfile::TempDir;

    fn setup_sandbox() -> Result<(TempDir, PathGuard)> {
        let dir = TempDir::new()?;
        let root = dir.path().canonicalize()?;

        fs::write(root.join("a.txt"), "foo\nbar\n")?;
        fs::create_dir_all(root.join("sub"))?;
        fs::write(root.join("sub/b.txt"), "// b")?;

        let guard = PathGuard::new(RootSet::new(vec![root], false)?);
        Ok((dir, guard))
    }

    fn raw(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_existing_file_within_root() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let validated = guard.validate(&raw(&dir.path().join("a.txt")))?;
        assert!(validated.exists());
        assert_eq!(
            validated.as_path(),
            dir.path().canonicalize()?.join("a.txt")
        );
        Ok(())
    }

    #[test]
    fn test_path_equal_to_root() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let validated = guard.validate(&raw(dir.path()))?;
        assert!(validated.exists());
        Ok(())
    }

    #[test]
    fn test_relative_path_rejected() -> Result<()> {
        let (_dir, guard) = setup_sandbox()?;
        let result = guard.validate("sub/b.txt");
        assert!(matches!(result, Err(SandboxError::InvalidInput(_))));
        Ok(())
    }

    #[test]
    fn test_empty_and_nul_rejected() -> Result<()> {
        let (_dir, guard) = setup_sandbox()?;
        assert!(matches!(
            guard.validate(""),
            Err(SandboxError::InvalidInput(_))
        ));
        assert!(matches!(
            guard.validate("/tmp/a\0b"),
            Err(SandboxError::InvalidInput(_))
        ));
        Ok(())
    }

    #[test]
    fn test_outside_root_denied() -> Result<()> {
        let (_dir, guard) = setup_sandbox()?;
        let result = guard.validate("/etc/hostname");
        assert!(matches!(result, Err(SandboxError::PathDenied(_))));
        Ok(())
    }

    #[test]
    fn test_filesystem_root_denied() -> Result<()> {
        let (_dir, guard) = setup_sandbox()?;
        let result = guard.validate("/");
        assert!(matches!(result, Err(SandboxError::PathDenied(_))));
        Ok(())
    }

    #[test]
    fn test_dotdot_escape_denied() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let escape = dir.path().join("../../etc/passwd");
        let result = guard.validate(&raw(&escape));
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_denial_does_not_leak_resolved_path() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let root = dir.path().canonicalize()?;

        let outside = TempDir::new()?;
        let secret_dir = outside.path().canonicalize()?;

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&secret_dir, root.join("link"))?;
            let supplied = raw(&root.join("link/secret.txt"));
            let err = guard
                .validate(&supplied)
                .err()
                .ok_or_else(|| anyhow!("expected denial"))?;
            let text = err.to_string();
            assert!(text.contains(&supplied));
            assert!(!text.contains(&raw(&secret_dir)));
        }
        Ok(())
    }

    #[test]
    fn test_new_file_in_existing_dir() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let validated = guard.validate(&raw(&dir.path().join("sub/new.txt")))?;
        assert!(!validated.exists());
        assert_eq!(
            validated.as_path(),
            dir.path().canonicalize()?.join("sub/new.txt")
        );
        Ok(())
    }

    #[test]
    fn test_deeply_nested_missing_path() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let validated = guard.validate(&raw(&dir.path().join("x/y/z/new.txt")))?;
        assert!(!validated.exists());
        Ok(())
    }

    #[test]
    fn test_missing_suffix_with_dotdot_cannot_escape() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        // `nodir` does not exist, and the `..` segments climb out of the root.
        let sneaky = dir.path().join("nodir/../../../../etc/passwd");
        let result = guard.validate(&raw(&sneaky));
        assert!(matches!(result, Err(SandboxError::PathDenied(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_root_allowed() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let root = dir.path().canonicalize()?;
        std::os::unix::fs::symlink(root.join("a.txt"), root.join("alias.txt"))?;

        let validated = guard.validate(&raw(&root.join("alias.txt")))?;
        assert_eq!(validated.as_path(), root.join("a.txt"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_denied() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let root = dir.path().canonicalize()?;

        let outside = TempDir::new()?;
        fs::write(outside.path().join("secret.txt"), "secret")?;
        std::os::unix::fs::symlink(outside.path(), root.join("out"))?;

        // Both the symlink itself and anything beneath it must be denied.
        let result = guard.validate(&raw(&root.join("out/secret.txt")));
        assert!(matches!(result, Err(SandboxError::PathDenied(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_under_escaping_symlink_denied() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let root = dir.path().canonicalize()?;

        let outside = TempDir::new()?;
        std::os::unix::fs::symlink(outside.path(), root.join("out"))?;

        // The target does not exist; containment must still be checked
        // against the resolved (outside) parent.
        let result = guard.validate(&raw(&root.join("out/new.txt")));
        assert!(matches!(result, Err(SandboxError::PathDenied(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_inside_root_allowed() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let root = dir.path().canonicalize()?;
        std::os::unix::fs::symlink(root.join("missing.txt"), root.join("dangle"))?;

        let validated = guard.validate(&raw(&root.join("dangle")))?;
        assert!(!validated.exists());
        assert_eq!(validated.as_path(), root.join("missing.txt"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_outside_root_denied() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let root = dir.path().canonicalize()?;
        std::os::unix::fs::symlink("/nonexistent/outside/target", root.join("dangle"))?;

        let result = guard.validate(&raw(&root.join("dangle")));
        assert!(matches!(result, Err(SandboxError::PathDenied(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_errors() -> Result<()> {
        let (dir, guard) = setup_sandbox()?;
        let root = dir.path().canonicalize()?;
        std::os::unix::fs::symlink(root.join("loop_b"), root.join("loop_a"))?;
        std::os::unix::fs::symlink(root.join("loop_a"), root.join("loop_b"))?;

        let result = guard.validate(&raw(&root.join("loop_a")));
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_multiple_roots() -> Result<()> {
        let dir1 = TempDir::new()?;
        let dir2 = TempDir::new()?;
        fs::write(dir1.path().join("a.txt"), "a")?;
        fs::write(dir2.path().join("b.txt"), "b")?;

        let guard = PathGuard::new(RootSet::new(
            vec![dir1.path().to_path_buf(), dir2.path().to_path_buf()],
            false,
        )?);

        assert!(guard.validate(&raw(&dir1.path().join("a.txt"))).is_ok());
        assert!(guard.validate(&raw(&dir2.path().join("b.txt"))).is_ok());
        Ok(())
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(
            normalize_lexically(Path::new("/a/../../etc")),
            PathBuf::from("/etc")
        );
    }
}
