//! The storage root: the single directory under which all media,
//! thumbnails, and sidecars live. Every path this crate hands back has
//! been verified to resolve inside it (spec §6.2, §6.3).

use std::path::{Component, Path, PathBuf};

use crate::error::FsOpsError;

/// A canonicalised, existing directory that all job artifacts live under.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: PathBuf,
}

impl StorageRoot {
    /// Create (if missing) and canonicalise the storage root.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::RootUnavailable`] if the directory cannot be
    /// created or canonicalised.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FsOpsError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| FsOpsError::RootUnavailable {
            path: root.clone(),
            source,
        })?;
        let canonical =
            std::fs::canonicalize(&root).map_err(|source| FsOpsError::RootUnavailable {
                path: root.clone(),
                source,
            })?;
        Ok(Self { root: canonical })
    }

    /// The canonical absolute path of the storage root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve `raw` (a path relative to, or rooted at, the storage root)
    /// to an absolute path guaranteed to lie under the root.
    ///
    /// Resolution is lexical first (so this works for paths that don't
    /// exist yet, e.g. a thumbnail about to be written), then, if the
    /// result exists, re-verified after canonicalisation to defeat a
    /// symlink planted inside the root that points back out of it.
    ///
    /// Returns `None` if `raw` normalises outside the root at either
    /// stage — the caller should treat that as "not found"/403, never as
    /// an error to propagate.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Option<PathBuf> {
        let trimmed = raw.trim_start_matches(['/', '\\']);
        let joined = self.root.join(trimmed);
        let normalized = normalize_lexically(&joined);
        if !normalized.starts_with(&self.root) {
            return None;
        }
        if normalized.exists() {
            let real = std::fs::canonicalize(&normalized).ok()?;
            if !real.starts_with(&self.root) {
                return None;
            }
            Some(real)
        } else {
            Some(normalized)
        }
    }

    /// Express an absolute path (already known to be under the root, e.g.
    /// from [`StorageRoot::resolve`]) relative to the root, for storage in
    /// the job record.
    #[must_use]
    pub fn relativize(&self, absolute: &Path) -> Option<PathBuf> {
        absolute.strip_prefix(&self.root).ok().map(Path::to_path_buf)
    }

    /// Whether `absolute` lies under the storage root. Used defensively
    /// before any filesystem mutation driven by a stored path.
    #[must_use]
    pub fn contains(&self, absolute: &Path) -> bool {
        absolute.starts_with(&self.root)
    }
}

/// Collapse `.`/`..` components without touching the filesystem, so a
/// symlink-free path can be validated before it's known to exist.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_traversal_above_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        assert!(root.resolve("../../etc/passwd").is_none());
        assert!(root.resolve("/../../etc/passwd").is_none());
    }

    #[test]
    fn resolve_accepts_nested_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("video [abc123].mp4"), b"data").unwrap();
        let resolved = root.resolve("video [abc123].mp4").unwrap();
        assert!(resolved.exists());
        assert_eq!(root.relativize(&resolved).unwrap(), Path::new("video [abc123].mp4"));
    }

    #[test]
    fn resolve_allows_nonexistent_path_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        let resolved = root.resolve("not-yet-written.jpg").unwrap();
        assert!(resolved.starts_with(root.path()));
    }
}
