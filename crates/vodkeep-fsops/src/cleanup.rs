//! Best-effort on-disk cleanup for a deleted job (spec §4.4, invariant 5).

use std::path::{Path, PathBuf};

use crate::root::StorageRoot;

const THUMBNAIL_SIBLING_EXTENSIONS: &[&str] = &["jpg", "webp", "png"];
const INFO_SIDECAR_EXTENSIONS: &[&str] = &["info.json", "json"];

/// Remove a completed job's media file, thumbnail, `info.json`, and any
/// remaining image sidecars. Every removal is scoped to paths that
/// canonicalise under `root`; anything else (including a path that no
/// longer exists) is silently skipped. Never fails: a partially-cleaned
/// job is better than a delete that can't complete.
pub fn cleanup_job_artifacts(
    root: &StorageRoot,
    media_local_path: Option<&str>,
    thumbnail_local_path: Option<&str>,
) {
    let mut removed: Vec<PathBuf> = Vec::new();

    if let Some(rel) = media_local_path {
        if let Some(path) = root.resolve(rel) {
            remove_if_present(root, &path);
            removed.push(path.clone());
            for ext in INFO_SIDECAR_EXTENSIONS {
                remove_if_present(root, &path.with_extension(ext));
            }
            for ext in THUMBNAIL_SIBLING_EXTENSIONS {
                remove_if_present(root, &path.with_extension(ext));
            }
            for part_ext in ["part", "ytdl", "tmp"] {
                remove_if_present(root, &path.with_extension(part_ext));
            }
        }
    }

    if let Some(rel) = thumbnail_local_path {
        if let Some(path) = root.resolve(rel) {
            if !removed.contains(&path) {
                remove_if_present(root, &path);
            }
        }
    }
}

fn remove_if_present(root: &StorageRoot, path: &Path) {
    if !root.contains(path) {
        tracing::warn!(path = %path.display(), "refusing to remove path outside storage root");
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed job artifact"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove job artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_removes_media_thumbnail_and_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("clip.webp"), b"x").unwrap();
        std::fs::write(dir.path().join("clip.info.json"), b"{}").unwrap();

        cleanup_job_artifacts(&root, Some("clip.mp4"), Some("clip.webp"));

        assert!(!dir.path().join("clip.mp4").exists());
        assert!(!dir.path().join("clip.webp").exists());
        assert!(!dir.path().join("clip.info.json").exists());
    }

    #[test]
    fn cleanup_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        cleanup_job_artifacts(&root, Some("missing.mp4"), None);
    }

    #[test]
    fn cleanup_never_touches_paths_outside_root() {
        let outside = tempfile::tempdir().unwrap();
        let victim = outside.path().join("victim.txt");
        std::fs::write(&victim, b"keep me").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        cleanup_job_artifacts(&root, Some("../victim.txt"), None);

        assert!(victim.exists());
    }
}
