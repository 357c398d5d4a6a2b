//! Post-extraction artifact path resolution (spec §4.3.2).

use std::path::PathBuf;
use std::time::SystemTime;

use crate::root::StorageRoot;

/// Extensions that never count as the primary media artifact when
/// glob-matching by video id.
const SIDECAR_EXTENSIONS: &[&str] = &[
    ".json", ".info.json", ".part", ".ytdl", ".tmp", ".jpg", ".webp", ".png",
];

/// Thumbnail extensions, tried in this order.
const THUMBNAIL_EXTENSIONS: &[&str] = &["jpg", "webp", "png"];

/// Result of resolving where a completed job's artifacts ended up on
/// disk, both expressed relative to the storage root.
#[derive(Debug, Clone, Default)]
pub struct ResolvedArtifacts {
    /// The media file, if one could be located.
    pub media_path: Option<PathBuf>,
    /// The media file's extension, without the leading dot.
    pub media_ext: Option<String>,
    /// The thumbnail file, if one could be located.
    pub thumbnail_path: Option<PathBuf>,
}

/// Resolve the on-disk media path for a just-completed job.
///
/// Tries, in order: (1) each `requested_download` candidate path, (2) each
/// info-dict candidate path, (3) a newest-by-mtime glob for
/// `*[<video_id>].*` in the storage root root, excluding sidecar
/// extensions. All candidates are validated to normalise under the
/// storage root; anything that doesn't is silently skipped (traversal
/// defence), never propagated as an error.
#[must_use]
pub fn resolve_media_path(
    root: &StorageRoot,
    requested_download_candidates: &[String],
    info_dict_candidates: &[String],
    video_id: Option<&str>,
) -> Option<PathBuf> {
    for candidate in requested_download_candidates {
        if let Some(found) = try_candidate(root, candidate) {
            return Some(found);
        }
    }
    for candidate in info_dict_candidates {
        if let Some(found) = try_candidate(root, candidate) {
            return Some(found);
        }
    }
    video_id.and_then(|id| glob_newest_for_video_id(root, id))
}

fn try_candidate(root: &StorageRoot, candidate: &str) -> Option<PathBuf> {
    let resolved = root.resolve(candidate)?;
    resolved.exists().then_some(resolved)
}

fn glob_newest_for_video_id(root: &StorageRoot, video_id: &str) -> Option<PathBuf> {
    let needle = format!("[{video_id}]");
    let mut best: Option<(SystemTime, PathBuf)> = None;

    let entries = std::fs::read_dir(root.path()).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.contains(&needle) {
            continue;
        }
        if SIDECAR_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if best.as_ref().is_none_or(|(best_mtime, _)| modified > *best_mtime) {
            best = Some((modified, path));
        }
    }

    best.map(|(_, path)| path)
}

/// Resolve the thumbnail sitting beside `media_path`, trying `.jpg`,
/// `.webp`, `.png` in order; the first that exists wins.
#[must_use]
pub fn resolve_thumbnail_path(media_path: &std::path::Path) -> Option<PathBuf> {
    let stem = media_path.with_extension("");
    THUMBNAIL_EXTENSIONS.iter().find_map(|ext| {
        let candidate = stem.with_extension(ext);
        candidate.exists().then_some(candidate)
    })
}

/// Resolve both artifacts for a completed job and express them relative
/// to the storage root (the form the store persists).
#[must_use]
pub fn resolve_artifacts(
    root: &StorageRoot,
    requested_download_candidates: &[String],
    info_dict_candidates: &[String],
    video_id: Option<&str>,
) -> ResolvedArtifacts {
    let Some(media_path) =
        resolve_media_path(root, requested_download_candidates, info_dict_candidates, video_id)
    else {
        return ResolvedArtifacts::default();
    };

    let media_ext = media_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_string);
    let thumbnail_path = resolve_thumbnail_path(&media_path);

    ResolvedArtifacts {
        media_path: root.relativize(&media_path),
        media_ext,
        thumbnail_path: thumbnail_path.and_then(|p| root.relativize(&p)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_falls_back_to_glob_by_video_id() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("Some Title [abc123].mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("Some Title [abc123].info.json"), b"{}").unwrap();

        let resolved = resolve_artifacts(&root, &[], &[], Some("abc123"));
        assert_eq!(
            resolved.media_path.unwrap(),
            std::path::Path::new("Some Title [abc123].mp4")
        );
        assert_eq!(resolved.media_ext.as_deref(), Some("mp4"));
    }

    #[test]
    fn resolve_prefers_requested_download_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("primary.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("other [abc123].mp4"), b"x").unwrap();

        let resolved = resolve_artifacts(
            &root,
            &["primary.mp4".to_string()],
            &[],
            Some("abc123"),
        );
        assert_eq!(resolved.media_path.unwrap(), std::path::Path::new("primary.mp4"));
    }

    #[test]
    fn resolve_finds_thumbnail_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("clip.webp"), b"x").unwrap();

        let resolved = resolve_artifacts(&root, &["clip.mp4".to_string()], &[], None);
        assert_eq!(resolved.thumbnail_path.unwrap(), std::path::Path::new("clip.webp"));
    }

    #[test]
    fn candidate_escaping_root_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        let resolved = resolve_media_path(&root, &["../../etc/passwd".to_string()], &[], None);
        assert!(resolved.is_none());
    }
}
