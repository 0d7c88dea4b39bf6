//! Project-relative asset path handling
//!
//! Asset handles always use forward slashes. Folder names such as `Assets`
//! and `Resources` are matched case-insensitively, because projects authored
//! on Windows or macOS often disagree on case with what is on disk.

use std::path::{Path, PathBuf};

/// Root folder every asset lives under
pub const ASSETS_DIR: &str = "Assets";

/// Folder whose textures the `ResourcesOnly` scope covers
pub const RESOURCES_DIR: &str = "Assets/Resources";

/// Extensions the filesystem host treats as textures
const TEXTURE_EXTENSIONS: &[&str] = &["png", "tga", "jpg", "jpeg"];

/// Suffix appended to a texture path to get its import sidecar
const SIDECAR_SUFFIX: &str = ".import.json";

/// Convert Windows path separators
/// `Assets\Textures\wall.png` -> `Assets/Textures/wall.png`
pub fn to_linux_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Normalize a path for lookups and comparisons (lowercase, forward slashes, trimmed)
pub fn normalize_for_lookup(path: &str) -> String {
    path.to_lowercase()
        .replace('\\', "/")
        .trim_matches('/')
        .to_string()
}

/// Whether `path` is `folder` itself or somewhere below it (case-insensitive)
pub fn is_within(path: &str, folder: &str) -> bool {
    let path = normalize_for_lookup(path);
    let folder = normalize_for_lookup(folder);
    path == folder
        || path
            .strip_prefix(&folder)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Find a file or folder case-insensitively within a directory
///
/// Given a base directory and a relative path like `Assets/Resources`,
/// finds the actual entry even if the real path is `assets/resources`.
pub fn resolve_case_insensitive(base: &Path, relative: &str) -> Option<PathBuf> {
    let components: Vec<&str> = relative
        .split(['\\', '/'])
        .filter(|s| !s.is_empty())
        .collect();

    let mut current = base.to_path_buf();

    for component in components {
        let target_lower = component.to_lowercase();

        let found = std::fs::read_dir(&current).ok()?.find_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name();

            if name.to_string_lossy().to_lowercase() == target_lower {
                Some(entry.path())
            } else {
                None
            }
        });

        current = found?;
    }

    Some(current)
}

/// Get the filename from a path (handles both / and \)
pub fn file_name(path: &str) -> &str {
    path.rfind(['\\', '/'])
        .map(|idx| &path[idx + 1..])
        .unwrap_or(path)
}

/// Get file extension, lowercased
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    name.rfind('.')
        .map(|idx| name[idx + 1..].to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Whether the path names an image format the filesystem host can load
pub fn is_texture_path(path: &str) -> bool {
    extension(path).is_some_and(|ext| TEXTURE_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether the image format has no alpha channel
pub fn is_jpeg_path(path: &str) -> bool {
    matches!(extension(path).as_deref(), Some("jpg" | "jpeg"))
}

/// Import sidecar location for a texture file
/// `Assets/wall.png` -> `Assets/wall.png.import.json`
pub fn sidecar_path(texture: &Path) -> PathBuf {
    let mut name = texture.as_os_str().to_os_string();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Express `path` relative to `root` with forward slashes
pub fn relative_asset_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Create parent directories for a path if they don't exist
pub fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
