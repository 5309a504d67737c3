//! # File helpers shared by the capture and labeling tools
//!
//! Image discovery follows a single rule everywhere: regular files directly
//! inside a directory (no recursion), filtered by extension, sorted by name.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions (lowercase, without dot) accepted as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff"];

/// Checks whether a path has one of the accepted image extensions.
///
/// The comparison is case-insensitive, so `IMG_001.JPG` counts.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Lists the image files directly inside `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read image directory {}", dir.display()))?;

    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image_file(p))
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Bare file name of a path as an owned string.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
