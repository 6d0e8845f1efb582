//! Directory scanning for annotatable images.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::BoxmarkError;

/// Extensions (case-insensitive) that are treated as images.
pub const IMAGE_EXTENSIONS: [&str; 9] = [
    "jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff", "webp", "heic",
];

/// Lists image files directly inside `dir` (non-recursive), sorted by path.
pub fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>, BoxmarkError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| BoxmarkError::DirectoryScan {
            path: dir.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), &IMAGE_EXTENSIONS) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Returns true if the path has one of the allowed extensions.
pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// Human-readable location of an image relative to the document directory.
pub fn describe(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
