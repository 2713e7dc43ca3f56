//! Image file discovery and header-only dimension probing.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::GrapesetError;

/// Extensions tried, in order, when resolving an image for a stem.
pub const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// Finds `<dir>/<stem>.jpg`, falling back to `<dir>/<stem>.png`.
pub fn find_image_for_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Lists regular files directly inside `dir` whose extension matches one of
/// `extensions` (case-insensitive), sorted by file name.
///
/// A missing directory yields an empty list.
pub fn list_files_with_extensions(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, GrapesetError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| GrapesetError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while listing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Stems of every `.jpg`/`.png` image directly inside `dir`.
pub fn image_stems(dir: &Path) -> Result<Vec<String>, GrapesetError> {
    let mut stems: Vec<String> = list_files_with_extensions(dir, &IMAGE_EXTENSIONS)?
        .iter()
        .filter_map(|path| file_stem(path))
        .collect();
    stems.sort();
    stems.dedup();
    Ok(stems)
}

pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// Reads `(width, height)` from the image header.
pub fn read_image_dimensions(path: &Path) -> Result<(u32, u32), GrapesetError> {
    let size = imagesize::size(path).map_err(|source| GrapesetError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| GrapesetError::ImageDimensionInvalid {
            path: path.to_path_buf(),
            message: format!("width {} does not fit in u32", size.width),
        })?;

    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| GrapesetError::ImageDimensionInvalid {
            path: path.to_path_buf(),
            message: format!("height {} does not fit in u32", size.height),
        })?;

    if width == 0 || height == 0 {
        return Err(GrapesetError::ImageDimensionInvalid {
            path: path.to_path_buf(),
            message: format!("zero-sized image {width}x{height}"),
        });
    }

    Ok((width, height))
}
