use crate::error::AppError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(AppError::NotADirectory(dir.to_path_buf()))
    }
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Where `path` lands when the tree under `root` is mirrored into `dest`.
/// Paths outside `root` keep only their file name.
pub fn mirrored_path(root: &Path, path: &Path, dest: &Path) -> Option<PathBuf> {
    match path.strip_prefix(root) {
        Ok(relative) if relative.file_name().is_some() => Some(dest.join(relative)),
        _ => path.file_name().map(|name| dest.join(name)),
    }
}

/// Recursively collects regular files under `root` in file-name order.
///
/// `extension` is matched case-insensitively. Anything below `exclude` is
/// never descended into.
pub fn discover_files(
    root: &Path,
    extension: Option<&str>,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>, AppError> {
    ensure_dir(root)?;
    log::debug!("Starting file discovery in {:?}", root);
    log::trace!("Extension filter: {:?}, excluded: {:?}", extension, exclude);

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| exclude.map_or(true, |ex| e.path() != ex));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file entry: {:?}", entry.path());
            continue;
        }

        let path = entry.path();
        match extension {
            Some(ext) if !has_extension(path, ext) => {
                log::trace!("Skipping file due to extension filter: {:?}", path);
            }
            _ => {
                log::trace!("Discovered file: {:?}", path);
                files.push(path.to_path_buf());
            }
        }
    }

    log::debug!("File discovery complete, {} files found.", files.len());
    Ok(files)
}
