//! Locate report workbooks in a source folder

use std::path::{Path, PathBuf};

use super::ImportError;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xls"];

fn is_workbook(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // Office lock files ("~$report.xlsx") are not workbooks
    if name.starts_with("~$") {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|w| e.eq_ignore_ascii_case(w))
        })
        .unwrap_or(false)
}

/// List `.xlsx` and `.xls` files directly inside `folder`, sorted by path
///
/// Subdirectories are not scanned.
pub fn discover_workbooks(folder: &Path) -> Result<Vec<PathBuf>, ImportError> {
    if !folder.is_dir() {
        return Err(ImportError::FolderNotFound(folder.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                tracing::warn!("Error accessing path: {}", e);
                continue;
            }
        };
        if path.is_file() && is_workbook(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
