use super::document::{parse_manifest, render_manifest};
use crate::core::types::PackageDefinition;
use crate::error::{Result, SyncError};
use crate::traits::ManifestStore;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Manifest kept in a local file.
pub struct FileManifestStore {
    path: PathBuf,
}

impl FileManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ManifestStore for FileManifestStore {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn get_packages(&self) -> Result<Vec<PackageDefinition>> {
        if !self.path.exists() {
            return Err(SyncError::ManifestUnavailable(format!(
                "manifest file not found: {}",
                self.path.display()
            )));
        }

        let content = fs::read_to_string(&self.path).map_err(|e| SyncError::IoError {
            path: self.path.clone(),
            source: e,
        })?;

        parse_manifest(&content, &self.describe())
    }

    fn save_packages(&self, packages: &[PackageDefinition]) -> Result<()> {
        let content = render_manifest(packages)?;
        write_atomically(&self.path, &content)
    }
}

/// Write through a sibling temp file, then rename over the target.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| SyncError::IoError {
        path: dir.clone(),
        source: e,
    })?;

    let file_name = path
        .file_name()
        .ok_or_else(|| SyncError::PathError(format!("Invalid manifest path: {}", path.display())))?;
    let tmp_path = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));

    let mut tmp_file = fs::File::create(&tmp_path).map_err(|e| SyncError::IoError {
        path: tmp_path.clone(),
        source: e,
    })?;
    tmp_file.write_all(content.as_bytes())?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| SyncError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
