//! Manifest stores and the document format they share.

pub mod document;
pub mod file;
pub mod remote;

pub use file::FileManifestStore;
pub use remote::{GistManifestStore, UrlManifestStore};

use crate::config::settings::{self, Settings};
use crate::core::types::{ManifestSource, PackageDefinition};
use crate::error::{Result, SyncError};
use crate::traits::ManifestStore;
use crate::utils::paths;

/// Open the store behind `source`.
pub fn open_store(source: &ManifestSource, settings: &Settings) -> Result<Box<dyn ManifestStore>> {
    match source {
        ManifestSource::File(path) => Ok(Box::new(FileManifestStore::new(paths::expand_home(path)?))),
        ManifestSource::Url(url) => Ok(Box::new(UrlManifestStore::new(url.trim()))),
        ManifestSource::Default => {
            let gist_id = settings.gist_id().ok_or_else(|| {
                SyncError::ConfigError(format!(
                    "No default manifest configured. Run `{} settings set {} <id>` or pass --file/--url",
                    crate::project_identity::BINARY_NAME,
                    settings::GIST_ID
                ))
            })?;
            Ok(Box::new(GistManifestStore::new(
                settings.api_url(),
                gist_id,
                settings.gist_file(),
                settings.token(),
            )))
        }
    }
}

/// Read-modify-write a single entry, creating it when absent.
///
/// A manifest that does not exist yet is treated as empty so the first
/// direct install can create it. Returns the entry as written.
pub fn upsert_entry(
    store: &dyn ManifestStore,
    id: &str,
    update: impl FnOnce(&mut PackageDefinition),
) -> Result<PackageDefinition> {
    rewrite_entry(store, id, true, update)?
        .ok_or_else(|| SyncError::Other(format!("manifest entry '{}' was not written", id)))
}

/// Like [`upsert_entry`], but leaves the manifest untouched when the entry
/// does not exist.
pub fn modify_entry(
    store: &dyn ManifestStore,
    id: &str,
    update: impl FnOnce(&mut PackageDefinition),
) -> Result<Option<PackageDefinition>> {
    rewrite_entry(store, id, false, update)
}

fn rewrite_entry(
    store: &dyn ManifestStore,
    id: &str,
    create: bool,
    update: impl FnOnce(&mut PackageDefinition),
) -> Result<Option<PackageDefinition>> {
    let mut packages = match store.get_packages() {
        Ok(packages) => packages,
        Err(SyncError::ManifestUnavailable(_)) if create => Vec::new(),
        Err(e) => return Err(e),
    };

    let index = match packages.iter().position(|p| p.matches_id(id)) {
        Some(index) => index,
        None if create => {
            packages.push(PackageDefinition::new(id));
            packages.len() - 1
        }
        None => return Ok(None),
    };

    update(&mut packages[index]);
    let written = packages[index].clone();
    store.save_packages(&packages)?;
    Ok(Some(written))
}
