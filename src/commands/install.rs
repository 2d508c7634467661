//! Install Command
//!
//! Installs one package directly and records it in the manifest.

use super::{Session, canonical_id, describe_code, write_back_store};
use crate::core::engine::InstallOutcome;
use crate::core::result::BestEffort;
use crate::core::types::{InstallerOptions, ManifestSource, PackageDefinition, PinType};
use crate::error::{Result, SyncError};
use crate::manifest;
use crate::ui as output;

#[derive(Debug)]
pub struct InstallOptions {
    pub id: String,
    pub version: Option<String>,
    pub pin: Option<String>,
    pub pin_type: Option<PinType>,
    pub installer: InstallerOptions,
    pub save: bool,
    pub source: ManifestSource,
}

impl InstallOptions {
    fn definition(&self) -> PackageDefinition {
        PackageDefinition {
            id: self.id.clone(),
            version: self.version.clone(),
            pin: self.pin.clone(),
            pin_type: self.pin_type.map(|t| t.as_str().to_string()),
            uninstall: false,
            options: self.installer.clone(),
        }
    }
}

/// Fold a direct install into an existing manifest entry.
///
/// Fields given on the command line replace the entry's; everything else
/// the entry already had is kept.
fn merge_into(entry: &mut PackageDefinition, installed: &PackageDefinition, canonical: &str) {
    entry.id = canonical.to_string();
    entry.uninstall = false;
    if installed.version.is_some() {
        entry.version = installed.version.clone();
    }
    if installed.pin.is_some() {
        entry.pin = installed.pin.clone();
        entry.pin_type = installed.pin_type.clone();
    }
    if !installed.options.is_default() {
        entry.options = installed.options.clone();
    }
}

pub fn run(options: InstallOptions) -> Result<()> {
    let session = Session::locked()?;
    let store = write_back_store(&options.source, &session.settings, options.save)?;
    let engine = session.engine();
    let definition = options.definition();

    output::info(&format!("Installing {}", definition.id));
    if let InstallOutcome::Failed(code) = engine.install_package(&definition) {
        return Err(SyncError::PackageOperation {
            id: definition.id,
            code,
        });
    }
    output::success(&format!("Installed {}", definition.id));

    if let Some(pin) = definition.pin_version() {
        match engine.add_pin(&definition.id, pin, definition.parsed_pin_type(), true) {
            BestEffort::Ignored { code } => output::warning(&format!(
                "Could not pin {} to {} (exit code {}); the next sync will retry",
                definition.id,
                pin,
                describe_code(code)
            )),
            _ => output::success(&format!("Pinned {} to {}", definition.id, pin)),
        }
    }

    if let Some(store) = store {
        let canonical = canonical_id(session.context.inventory.as_ref(), &definition.id);
        manifest::upsert_entry(store.as_ref(), &definition.id, |entry| {
            merge_into(entry, &definition, &canonical)
        })?;
        output::info(&format!("Recorded {} in {}", canonical, store.describe()));
    }

    Ok(())
}
