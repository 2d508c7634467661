//! Uninstall Command
//!
//! Removes one package directly and turns its manifest entry into a
//! tombstone so later syncs keep it removed.

use super::{Session, describe_code, write_back_store};
use crate::core::result::BestEffort;
use crate::core::types::{InstallerOptions, ManifestSource, PackageDefinition, same_id};
use crate::error::{Result, SyncError};
use crate::manifest;
use crate::ui as output;

#[derive(Debug)]
pub struct UninstallOptions {
    pub id: String,
    pub installer: InstallerOptions,
    pub save: bool,
    pub source: ManifestSource,
}

fn tombstone(entry: &mut PackageDefinition, canonical: &str) {
    entry.id = canonical.to_string();
    entry.uninstall = true;
    entry.pin = None;
    entry.pin_type = None;
}

pub fn run(options: UninstallOptions) -> Result<()> {
    let session = Session::locked()?;
    let store = write_back_store(&options.source, &session.settings, options.save)?;
    let engine = session.engine();
    let inventory = session.context.inventory.as_ref();

    let definition = PackageDefinition {
        uninstall: true,
        options: options.installer,
        ..PackageDefinition::new(options.id)
    };

    let canonical = match inventory.find_by_id(&definition.id)? {
        Some(package) => {
            let pinned = inventory
                .list_pins()?
                .iter()
                .any(|pin| same_id(&pin.id, &package.id));

            output::info(&format!("Uninstalling {} {}", package.id, package.version));
            if let Err(code) = engine.uninstall_package(&definition) {
                return Err(SyncError::PackageOperation {
                    id: definition.id,
                    code,
                });
            }
            output::success(&format!("Uninstalled {}", package.id));

            if pinned && let BestEffort::Ignored { code } = engine.remove_pin(&package.id) {
                output::warning(&format!(
                    "Could not remove the pin of {} (exit code {})",
                    package.id,
                    describe_code(code)
                ));
            }
            package.id
        }
        None => {
            output::info(&format!("{} is not installed", definition.id));
            definition.id.clone()
        }
    };

    if let Some(store) = store {
        manifest::upsert_entry(store.as_ref(), &definition.id, |entry| {
            tombstone(entry, &canonical)
        })?;
        output::info(&format!(
            "Marked {} as uninstalled in {}",
            canonical,
            store.describe()
        ));
    }

    Ok(())
}
