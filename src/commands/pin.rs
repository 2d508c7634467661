//! Pin Command
//!
//! Adds or removes a pin directly and mirrors it into the manifest.

use super::{Session, write_back_store};
use crate::core::result::BestEffort;
use crate::core::types::{ManifestSource, PackageDefinition, PinType};
use crate::error::{Result, SyncError};
use crate::manifest;
use crate::ui as output;

#[derive(Debug)]
pub enum PinOptions {
    Add {
        id: String,
        version: Option<String>,
        pin_type: Option<PinType>,
        force: bool,
        save: bool,
        source: ManifestSource,
    },
    Remove {
        id: String,
        save: bool,
        source: ManifestSource,
    },
}

fn set_pin(entry: &mut PackageDefinition, canonical: &str, version: &str, pin_type: Option<PinType>) {
    entry.id = canonical.to_string();
    entry.pin = Some(version.to_string());
    entry.pin_type = pin_type.map(|t| t.as_str().to_string());
}

fn clear_pin(entry: &mut PackageDefinition) {
    entry.pin = None;
    entry.pin_type = None;
}

fn applied(outcome: BestEffort, id: &str) -> Result<()> {
    match outcome {
        BestEffort::Ignored { code } => Err(SyncError::PackageOperation {
            id: id.to_string(),
            code,
        }),
        _ => Ok(()),
    }
}

pub fn run(options: PinOptions) -> Result<()> {
    match options {
        PinOptions::Add {
            id,
            version,
            pin_type,
            force,
            save,
            source,
        } => add(&id, version, pin_type, force, save, &source),
        PinOptions::Remove { id, save, source } => remove(&id, save, &source),
    }
}

fn add(
    id: &str,
    version: Option<String>,
    pin_type: Option<PinType>,
    force: bool,
    save: bool,
    source: &ManifestSource,
) -> Result<()> {
    let session = Session::locked()?;
    let store = write_back_store(source, &session.settings, save)?;
    let engine = session.engine();

    let package = session
        .context
        .inventory
        .find_by_id(id)?
        .ok_or_else(|| SyncError::PackageNotFound(format!("{} is not installed", id)))?;
    let version = version.unwrap_or_else(|| package.version.clone());

    applied(engine.add_pin(&package.id, &version, pin_type, force), &package.id)?;
    output::success(&format!("Pinned {} to {}", package.id, version));

    if let Some(store) = store {
        manifest::upsert_entry(store.as_ref(), id, |entry| {
            set_pin(entry, &package.id, &version, pin_type)
        })?;
        output::info(&format!("Recorded pin in {}", store.describe()));
    }

    Ok(())
}

fn remove(id: &str, save: bool, source: &ManifestSource) -> Result<()> {
    let session = Session::locked()?;
    let store = write_back_store(source, &session.settings, save)?;
    let engine = session.engine();

    applied(engine.remove_pin(id), id)?;
    output::success(&format!("Removed pin of {}", id));

    if let Some(store) = store {
        match manifest::modify_entry(store.as_ref(), id, clear_pin)? {
            Some(_) => output::info(&format!("Cleared pin in {}", store.describe())),
            None => output::info(&format!("{} is not in the manifest", id)),
        }
    }

    Ok(())
}
