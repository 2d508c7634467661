//! Sync Command
//!
//! Loads the manifest and converges the machine onto it.

mod presentation;

use super::Session;
use crate::core::engine::{EngineOptions, load_manifest};
use crate::core::types::ManifestSource;
use crate::error::{Result, SyncError};
use crate::manifest;
use crate::ui as output;

#[derive(Debug)]
pub struct SyncOptions {
    pub source: ManifestSource,
    pub dry_run: bool,
    /// Overrides the `refresh-pins` setting when false.
    pub refresh_pins: bool,
}

pub fn run(options: SyncOptions) -> Result<()> {
    if options.dry_run {
        return preview(&options);
    }

    let session = Session::locked()?;
    let store = manifest::open_store(&options.source, &session.settings)?;
    let engine = session.engine().with_options(EngineOptions {
        refresh_before_pins: options.refresh_pins && session.settings.refresh_pins(),
    });

    output::info(&format!("Syncing from {}", store.describe()));
    let result = engine.sync(store.as_ref())?;
    presentation::show_result(&result);

    if result.interrupted() {
        return Err(SyncError::Interrupted);
    }
    if !result.success() {
        return Err(SyncError::Other(format!(
            "{} package operation(s) failed",
            result.failed().len()
        )));
    }

    Ok(())
}

fn preview(options: &SyncOptions) -> Result<()> {
    let session = Session::unlocked()?;
    let store = manifest::open_store(&options.source, &session.settings)?;
    let packages = load_manifest(store.as_ref())?;

    let plan = session.engine().plan(packages)?;
    output::info(&format!("Dry run against {}", store.describe()));
    presentation::show_plan(&plan);

    Ok(())
}
