pub mod completions;
pub mod install;
pub mod list;
pub mod pin;
pub mod settings;
pub mod sync;
pub mod uninstall;

use crate::config::settings::Settings;
use crate::core::engine::ReconciliationEngine;
use crate::core::types::ManifestSource;
use crate::error::{Result, SyncError};
use crate::manifest;
use crate::traits::{AppContext, LocalPackageInventory, ManifestStore};
use crate::ui;
use crate::utils::locking::{self, RunLock};

/// Settings, machine context and (for mutating commands) the run lock.
pub(crate) struct Session {
    pub settings: Settings,
    pub context: AppContext,
    _lock: Option<RunLock>,
}

impl Session {
    /// Session for a command that may change the machine.
    pub fn locked() -> Result<Self> {
        let settings = Settings::load()?;
        let lock = locking::acquire()?;
        let context = AppContext::from_settings(&settings)?;
        Ok(Self {
            settings,
            context,
            _lock: Some(lock),
        })
    }

    /// Session for read-only queries.
    pub fn unlocked() -> Result<Self> {
        let settings = Settings::load()?;
        let context = AppContext::from_settings(&settings)?;
        Ok(Self {
            settings,
            context,
            _lock: None,
        })
    }

    pub fn engine(&self) -> ReconciliationEngine<'_> {
        ReconciliationEngine::new(
            self.context.inventory.as_ref(),
            self.context.invoker.as_ref(),
        )
        .with_cancellation(ui::is_interrupted)
    }
}

/// Store that a direct command writes back to, or `None` with `--no-save`.
///
/// Checked before the package manager runs, so a read-only source fails
/// without touching the machine.
pub(crate) fn write_back_store(
    source: &ManifestSource,
    settings: &Settings,
    save: bool,
) -> Result<Option<Box<dyn ManifestStore>>> {
    if !save {
        return Ok(None);
    }
    if let ManifestSource::Url(url) = source {
        return Err(SyncError::ReadOnlyManifest(url.clone()));
    }
    manifest::open_store(source, settings).map(Some)
}

/// Identifier as the package manager spells it, falling back to `id`.
pub(crate) fn canonical_id(inventory: &dyn LocalPackageInventory, id: &str) -> String {
    match inventory.find_by_id(id) {
        Ok(Some(package)) => package.id,
        _ => id.to_string(),
    }
}

/// `-1978335189 (0x8A15002B)` for HRESULT-style codes, the plain number otherwise.
pub(crate) fn describe_code(code: i32) -> String {
    if code < -1 {
        format!("{} (0x{:08X})", code, code as u32)
    } else {
        code.to_string()
    }
}
