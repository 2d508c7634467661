//! Collaborator abstractions for the reconciliation engine
//!
//! The engine only talks to the outside world through these traits, so the
//! real package manager, the installed-package inventory, and the manifest
//! store can each be swapped for fakes in tests.

use crate::backends::{CliInventory, ProcessInvoker};
use crate::config::settings::Settings;
use crate::core::types::{LocalPackage, PackageDefinition, PinRecord};
use crate::error::Result;

/// Exit code and captured output of one package-manager invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Invocation {
    pub fn exited(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }
}

/// The sole effect boundary that mutates the target machine.
pub trait PackageManagerInvoker {
    /// Run the package manager with `argv` and wait for it to exit.
    ///
    /// An `Err` means the process could not be run at all; a non-zero exit
    /// is reported through `Invocation::exit_code`.
    fn run(&self, argv: &[String]) -> Result<Invocation>;
}

/// Read-only view of what is installed and pinned on this machine.
pub trait LocalPackageInventory {
    fn find_by_id(&self, id: &str) -> Result<Option<LocalPackage>>;

    fn list_installed(&self) -> Result<Vec<LocalPackage>>;

    fn list_pins(&self) -> Result<Vec<PinRecord>>;
}

/// Whole-document access to the manifest.
pub trait ManifestStore {
    /// Human-readable location, used in messages.
    fn describe(&self) -> String;

    fn get_packages(&self) -> Result<Vec<PackageDefinition>>;

    /// Full replace, written in sorted-by-id order.
    fn save_packages(&self, packages: &[PackageDefinition]) -> Result<()>;
}

/// Machine-side dependencies shared by every command.
pub struct AppContext {
    pub invoker: Box<dyn PackageManagerInvoker>,
    pub inventory: Box<dyn LocalPackageInventory>,
}

impl AppContext {
    pub fn new(
        invoker: Box<dyn PackageManagerInvoker>,
        inventory: Box<dyn LocalPackageInventory>,
    ) -> Self {
        Self { invoker, inventory }
    }

    /// Context driving the configured package-manager binary.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let invoker = ProcessInvoker::locate(&settings.binary())?;
        let inventory = CliInventory::new(invoker.clone());
        Ok(Self::new(Box::new(invoker), Box::new(inventory)))
    }
}
