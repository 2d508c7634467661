//! Reconciliation engine
//!
//! Diffs the manifest against the machine and converges it in three
//! sequential passes:
//!
//! 1. tombstones: uninstall entries marked `uninstall` that are installed
//! 2. installs: install entries that are missing
//! 3. pins: align pins of entries that were already installed
//!
//! Each package is handled on its own. A failure is recorded in the result
//! and the run moves on; only a manifest that cannot be read aborts the run.

use crate::core::arguments::{self, Operation};
use crate::core::exit_codes::{self, INVOCATION_ERROR, SUCCESS};
use crate::core::result::{BestEffort, PinAction, SyncResult, SyncResultBuilder};
use crate::core::types::{
    LocalPackage, PackageDefinition, PinRecord, PinType, dedupe_definitions, id_key,
};
use crate::error::{Result, SyncError};
use crate::traits::{Invocation, LocalPackageInventory, ManifestStore, PackageManagerInvoker};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Re-read installed packages and pins before the pin pass when the
    /// earlier passes changed anything.
    pub refresh_before_pins: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            refresh_before_pins: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    Failed(i32),
}

/// What pass 3 should do for an installed package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinDrift {
    InSync,
    Update,
    Remove,
}

/// Operations a sync would perform, computed without touching the machine.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub uninstall: Vec<PackageDefinition>,
    pub install: Vec<PackageDefinition>,
    pub pin_update: Vec<PackageDefinition>,
    pub pin_remove: Vec<PackageDefinition>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.uninstall.is_empty()
            && self.install.is_empty()
            && self.pin_update.is_empty()
            && self.pin_remove.is_empty()
    }
}

/// Installed packages and pins, keyed by lowercased id.
struct Snapshot {
    installed: HashMap<String, LocalPackage>,
    pins: HashMap<String, PinRecord>,
}

impl Snapshot {
    fn take(inventory: &dyn LocalPackageInventory) -> Result<Self> {
        let installed = inventory
            .list_installed()?
            .into_iter()
            .map(|pkg| (id_key(&pkg.id), pkg))
            .collect();
        let pins = inventory
            .list_pins()?
            .into_iter()
            .map(|pin| (id_key(&pin.id), pin))
            .collect();
        Ok(Self { installed, pins })
    }

    fn is_installed(&self, id: &str) -> bool {
        self.installed.contains_key(&id_key(id))
    }

    fn pin(&self, id: &str) -> Option<&PinRecord> {
        self.pins.get(&id_key(id))
    }

    fn pin_drift(&self, definition: &PackageDefinition) -> PinDrift {
        let local = self.pin(&definition.id);
        match definition.pin_version() {
            Some(wanted) => {
                let current = local.and_then(|p| p.version.as_deref()).map(str::trim);
                if current == Some(wanted.trim()) {
                    PinDrift::InSync
                } else {
                    PinDrift::Update
                }
            }
            None if local.is_some() => PinDrift::Remove,
            None => PinDrift::InSync,
        }
    }
}

pub struct ReconciliationEngine<'a> {
    inventory: &'a dyn LocalPackageInventory,
    invoker: &'a dyn PackageManagerInvoker,
    options: EngineOptions,
    cancelled: Box<dyn Fn() -> bool + 'a>,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(
        inventory: &'a dyn LocalPackageInventory,
        invoker: &'a dyn PackageManagerInvoker,
    ) -> Self {
        Self {
            inventory,
            invoker,
            options: EngineOptions::default(),
            cancelled: Box::new(|| false),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Polled between package operations, never during one.
    pub fn with_cancellation(mut self, cancelled: impl Fn() -> bool + 'a) -> Self {
        self.cancelled = Box::new(cancelled);
        self
    }

    /// Converge the machine onto the manifest held by `manifest`.
    pub fn sync(&self, manifest: &dyn ManifestStore) -> Result<SyncResult> {
        let packages = load_manifest(manifest)?;
        info!(source = %manifest.describe(), packages = packages.len(), "manifest loaded");
        self.reconcile(packages)
    }

    pub fn reconcile(&self, packages: Vec<PackageDefinition>) -> Result<SyncResult> {
        let packages = dedupe_definitions(packages);
        let mut snapshot = Snapshot::take(self.inventory)?;
        let mut result = SyncResultBuilder::default();
        let mut mutated = false;

        info!(pass = 1, "removing tombstoned packages");
        for definition in packages.iter().filter(|d| d.uninstall) {
            if self.check_cancelled(&mut result) {
                return Ok(result.build());
            }
            if !snapshot.is_installed(&definition.id) {
                debug!(id = %definition.id, "tombstone already converged");
                continue;
            }
            mutated = true;
            self.remove_package(definition, &snapshot, &mut result);
        }

        info!(pass = 2, "installing missing packages");
        let mut attempted: HashSet<String> = HashSet::new();
        for definition in packages.iter().filter(|d| !d.uninstall) {
            if self.check_cancelled(&mut result) {
                return Ok(result.build());
            }
            if snapshot.is_installed(&definition.id) {
                continue;
            }
            mutated = true;
            attempted.insert(id_key(&definition.id));
            match self.install_package(definition) {
                InstallOutcome::Installed => {
                    result.installed(definition);
                    if let Some(pin) = definition.pin_version() {
                        let outcome =
                            self.add_pin(&definition.id, pin, definition.parsed_pin_type(), false);
                        result.side_effect(&definition.id, PinAction::Add, outcome);
                    }
                }
                InstallOutcome::Failed(code) => result.failed(definition, code),
            }
        }

        if mutated && self.options.refresh_before_pins {
            match Snapshot::take(self.inventory) {
                Ok(fresh) => snapshot = fresh,
                Err(e) => warn!(error = %e, "could not refresh inventory, reusing earlier snapshot"),
            }
        }

        info!(pass = 3, "reconciling pins");
        for definition in packages.iter().filter(|d| !d.uninstall) {
            if self.check_cancelled(&mut result) {
                return Ok(result.build());
            }
            if attempted.contains(&id_key(&definition.id)) || !snapshot.is_installed(&definition.id)
            {
                continue;
            }
            self.reconcile_pin(definition, &snapshot, &mut result);
        }

        Ok(result.build())
    }

    /// Compute what `reconcile` would do without invoking anything.
    pub fn plan(&self, packages: Vec<PackageDefinition>) -> Result<SyncPlan> {
        let packages = dedupe_definitions(packages);
        let snapshot = Snapshot::take(self.inventory)?;
        let mut plan = SyncPlan::default();

        for definition in packages {
            let installed = snapshot.is_installed(&definition.id);
            if definition.uninstall {
                if installed {
                    plan.uninstall.push(definition);
                }
            } else if !installed {
                plan.install.push(definition);
            } else {
                match snapshot.pin_drift(&definition) {
                    PinDrift::Update => plan.pin_update.push(definition),
                    PinDrift::Remove => plan.pin_remove.push(definition),
                    PinDrift::InSync => {}
                }
            }
        }

        Ok(plan)
    }

    /// Install one package and classify the outcome.
    ///
    /// Success is exit code 0, a known "already installed" sentinel, or the
    /// package showing up in the inventory afterwards regardless of the code.
    pub fn install_package(&self, definition: &PackageDefinition) -> InstallOutcome {
        let args = arguments::install_args(definition);
        let code = match self.invoke(Operation::Install, &args) {
            Ok(invocation) => invocation.exit_code,
            Err(e) => {
                warn!(id = %definition.id, error = %e, "install could not be started");
                return InstallOutcome::Failed(INVOCATION_ERROR);
            }
        };

        if exit_codes::is_install_success(code) {
            if code != SUCCESS {
                info!(id = %definition.id, code, "install reported no-op success");
            }
            return InstallOutcome::Installed;
        }

        match self.inventory.find_by_id(&definition.id) {
            Ok(Some(_)) => {
                info!(id = %definition.id, code, "install exit code overridden: package is installed");
                InstallOutcome::Installed
            }
            Ok(None) => {
                warn!(id = %definition.id, code, "install failed");
                InstallOutcome::Failed(code)
            }
            Err(e) => {
                warn!(id = %definition.id, code, error = %e, "install failed and post-check errored");
                InstallOutcome::Failed(code)
            }
        }
    }

    pub fn add_pin(
        &self,
        id: &str,
        version: &str,
        pin_type: Option<PinType>,
        force: bool,
    ) -> BestEffort {
        let args = arguments::pin_add_args(id, Some(version), pin_type, force);
        self.best_effort(Operation::PinAdd, id, &args)
    }

    pub fn remove_pin(&self, id: &str) -> BestEffort {
        let args = arguments::pin_remove_args(id);
        self.best_effort(Operation::PinRemove, id, &args)
    }

    /// Uninstall one package. Only exit code 0 counts as success; the error
    /// carries the observed code.
    pub fn uninstall_package(&self, definition: &PackageDefinition) -> std::result::Result<(), i32> {
        let args = arguments::uninstall_args(definition);
        match self.invoke(Operation::Uninstall, &args) {
            Ok(invocation) if invocation.exit_code == SUCCESS => Ok(()),
            Ok(invocation) => {
                warn!(id = %definition.id, code = invocation.exit_code, "uninstall failed");
                Err(invocation.exit_code)
            }
            Err(e) => {
                warn!(id = %definition.id, error = %e, "uninstall could not be started");
                Err(INVOCATION_ERROR)
            }
        }
    }

    fn remove_package(
        &self,
        definition: &PackageDefinition,
        snapshot: &Snapshot,
        result: &mut SyncResultBuilder,
    ) {
        match self.uninstall_package(definition) {
            Ok(()) => {
                result.uninstalled(definition);
                if snapshot.pin(&definition.id).is_some() {
                    let outcome = self.remove_pin(&definition.id);
                    result.side_effect(&definition.id, PinAction::Remove, outcome);
                }
            }
            Err(code) => result.failed(definition, code),
        }
    }

    fn reconcile_pin(
        &self,
        definition: &PackageDefinition,
        snapshot: &Snapshot,
        result: &mut SyncResultBuilder,
    ) {
        match (snapshot.pin_drift(definition), definition.pin_version()) {
            (PinDrift::Update, Some(pin)) => {
                let outcome =
                    self.add_pin(&definition.id, pin, definition.parsed_pin_type(), true);
                if outcome.is_applied() {
                    result.pin_updated(definition);
                }
                result.side_effect(&definition.id, PinAction::Add, outcome);
            }
            (PinDrift::Remove, _) => {
                let outcome = self.remove_pin(&definition.id);
                if outcome.is_applied() {
                    result.pin_removed(definition);
                }
                result.side_effect(&definition.id, PinAction::Remove, outcome);
            }
            (PinDrift::InSync, Some(_)) => {
                debug!(id = %definition.id, "pin already matches");
                result.side_effect(&definition.id, PinAction::Add, BestEffort::Skipped);
            }
            _ => {}
        }
    }

    fn best_effort(&self, operation: Operation, id: &str, args: &[String]) -> BestEffort {
        match self.invoke(operation, args) {
            Ok(invocation) if invocation.exit_code == SUCCESS => BestEffort::Applied,
            Ok(invocation) => {
                warn!(id, code = invocation.exit_code, ?operation, "pin operation failed, ignoring");
                BestEffort::Ignored {
                    code: invocation.exit_code,
                }
            }
            Err(e) => {
                warn!(id, error = %e, ?operation, "pin operation could not be started, ignoring");
                BestEffort::Ignored {
                    code: INVOCATION_ERROR,
                }
            }
        }
    }

    fn invoke(&self, operation: Operation, args: &[String]) -> Result<Invocation> {
        let argv = operation.command_line(args);
        debug!(command = %display_command(&argv), "invoking package manager");
        let invocation = self.invoker.run(&argv)?;
        if invocation.exit_code != SUCCESS && !invocation.stderr.trim().is_empty() {
            debug!(code = invocation.exit_code, stderr = %invocation.stderr.trim(), "package manager stderr");
        }
        Ok(invocation)
    }

    fn check_cancelled(&self, result: &mut SyncResultBuilder) -> bool {
        if !result.is_interrupted() && (self.cancelled)() {
            warn!("cancellation requested, stopping before the next package");
            result.interrupt();
        }
        result.is_interrupted()
    }
}

/// Load the manifest, mapping any failure other than a parse error to
/// `ManifestUnavailable`.
pub fn load_manifest(manifest: &dyn ManifestStore) -> Result<Vec<PackageDefinition>> {
    manifest.get_packages().map_err(|e| match e {
        SyncError::ManifestUnavailable(_) | SyncError::ManifestParse { .. } => e,
        other => SyncError::ManifestUnavailable(format!("{}: {}", manifest.describe(), other)),
    })
}

fn display_command(argv: &[String]) -> String {
    shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
}

#[cfg(test)]
mod tests;
