//! Outcome of one reconciliation run.

use crate::core::types::PackageDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAction {
    Add,
    Remove,
}

/// Outcome of a best-effort pin operation. Only `Applied` ever reaches the
/// public lists; the other states are kept so callers can see what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestEffort {
    Applied,
    Skipped,
    Ignored { code: i32 },
}

impl BestEffort {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinSideEffect {
    pub id: String,
    pub action: PinAction,
    pub outcome: BestEffort,
}

/// Immutable aggregate handed to the caller once per run.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    installed: Vec<PackageDefinition>,
    uninstalled: Vec<PackageDefinition>,
    pin_updated: Vec<PackageDefinition>,
    pin_removed: Vec<PackageDefinition>,
    failed: Vec<(PackageDefinition, i32)>,
    pin_side_effects: Vec<PinSideEffect>,
    interrupted: bool,
}

impl SyncResult {
    pub fn installed(&self) -> &[PackageDefinition] {
        &self.installed
    }

    pub fn uninstalled(&self) -> &[PackageDefinition] {
        &self.uninstalled
    }

    pub fn pin_updated(&self) -> &[PackageDefinition] {
        &self.pin_updated
    }

    pub fn pin_removed(&self) -> &[PackageDefinition] {
        &self.pin_removed
    }

    pub fn failed(&self) -> &[(PackageDefinition, i32)] {
        &self.failed
    }

    pub fn pin_side_effects(&self) -> &[PinSideEffect] {
        &self.pin_side_effects
    }

    /// Exit code recorded for `id`, if it failed.
    pub fn failure_code(&self, id: &str) -> Option<i32> {
        self.failed
            .iter()
            .find(|(def, _)| def.matches_id(id))
            .map(|(_, code)| *code)
    }

    /// The run stopped early because cancellation was requested.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        !(self.installed.is_empty()
            && self.uninstalled.is_empty()
            && self.pin_updated.is_empty()
            && self.pin_removed.is_empty())
    }
}

#[derive(Debug, Default)]
pub(crate) struct SyncResultBuilder {
    result: SyncResult,
}

impl SyncResultBuilder {
    pub(crate) fn installed(&mut self, definition: &PackageDefinition) {
        debug_assert!(!self.classified(&definition.id));
        self.result.installed.push(definition.clone());
    }

    pub(crate) fn uninstalled(&mut self, definition: &PackageDefinition) {
        debug_assert!(!self.classified(&definition.id));
        self.result.uninstalled.push(definition.clone());
    }

    pub(crate) fn failed(&mut self, definition: &PackageDefinition, code: i32) {
        debug_assert!(!self.classified(&definition.id));
        self.result.failed.push((definition.clone(), code));
    }

    pub(crate) fn pin_updated(&mut self, definition: &PackageDefinition) {
        self.result.pin_updated.push(definition.clone());
    }

    pub(crate) fn pin_removed(&mut self, definition: &PackageDefinition) {
        self.result.pin_removed.push(definition.clone());
    }

    pub(crate) fn side_effect(&mut self, id: &str, action: PinAction, outcome: BestEffort) {
        self.result.pin_side_effects.push(PinSideEffect {
            id: id.to_string(),
            action,
            outcome,
        });
    }

    pub(crate) fn interrupt(&mut self) {
        self.result.interrupted = true;
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.result.interrupted
    }

    fn classified(&self, id: &str) -> bool {
        self.result.installed.iter().any(|d| d.matches_id(id))
            || self.result.uninstalled.iter().any(|d| d.matches_id(id))
            || self.result.failed.iter().any(|(d, _)| d.matches_id(id))
    }

    pub(crate) fn build(self) -> SyncResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_depends_only_on_failures() {
        let mut builder = SyncResultBuilder::default();
        builder.installed(&PackageDefinition::new("A"));
        builder.side_effect("A", PinAction::Add, BestEffort::Ignored { code: 5 });
        let result = builder.build();

        assert!(result.success());
        assert!(result.has_changes());
        assert_eq!(result.pin_side_effects().len(), 1);
        assert!(!result.pin_side_effects()[0].outcome.is_applied());
    }

    #[test]
    fn failure_code_lookup_is_case_insensitive() {
        let mut builder = SyncResultBuilder::default();
        builder.failed(&PackageDefinition::new("Vendor.App"), -1);
        let result = builder.build();

        assert!(!result.success());
        assert_eq!(result.failure_code("vendor.app"), Some(-1));
        assert_eq!(result.failure_code("Other"), None);
    }

    #[test]
    fn empty_result_is_successful_without_changes() {
        let result = SyncResultBuilder::default().build();
        assert!(result.success());
        assert!(!result.has_changes());
        assert!(!result.interrupted());
    }
}
