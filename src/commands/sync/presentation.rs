use crate::commands::describe_code;
use crate::core::engine::SyncPlan;
use crate::core::result::{BestEffort, PinAction, SyncResult};
use crate::core::types::PackageDefinition;
use crate::ui as output;
use colored::Colorize;

fn version_suffix(definition: &PackageDefinition) -> String {
    definition
        .install_version()
        .map(|v| format!(" {}", v))
        .unwrap_or_default()
}

pub(super) fn show_plan(plan: &SyncPlan) {
    output::header("Planned changes");

    if plan.is_empty() {
        output::success("Everything is up to date");
        return;
    }

    for definition in &plan.uninstall {
        output::indent(&format!("{} {}", "-".red().bold(), definition.id), 1);
    }
    for definition in &plan.install {
        output::indent(
            &format!("{} {}{}", "+".green().bold(), definition.id, version_suffix(definition)),
            1,
        );
    }
    for definition in &plan.pin_update {
        let pin = definition.pin_version().unwrap_or_default();
        output::indent(&format!("{} {} pin {}", "~".yellow().bold(), definition.id, pin), 1);
    }
    for definition in &plan.pin_remove {
        output::indent(&format!("{} {} unpin", "~".yellow().bold(), definition.id), 1);
    }

    output::separator();
    output::info(&format!(
        "{} to uninstall, {} to install, {} pin change(s)",
        plan.uninstall.len(),
        plan.install.len(),
        plan.pin_update.len() + plan.pin_remove.len()
    ));
}

pub(super) fn show_result(result: &SyncResult) {
    output::header("Sync summary");

    for definition in result.uninstalled() {
        output::success(&format!("Uninstalled {}", definition.id));
    }
    for definition in result.installed() {
        output::success(&format!("Installed {}{}", definition.id, version_suffix(definition)));
    }
    for definition in result.pin_updated() {
        output::success(&format!(
            "Pinned {} to {}",
            definition.id,
            definition.pin_version().unwrap_or_default()
        ));
    }
    for definition in result.pin_removed() {
        output::success(&format!("Unpinned {}", definition.id));
    }

    for effect in result.pin_side_effects() {
        if let BestEffort::Ignored { code } = effect.outcome {
            let action = match effect.action {
                PinAction::Add => "pin",
                PinAction::Remove => "unpin",
            };
            output::warning(&format!(
                "Could not {} {} (exit code {})",
                action,
                effect.id,
                describe_code(code)
            ));
        }
    }

    for (definition, code) in result.failed() {
        output::error(&format!("{} failed (exit code {})", definition.id, describe_code(*code)));
    }

    if result.interrupted() {
        output::warning("Sync interrupted; remaining packages were not processed");
    } else if !result.has_changes() && result.failed().is_empty() {
        output::success("Everything is up to date");
    }
}
