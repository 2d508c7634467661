//! List Command
//!
//! Prints the manifest entries. Never touches the machine.

use crate::config::settings::Settings;
use crate::core::engine::load_manifest;
use crate::core::types::{ManifestSource, PackageDefinition};
use crate::error::Result;
use crate::manifest;
use crate::ui as output;
use colored::Colorize;

#[derive(Debug)]
pub struct ListOptions {
    pub source: ManifestSource,
}

fn describe_entry(definition: &PackageDefinition) -> String {
    if definition.uninstall {
        return format!("{} {}", definition.id, "(uninstall)".red());
    }

    let mut line = definition.id.clone();
    if let Some(version) = definition.version.as_deref() {
        line.push_str(&format!(" {}", version.dimmed()));
    }
    if let Some(pin) = definition.pin_version() {
        let pin_type = definition
            .parsed_pin_type()
            .map(|t| format!(", {}", t))
            .unwrap_or_default();
        line.push_str(&format!(" {}", format!("[pinned {}{}]", pin, pin_type).cyan()));
    }
    line
}

pub fn run(options: ListOptions) -> Result<()> {
    let settings = Settings::load()?;
    let store = manifest::open_store(&options.source, &settings)?;
    let mut packages = load_manifest(store.as_ref())?;
    packages.sort_by_key(|p| p.id.to_lowercase());

    output::header(&format!("Manifest: {}", store.describe()));
    if packages.is_empty() {
        output::info("No packages declared");
        return Ok(());
    }

    for definition in &packages {
        println!("  {}", describe_entry(definition));
    }
    output::separator();
    let tombstones = packages.iter().filter(|p| p.uninstall).count();
    output::info(&format!(
        "{} package(s), {} marked for removal",
        packages.len(),
        tombstones
    ));

    Ok(())
}
