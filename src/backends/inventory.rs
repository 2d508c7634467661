//! Installed-package inventory read from the package manager's own
//! `list` and `pin list` output.

use super::parsers::{TableRow, parse_table};
use crate::core::exit_codes::{NO_PACKAGES_FOUND, SUCCESS};
use crate::core::types::{LocalPackage, PinRecord, same_id};
use crate::error::{Result, SyncError};
use crate::traits::{LocalPackageInventory, PackageManagerInvoker};
use tracing::debug;

const LIST_COLUMNS: [&str; 5] = ["Name", "Id", "Version", "Available", "Source"];
const PIN_COLUMNS: [&str; 6] = ["Name", "Id", "Version", "Source", "Pin type", "Pinned version"];

const NON_INTERACTIVE: [&str; 2] = ["--accept-source-agreements", "--disable-interactivity"];

/// Default pin type when the table leaves it blank.
const PLAIN_PIN: &str = "Pinning";

pub struct CliInventory<I> {
    invoker: I,
}

impl<I: PackageManagerInvoker> CliInventory<I> {
    pub fn new(invoker: I) -> Self {
        Self { invoker }
    }

    fn query(&self, args: &[&str], titles: &[&str], required: &[&str]) -> Result<Vec<TableRow>> {
        let argv: Vec<String> = args
            .iter()
            .chain(NON_INTERACTIVE.iter())
            .map(|s| s.to_string())
            .collect();

        let invocation = self.invoker.run(&argv)?;
        let table = parse_table(&invocation.stdout, titles, required)?;

        match (invocation.exit_code, table) {
            (_, Some(rows)) => Ok(rows),
            (SUCCESS | NO_PACKAGES_FOUND, None) => Ok(Vec::new()),
            (code, None) => {
                let detail = invocation
                    .stderr
                    .lines()
                    .chain(invocation.stdout.lines())
                    .map(str::trim)
                    .rfind(|line| !line.is_empty())
                    .unwrap_or("no output");
                Err(SyncError::SystemCommandFailed {
                    command: argv.join(" "),
                    reason: format!("exit code {}: {}", code, detail),
                })
            }
        }
    }
}

fn local_package(row: &TableRow) -> Option<LocalPackage> {
    let id = row.get("Id")?.to_string();
    Some(LocalPackage {
        name: row.get("Name").unwrap_or(&id).to_string(),
        version: row.get("Version").unwrap_or("Unknown").to_string(),
        available: row.get("Available").map(str::to_string),
        source: row.get("Source").map(str::to_string),
        id,
    })
}

fn pin_record(row: &TableRow) -> Option<PinRecord> {
    Some(PinRecord {
        id: row.get("Id")?.to_string(),
        pin_type: row.get("Pin type").unwrap_or(PLAIN_PIN).to_string(),
        // The `Version` column is what is installed, not what is pinned.
        version: row.get("Pinned version").map(str::to_string),
    })
}

impl<I: PackageManagerInvoker> LocalPackageInventory for CliInventory<I> {
    fn find_by_id(&self, id: &str) -> Result<Option<LocalPackage>> {
        let rows = self.query(
            &["list", "--id", id, "--exact"],
            &LIST_COLUMNS,
            &["Id", "Version"],
        )?;
        let found = rows
            .iter()
            .filter_map(local_package)
            .find(|pkg| same_id(&pkg.id, id));
        debug!(id, found = found.is_some(), "inventory lookup");
        Ok(found)
    }

    fn list_installed(&self) -> Result<Vec<LocalPackage>> {
        let rows = self.query(&["list"], &LIST_COLUMNS, &["Id", "Version"])?;
        Ok(rows.iter().filter_map(local_package).collect())
    }

    fn list_pins(&self) -> Result<Vec<PinRecord>> {
        let rows = self.query(&["pin", "list"], &PIN_COLUMNS, &["Id"])?;
        Ok(rows.iter().filter_map(pin_record).collect())
    }
}
