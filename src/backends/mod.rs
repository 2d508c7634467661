//! # Package manager backend
//!
//! Everything that touches the real package-manager executable:
//!
//! - [`command_exec`] spawns the process and captures its output.
//! - [`invoker`] implements `PackageManagerInvoker` on top of it.
//! - [`inventory`] implements `LocalPackageInventory` by running the
//!   read-only `list` / `pin list` queries and parsing their tables with
//!   [`parsers`].

pub mod command_exec;
pub mod inventory;
pub mod invoker;
pub mod parsers;

pub use inventory::CliInventory;
pub use invoker::ProcessInvoker;
