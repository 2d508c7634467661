use crate::core::types::{InstallerOptions, ManifestSource, PinType};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pkgsync",
    about = "Keep installed packages converged with a declarative manifest",
    long_about = "Reads a package manifest (a gist, a URL, or a local file) and drives the \
                  package manager until the machine matches it: tombstoned packages are \
                  removed, missing packages installed and pins aligned.",
    version,
    next_line_help = false,
    term_width = 80
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Verbose output (debug diagnostics on stderr)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Quiet mode
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Use a local manifest file instead of the default remote one
    #[arg(long, value_name = "PATH", global = true, conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// Read the manifest from a URL (read-only)
    #[arg(long, value_name = "URL", global = true)]
    pub url: Option<String>,
}

impl GlobalFlags {
    pub fn manifest_source(&self) -> ManifestSource {
        ManifestSource::resolve(self.file.clone(), self.url.clone())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Converge installed packages and pins onto the manifest
    Sync {
        /// Show what would change without invoking the package manager
        #[arg(long)]
        dry_run: bool,

        /// Do not re-read the inventory before reconciling pins
        #[arg(long)]
        no_refresh_pins: bool,
    },

    /// Install a package and record it in the manifest
    Install {
        /// Package identifier
        id: String,

        /// Version to install
        #[arg(long)]
        version: Option<String>,

        /// Pin the package to this version after installing
        #[arg(long, value_name = "VERSION")]
        pin: Option<String>,

        /// Pin type used with --pin
        #[arg(long, value_enum, requires = "pin")]
        pin_type: Option<PinTypeArg>,

        #[command(flatten)]
        installer: InstallerArgs,

        /// Do not write the manifest
        #[arg(long)]
        no_save: bool,
    },

    /// Uninstall a package and mark it as removed in the manifest
    Uninstall {
        /// Package identifier
        id: String,

        /// Direct run of the command and continue with non security related issues
        #[arg(long)]
        force: bool,

        /// Request interactive uninstallation
        #[arg(short = 'i', long, conflicts_with = "silent")]
        interactive: bool,

        /// Request silent uninstallation
        #[arg(long)]
        silent: bool,

        /// Select the installed package scope
        #[arg(long, value_name = "SCOPE")]
        scope: Option<String>,

        /// Log location
        #[arg(short = 'o', long, value_name = "PATH")]
        log: Option<String>,

        /// Accept all source agreements
        #[arg(long)]
        accept_source_agreements: bool,

        /// Do not write the manifest
        #[arg(long)]
        no_save: bool,
    },

    /// Manage package pins
    Pin {
        #[command(subcommand)]
        command: PinCommand,
    },

    /// Print the manifest entries
    List,

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum PinCommand {
    /// Pin an installed package
    Add {
        /// Package identifier
        id: String,

        /// Version to pin (defaults to the installed version)
        #[arg(long)]
        version: Option<String>,

        /// Pin type
        #[arg(long = "type", value_enum)]
        pin_type: Option<PinTypeArg>,

        /// Replace an existing pin
        #[arg(long)]
        force: bool,

        /// Do not write the manifest
        #[arg(long)]
        no_save: bool,
    },

    /// Remove a package pin
    Remove {
        /// Package identifier
        id: String,

        /// Do not write the manifest
        #[arg(long)]
        no_save: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show all settings
    Show,
    /// Print one setting
    Get { key: String },
    /// Change a setting
    Set { key: String, value: String },
    /// Reset a setting to its default
    Reset { key: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinTypeArg {
    Gating,
    Blocking,
}

impl From<PinTypeArg> for PinType {
    fn from(value: PinTypeArg) -> Self {
        match value {
            PinTypeArg::Gating => PinType::Gating,
            PinTypeArg::Blocking => PinType::Blocking,
        }
    }
}

/// Installer options accepted by `install`, mirroring the manifest fields.
#[derive(Args, Debug, Default, Clone)]
pub struct InstallerArgs {
    /// Select install scope (user or machine)
    #[arg(long, value_name = "SCOPE", help_heading = "Installer")]
    pub scope: Option<String>,

    /// Select the architecture
    #[arg(short = 'a', long, value_name = "ARCH", help_heading = "Installer")]
    pub architecture: Option<String>,

    /// Location to install to (if supported)
    #[arg(short = 'l', long, value_name = "PATH", help_heading = "Installer")]
    pub location: Option<String>,

    /// Locale to use (BCP47 format)
    #[arg(long, value_name = "LOCALE", help_heading = "Installer")]
    pub locale: Option<String>,

    /// Optional Windows-Package-Manager REST source HTTP header
    #[arg(long, value_name = "HEADER", help_heading = "Installer")]
    pub header: Option<String>,

    /// Select the installer type
    #[arg(long, value_name = "TYPE", help_heading = "Installer")]
    pub installer_type: Option<String>,

    /// Arguments to be passed on to the installer in addition to the defaults
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true, help_heading = "Installer")]
    pub custom: Option<String>,

    /// Override arguments to be passed on to the installer
    #[arg(long = "override", value_name = "ARGS", allow_hyphen_values = true, help_heading = "Installer")]
    pub override_args: Option<String>,

    /// Log location (if supported)
    #[arg(short = 'o', long, value_name = "PATH", help_heading = "Installer")]
    pub log: Option<String>,

    /// Direct run of the command and continue with non security related issues
    #[arg(long, help_heading = "Installer")]
    pub force: bool,

    /// Skip processing package dependencies and Windows features
    #[arg(long, help_heading = "Installer")]
    pub skip_dependencies: bool,

    /// Ignore the installer hash check failure
    #[arg(long = "ignore-security-hash", help_heading = "Installer")]
    pub allow_hash_mismatch: bool,

    /// Accept all license agreements for packages
    #[arg(long, help_heading = "Installer")]
    pub accept_package_agreements: bool,

    /// Accept all source agreements
    #[arg(long, help_heading = "Installer")]
    pub accept_source_agreements: bool,

    /// Request interactive installation
    #[arg(short = 'i', long, conflicts_with = "silent", help_heading = "Installer")]
    pub interactive: bool,

    /// Request silent installation
    #[arg(long, help_heading = "Installer")]
    pub silent: bool,
}

impl From<InstallerArgs> for InstallerOptions {
    fn from(args: InstallerArgs) -> Self {
        Self {
            scope: args.scope,
            architecture: args.architecture,
            location: args.location,
            locale: args.locale,
            header: args.header,
            installer_type: args.installer_type,
            custom: args.custom,
            override_args: args.override_args,
            log: args.log,
            force: args.force,
            skip_dependencies: args.skip_dependencies,
            allow_hash_mismatch: args.allow_hash_mismatch,
            accept_package_agreements: args.accept_package_agreements,
            accept_source_agreements: args.accept_source_agreements,
            interactive: args.interactive,
            silent: args.silent,
        }
    }
}

#[cfg(test)]
mod tests;
