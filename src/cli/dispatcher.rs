//! Command dispatcher
//!
//! Routes CLI commands to their appropriate handlers.

use crate::cli::args::{self, Cli, Command, PinCommand};
use crate::commands;
use crate::commands::settings::SettingsCommand;
use crate::error::Result;

/// Dispatch the parsed CLI command to the appropriate handler
pub fn dispatch(args: &Cli) -> Result<()> {
    let source = args.global.manifest_source();

    match &args.command {
        Command::Sync {
            dry_run,
            no_refresh_pins,
        } => commands::sync::run(commands::sync::SyncOptions {
            source,
            dry_run: *dry_run,
            refresh_pins: !*no_refresh_pins,
        }),

        Command::Install {
            id,
            version,
            pin,
            pin_type,
            installer,
            no_save,
        } => commands::install::run(commands::install::InstallOptions {
            id: id.clone(),
            version: version.clone(),
            pin: pin.clone(),
            pin_type: pin_type.map(Into::into),
            installer: installer.clone().into(),
            save: !*no_save,
            source,
        }),

        Command::Uninstall {
            id,
            force,
            interactive,
            silent,
            scope,
            log,
            accept_source_agreements,
            no_save,
        } => commands::uninstall::run(commands::uninstall::UninstallOptions {
            id: id.clone(),
            installer: args::InstallerArgs {
                force: *force,
                interactive: *interactive,
                silent: *silent,
                scope: scope.clone(),
                log: log.clone(),
                accept_source_agreements: *accept_source_agreements,
                ..Default::default()
            }
            .into(),
            save: !*no_save,
            source,
        }),

        Command::Pin { command } => commands::pin::run(match command {
            PinCommand::Add {
                id,
                version,
                pin_type,
                force,
                no_save,
            } => commands::pin::PinOptions::Add {
                id: id.clone(),
                version: version.clone(),
                pin_type: pin_type.map(Into::into),
                force: *force,
                save: !*no_save,
                source,
            },
            PinCommand::Remove { id, no_save } => commands::pin::PinOptions::Remove {
                id: id.clone(),
                save: !*no_save,
                source,
            },
        }),

        Command::List => commands::list::run(commands::list::ListOptions { source }),

        Command::Settings { command } => commands::settings::run(match command {
            args::SettingsCommand::Show => SettingsCommand::Show,
            args::SettingsCommand::Get { key } => SettingsCommand::Get { key: key.clone() },
            args::SettingsCommand::Set { key, value } => SettingsCommand::Set {
                key: key.clone(),
                value: value.clone(),
            },
            args::SettingsCommand::Reset { key } => SettingsCommand::Reset { key: key.clone() },
        }),

        Command::Completions { shell } => commands::completions::run(*shell),
    }
}
