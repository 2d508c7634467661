//! Mapping from package definitions to package-manager argument lists.
//!
//! Flags are emitted in a fixed order: identity, version, boolean switches,
//! then string-valued options. Nothing is emitted for a false boolean or an
//! absent/empty string.

use crate::core::types::{InstallerOptions, PackageDefinition, PinType, non_empty};

pub mod flags {
    pub const ID: &str = "--id";
    pub const VERSION: &str = "--version";

    pub const FORCE: &str = "--force";
    pub const SKIP_DEPENDENCIES: &str = "--skip-dependencies";
    pub const ALLOW_HASH_MISMATCH: &str = "--ignore-security-hash";
    pub const ACCEPT_PACKAGE_AGREEMENTS: &str = "--accept-package-agreements";
    pub const ACCEPT_SOURCE_AGREEMENTS: &str = "--accept-source-agreements";
    pub const INTERACTIVE: &str = "--interactive";
    pub const SILENT: &str = "--silent";

    pub const SCOPE: &str = "--scope";
    pub const ARCHITECTURE: &str = "--architecture";
    pub const LOCATION: &str = "--location";
    pub const LOCALE: &str = "--locale";
    pub const HEADER: &str = "--header";
    pub const INSTALLER_TYPE: &str = "--installer-type";
    pub const CUSTOM: &str = "--custom";
    pub const OVERRIDE: &str = "--override";
    pub const LOG: &str = "--log";

    pub const GATING: &str = "--gating";
    pub const BLOCKING: &str = "--blocking";
}

/// Package-manager operation; supplies the verb tokens preceding the options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Install,
    Uninstall,
    PinAdd,
    PinRemove,
}

impl Operation {
    pub fn verb(&self) -> &'static [&'static str] {
        match self {
            Self::Install => &["install"],
            Self::Uninstall => &["uninstall"],
            Self::PinAdd => &["pin", "add"],
            Self::PinRemove => &["pin", "remove"],
        }
    }

    /// Full argv: verb tokens followed by `args`.
    pub fn command_line(&self, args: &[String]) -> Vec<String> {
        self.verb()
            .iter()
            .map(|s| s.to_string())
            .chain(args.iter().cloned())
            .collect()
    }
}

/// Ordered token accumulator.
#[derive(Debug, Default)]
pub struct ArgumentBuilder {
    args: Vec<String>,
}

impl ArgumentBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            args: vec![flags::ID.to_string(), id.to_string()],
        }
    }

    pub fn value(mut self, flag: &str, value: Option<&str>) -> Self {
        if let Some(value) = non_empty(value) {
            self.args.push(flag.to_string());
            self.args.push(value.to_string());
        }
        self
    }

    pub fn switch(mut self, flag: &str, enabled: bool) -> Self {
        if enabled {
            self.args.push(flag.to_string());
        }
        self
    }

    pub fn pin_type(self, pin_type: Option<PinType>) -> Self {
        match pin_type {
            Some(PinType::Gating) => self.switch(flags::GATING, true),
            Some(PinType::Blocking) => self.switch(flags::BLOCKING, true),
            None => self,
        }
    }

    pub fn build(self) -> Vec<String> {
        self.args
    }
}

pub fn install_args(definition: &PackageDefinition) -> Vec<String> {
    install_args_with(
        &definition.id,
        definition.install_version(),
        &definition.options,
    )
}

/// Install arguments for a standalone (non-manifest) request.
pub fn install_args_with(id: &str, version: Option<&str>, options: &InstallerOptions) -> Vec<String> {
    ArgumentBuilder::new(id)
        .value(flags::VERSION, version)
        .switch(flags::FORCE, options.force)
        .switch(flags::SKIP_DEPENDENCIES, options.skip_dependencies)
        .switch(flags::ALLOW_HASH_MISMATCH, options.allow_hash_mismatch)
        .switch(
            flags::ACCEPT_PACKAGE_AGREEMENTS,
            options.accept_package_agreements,
        )
        .switch(
            flags::ACCEPT_SOURCE_AGREEMENTS,
            options.accept_source_agreements,
        )
        .switch(flags::INTERACTIVE, options.interactive)
        .switch(flags::SILENT, options.silent)
        .value(flags::SCOPE, options.scope.as_deref())
        .value(flags::ARCHITECTURE, options.architecture.as_deref())
        .value(flags::LOCATION, options.location.as_deref())
        .value(flags::LOCALE, options.locale.as_deref())
        .value(flags::HEADER, options.header.as_deref())
        .value(flags::INSTALLER_TYPE, options.installer_type.as_deref())
        .value(flags::CUSTOM, options.custom.as_deref())
        .value(flags::OVERRIDE, options.override_args.as_deref())
        .value(flags::LOG, options.log.as_deref())
        .build()
}

pub fn uninstall_args(definition: &PackageDefinition) -> Vec<String> {
    uninstall_args_with(&definition.id, &definition.options)
}

/// Uninstall only honours the options the operation understands.
pub fn uninstall_args_with(id: &str, options: &InstallerOptions) -> Vec<String> {
    ArgumentBuilder::new(id)
        .switch(flags::FORCE, options.force)
        .switch(
            flags::ACCEPT_SOURCE_AGREEMENTS,
            options.accept_source_agreements,
        )
        .switch(flags::INTERACTIVE, options.interactive)
        .switch(flags::SILENT, options.silent)
        .value(flags::SCOPE, options.scope.as_deref())
        .value(flags::LOG, options.log.as_deref())
        .build()
}

pub fn pin_add_args(
    id: &str,
    version: Option<&str>,
    pin_type: Option<PinType>,
    force: bool,
) -> Vec<String> {
    ArgumentBuilder::new(id)
        .value(flags::VERSION, version)
        .pin_type(pin_type)
        .switch(flags::FORCE, force)
        .build()
}

pub fn pin_remove_args(id: &str) -> Vec<String> {
    ArgumentBuilder::new(id).build()
}
