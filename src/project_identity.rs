//! Central project identity contract.
//!
//! This module is the single source of truth for runtime identity values.

pub const DISPLAY_NAME: &str = "pkgsync";
pub const BINARY_NAME: &str = "pkgsync";
pub const PROJECT_QUALIFIER: &str = "com";
pub const PROJECT_ORG: &str = "pkgsync";
pub const ENV_PREFIX: &str = "PKGSYNC";
pub const SETTINGS_FILE_BASENAME: &str = "settings.kdl";
pub const LOCK_FILE_BASENAME: &str = "pkgsync.lock";
pub const USER_AGENT: &str = concat!("pkgsync/", env!("CARGO_PKG_VERSION"));

pub fn env_key(suffix: &str) -> String {
    format!("{}_{}", ENV_PREFIX, suffix)
}

/// Read a `PKGSYNC_*` variable, treating empty values as unset.
pub fn env_get(suffix: &str) -> Option<String> {
    std::env::var(env_key(suffix))
        .ok()
        .filter(|value| !value.trim().is_empty())
}
