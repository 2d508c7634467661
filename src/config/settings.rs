//! Settings Module
//!
//! Persistent pkgsync settings stored as KDL in the config directory:
//!
//! ```kdl
//! settings {
//!     gist-id "0123abcd"
//!     binary "winget"
//!     refresh-pins "true"
//! }
//! ```
//!
//! `PKGSYNC_*` environment variables override the file for the keys that
//! have one.

use crate::error::{Result, SyncError};
use crate::project_identity;
use crate::utils::paths;
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const GIST_ID: &str = "gist-id";
pub const GIST_FILE: &str = "gist-file";
pub const API_URL: &str = "api-url";
pub const BINARY: &str = "binary";
pub const REFRESH_PINS: &str = "refresh-pins";
pub const COLOR: &str = "color";

const VALID_KEYS: [&str; 6] = [GIST_ID, GIST_FILE, API_URL, BINARY, REFRESH_PINS, COLOR];

const DEFAULT_GIST_FILE: &str = "packages.yaml";
const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_BINARY: &str = "winget";

/// Settings manager
#[derive(Debug, Clone)]
pub struct Settings {
    settings_file: PathBuf,
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Load settings from the config directory, or defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(paths::settings_file()?)
    }

    pub fn load_from(settings_file: PathBuf) -> Result<Self> {
        let mut values = Self::defaults();
        if settings_file.exists() {
            let content = fs::read_to_string(&settings_file).map_err(|e| SyncError::IoError {
                path: settings_file.clone(),
                source: e,
            })?;
            values.extend(parse_settings(&content)?);
        }

        Ok(Self {
            settings_file,
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.settings_file
    }

    /// Raw value as stored in the file (no environment overrides)
    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let value = value.trim();
        validate_value(key, value)?;

        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    /// Reset a setting to its default; keys without a default are removed
    pub fn reset(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;

        match Self::defaults().remove(key) {
            Some(default) => {
                self.values.insert(key.to_string(), default);
            }
            None => {
                self.values.remove(key);
            }
        }
        self.save()
    }

    pub fn all(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn gist_id(&self) -> Option<String> {
        project_identity::env_get("GIST_ID").or_else(|| self.non_empty(GIST_ID))
    }

    pub fn gist_file(&self) -> String {
        self.non_empty(GIST_FILE)
            .unwrap_or_else(|| DEFAULT_GIST_FILE.to_string())
    }

    pub fn api_url(&self) -> String {
        project_identity::env_get("API_URL")
            .or_else(|| self.non_empty(API_URL))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Package manager executable, by name or path
    pub fn binary(&self) -> String {
        project_identity::env_get("BINARY")
            .or_else(|| self.non_empty(BINARY))
            .unwrap_or_else(|| DEFAULT_BINARY.to_string())
    }

    /// Re-read the inventory before the pin pass
    pub fn refresh_pins(&self) -> bool {
        self.non_empty(REFRESH_PINS).as_deref() != Some("false")
    }

    pub fn color(&self) -> String {
        self.non_empty(COLOR).unwrap_or_else(|| "auto".to_string())
    }

    /// Token for the gist API. Never stored in the settings file.
    pub fn token(&self) -> Option<String> {
        project_identity::env_get("TOKEN").or_else(|| {
            std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty())
        })
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_file.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(&self.settings_file, render_settings(&self.values)).map_err(|e| {
            SyncError::IoError {
                path: self.settings_file.clone(),
                source: e,
            }
        })
    }

    fn defaults() -> BTreeMap<String, String> {
        let mut defaults = BTreeMap::new();
        defaults.insert(GIST_FILE.to_string(), DEFAULT_GIST_FILE.to_string());
        defaults.insert(API_URL.to_string(), DEFAULT_API_URL.to_string());
        defaults.insert(BINARY.to_string(), DEFAULT_BINARY.to_string());
        defaults.insert(REFRESH_PINS.to_string(), "true".to_string());
        defaults.insert(COLOR.to_string(), "auto".to_string());
        defaults
    }
}

pub fn validate_key(key: &str) -> Result<()> {
    if !VALID_KEYS.contains(&key) {
        return Err(SyncError::ConfigError(format!(
            "Unknown setting: '{}'. Valid settings: {}",
            key,
            VALID_KEYS.join(", ")
        )));
    }

    Ok(())
}

fn one_of(key: &str, value: &str, valid: &[&str]) -> Result<()> {
    if valid.contains(&value) {
        return Ok(());
    }
    Err(SyncError::ConfigError(format!(
        "Invalid value for '{}': '{}'. Valid: {}",
        key,
        value,
        valid.join(", ")
    )))
}

pub fn validate_value(key: &str, value: &str) -> Result<()> {
    match key {
        COLOR => one_of(key, value, &["auto", "always", "never"]),
        REFRESH_PINS => one_of(key, value, &["true", "false"]),
        API_URL => {
            if value.starts_with("https://") || value.starts_with("http://") {
                Ok(())
            } else {
                Err(SyncError::ConfigError(format!(
                    "Invalid value for '{}': '{}'. Expected an http(s) URL",
                    key, value
                )))
            }
        }
        GIST_FILE | BINARY if value.is_empty() => Err(SyncError::ConfigError(format!(
            "'{}' cannot be empty",
            key
        ))),
        _ => Ok(()),
    }
}

/// Read `key value` pairs, either inside a `settings { }` block or at top level
fn parse_settings(content: &str) -> Result<BTreeMap<String, String>> {
    let doc = KdlDocument::parse(content)?;
    let mut values = BTreeMap::new();

    for node in doc.nodes() {
        if node.name().value() == "settings" {
            if let Some(children) = node.children() {
                for child in children.nodes() {
                    read_setting(child, &mut values);
                }
            }
        } else {
            read_setting(node, &mut values);
        }
    }

    Ok(values)
}

fn read_setting(node: &KdlNode, values: &mut BTreeMap<String, String>) {
    let key = node.name().value();
    if !VALID_KEYS.contains(&key) {
        return;
    }

    let value = node.entries().first().and_then(|entry| match entry.value() {
        KdlValue::String(s) => Some(s.clone()),
        KdlValue::Bool(b) => Some(b.to_string()),
        KdlValue::Integer(i) => Some(i.to_string()),
        _ => None,
    });

    if let Some(value) = value {
        values.insert(key.to_string(), value);
    }
}

fn render_settings(values: &BTreeMap<String, String>) -> String {
    let mut block = KdlDocument::new();
    for (key, value) in values {
        let mut node = KdlNode::new(key.as_str());
        node.push(KdlEntry::new(KdlValue::from(value.clone())));
        block.nodes_mut().push(node);
    }

    let mut settings = KdlNode::new("settings");
    settings.set_children(block);

    let mut doc = KdlDocument::new();
    doc.nodes_mut().push(settings);
    doc.autoformat();

    format!(
        "// {} settings\n// Managed by `{} settings`\n\n{}",
        project_identity::DISPLAY_NAME,
        project_identity::BINARY_NAME,
        doc
    )
}
