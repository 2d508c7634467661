//! Settings Command
//!
//! Manage pkgsync configuration settings.

use crate::config::settings::{self as keys, Settings};
use crate::error::{Result, SyncError};
use crate::ui as output;

/// Settings command
#[derive(Debug)]
pub enum SettingsCommand {
    Set { key: String, value: String },
    Get { key: String },
    Show,
    Reset { key: String },
}

pub fn run(command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Set { key, value } => {
            let mut settings = Settings::load()?;
            settings.set(&key, &value)?;
            output::success(&format!("Set {} = {}", key, value.trim()));
        }
        SettingsCommand::Get { key } => {
            keys::validate_key(&key)?;
            let settings = Settings::load()?;
            match effective_value(&settings, &key) {
                Some(value) => println!("{}", value),
                None => {
                    return Err(SyncError::ConfigError(format!("Setting '{}' is not set", key)));
                }
            }
        }
        SettingsCommand::Show => {
            let settings = Settings::load()?;
            show_all_settings(&settings);
        }
        SettingsCommand::Reset { key } => {
            let mut settings = Settings::load()?;
            settings.reset(&key)?;
            output::success(&format!("Reset {} to default", key));
        }
    }

    Ok(())
}

/// Value in effect, environment overrides included.
fn effective_value(settings: &Settings, key: &str) -> Option<String> {
    match key {
        keys::GIST_ID => settings.gist_id(),
        keys::GIST_FILE => Some(settings.gist_file()),
        keys::API_URL => Some(settings.api_url()),
        keys::BINARY => Some(settings.binary()),
        keys::REFRESH_PINS => Some(settings.refresh_pins().to_string()),
        keys::COLOR => Some(settings.color()),
        _ => settings.get(key).cloned(),
    }
}

fn show_all_settings(settings: &Settings) {
    output::header("Current Settings");

    for key in [
        keys::GIST_ID,
        keys::GIST_FILE,
        keys::API_URL,
        keys::BINARY,
        keys::REFRESH_PINS,
        keys::COLOR,
    ] {
        let value = effective_value(settings, key).unwrap_or_else(|| "(not set)".to_string());
        println!("  {}: {}", key, value);
    }
    println!(
        "  token: {}",
        if settings.token().is_some() { "(from environment)" } else { "(not set)" }
    );

    println!();
    output::info(&format!("Settings file: {}", settings.path().display()));
    println!("  refresh-pins: true, false");
    println!("  color:        auto, always, never");
}
