pub mod backends;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod project_identity;
pub mod traits;
pub mod ui;
pub mod utils;

use clap::Parser;
use config::settings::Settings;
use std::process::exit;

/// Run pkgsync CLI entrypoint.
pub fn run_cli() {
    let args = cli::args::Cli::parse();

    // Color mode comes from settings; a broken settings file surfaces later
    // with a proper error from the command itself.
    let color = Settings::load()
        .map(|settings| settings.color())
        .unwrap_or_else(|_| "auto".to_string());
    ui::init_colors(&color);
    ui::set_quiet(args.global.quiet);
    logging::init(args.global.verbose);

    // Cancellation is cooperative: the engine stops between packages.
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        ui::mark_interrupted();
        ui::warning("Cancellation requested; finishing the current package first.");
    }) {
        ui::warning(&format!("Could not install Ctrl-C handler: {}", e));
    }

    if let Err(e) = cli::dispatcher::dispatch(&args) {
        ui::error(&format!("{}", e));
        exit(1);
    }
}
