use super::*;
use clap::CommandFactory;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("pkgsync").chain(args.iter().copied()))
        .expect("args should parse")
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn sync_flags_parse() {
    let cli = parse(&["sync", "--dry-run", "--no-refresh-pins"]);
    match cli.command {
        Command::Sync {
            dry_run,
            no_refresh_pins,
        } => {
            assert!(dry_run);
            assert!(no_refresh_pins);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn global_source_flags_work_after_subcommand() {
    let cli = parse(&["list", "--file", "packages.yaml"]);
    assert_eq!(
        cli.global.manifest_source(),
        ManifestSource::File(PathBuf::from("packages.yaml"))
    );

    let cli = parse(&["--url", "https://example.com/p.yaml", "sync"]);
    assert_eq!(
        cli.global.manifest_source(),
        ManifestSource::Url("https://example.com/p.yaml".into())
    );

    let cli = parse(&["sync"]);
    assert_eq!(cli.global.manifest_source(), ManifestSource::Default);
}

#[test]
fn file_and_url_conflict() {
    let result = Cli::try_parse_from([
        "pkgsync",
        "--file",
        "p.yaml",
        "--url",
        "https://example.com/p.yaml",
        "list",
    ]);
    assert!(result.is_err());
}

#[test]
fn install_collects_installer_options() {
    let cli = parse(&[
        "install",
        "Vendor.App",
        "--version",
        "1.2",
        "--pin",
        "1.2",
        "--pin-type",
        "blocking",
        "--scope",
        "machine",
        "--override",
        "/S /NORESTART",
        "--ignore-security-hash",
        "--silent",
    ]);

    match cli.command {
        Command::Install {
            id,
            version,
            pin,
            pin_type,
            installer,
            no_save,
        } => {
            assert_eq!(id, "Vendor.App");
            assert_eq!(version.as_deref(), Some("1.2"));
            assert_eq!(pin.as_deref(), Some("1.2"));
            assert_eq!(pin_type, Some(PinTypeArg::Blocking));
            assert!(!no_save);

            let options = InstallerOptions::from(installer);
            assert_eq!(options.scope.as_deref(), Some("machine"));
            assert_eq!(options.override_args.as_deref(), Some("/S /NORESTART"));
            assert!(options.allow_hash_mismatch);
            assert!(options.silent);
            assert!(!options.force);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn pin_type_requires_pin() {
    let result = Cli::try_parse_from(["pkgsync", "install", "Vendor.App", "--pin-type", "gating"]);
    assert!(result.is_err());
}

#[test]
fn interactive_conflicts_with_silent() {
    let result = Cli::try_parse_from(["pkgsync", "install", "Vendor.App", "-i", "--silent"]);
    assert!(result.is_err());
}

#[test]
fn pin_subcommands_parse() {
    let cli = parse(&["pin", "add", "Vendor.App", "--version", "2.0", "--type", "gating", "--force"]);
    match cli.command {
        Command::Pin {
            command:
                PinCommand::Add {
                    id,
                    version,
                    pin_type,
                    force,
                    no_save,
                },
        } => {
            assert_eq!(id, "Vendor.App");
            assert_eq!(version.as_deref(), Some("2.0"));
            assert_eq!(pin_type.map(PinType::from), Some(PinType::Gating));
            assert!(force);
            assert!(!no_save);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let cli = parse(&["pin", "remove", "Vendor.App", "--no-save"]);
    assert!(matches!(
        cli.command,
        Command::Pin {
            command: PinCommand::Remove { no_save: true, .. }
        }
    ));
}
