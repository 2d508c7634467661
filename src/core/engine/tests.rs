use super::*;
use crate::core::exit_codes::PACKAGE_ALREADY_INSTALLED;
use crate::core::result::PinSideEffect;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy)]
enum Script {
    /// Return this code without changing the machine.
    Exit(i32),
    /// Change the machine, then return this code anyway.
    ApplyThenExit(i32),
    /// Fail to start the process.
    Error,
}

#[derive(Default)]
struct Machine {
    installed: Vec<LocalPackage>,
    pins: Vec<PinRecord>,
    calls: Vec<Vec<String>>,
    scripts: HashMap<(String, String), Script>,
    list_calls: usize,
    fail_listing_after: Option<usize>,
}

impl Machine {
    fn apply(&mut self, verb: &str, id: &str, version: Option<String>) {
        match verb {
            "install" => self.installed.push(local(id, version.as_deref().unwrap_or("1.0"))),
            "uninstall" => self.installed.retain(|p| !p.id.eq_ignore_ascii_case(id)),
            "pin add" => {
                self.pins.retain(|p| !p.id.eq_ignore_ascii_case(id));
                self.pins.push(PinRecord {
                    id: id.to_string(),
                    pin_type: "Pinning".into(),
                    version,
                });
            }
            "pin remove" => self.pins.retain(|p| !p.id.eq_ignore_ascii_case(id)),
            other => panic!("unexpected verb {other}"),
        }
    }
}

type Shared = Rc<RefCell<Machine>>;

struct FakeInvoker(Shared);

impl PackageManagerInvoker for FakeInvoker {
    fn run(&self, argv: &[String]) -> Result<Invocation> {
        let mut machine = self.0.borrow_mut();
        machine.calls.push(argv.to_vec());

        let verb = if argv[0] == "pin" {
            format!("pin {}", argv[1])
        } else {
            argv[0].clone()
        };
        let id = flag_value(argv, "--id").expect("id flag");
        let version = flag_value(argv, "--version");

        match machine.scripts.get(&(verb.clone(), id.to_lowercase())).copied() {
            Some(Script::Error) => Err(SyncError::SystemCommandFailed {
                command: verb,
                reason: "spawn failed".into(),
            }),
            Some(Script::Exit(code)) => Ok(Invocation::exited(code)),
            Some(Script::ApplyThenExit(code)) => {
                machine.apply(&verb, &id, version);
                Ok(Invocation::exited(code))
            }
            None => {
                machine.apply(&verb, &id, version);
                Ok(Invocation::exited(0))
            }
        }
    }
}

struct FakeInventory(Shared);

impl FakeInventory {
    fn check_listing(&self) -> Result<()> {
        let mut machine = self.0.borrow_mut();
        machine.list_calls += 1;
        match machine.fail_listing_after {
            Some(limit) if machine.list_calls > limit => {
                Err(SyncError::Other("inventory unavailable".into()))
            }
            _ => Ok(()),
        }
    }
}

impl LocalPackageInventory for FakeInventory {
    fn find_by_id(&self, id: &str) -> Result<Option<LocalPackage>> {
        let machine = self.0.borrow();
        Ok(machine
            .installed
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(id))
            .cloned())
    }

    fn list_installed(&self) -> Result<Vec<LocalPackage>> {
        self.check_listing()?;
        Ok(self.0.borrow().installed.clone())
    }

    fn list_pins(&self) -> Result<Vec<PinRecord>> {
        Ok(self.0.borrow().pins.clone())
    }
}

struct MemoryStore(Vec<PackageDefinition>);

impl ManifestStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".into()
    }

    fn get_packages(&self) -> Result<Vec<PackageDefinition>> {
        Ok(self.0.clone())
    }

    fn save_packages(&self, _packages: &[PackageDefinition]) -> Result<()> {
        Ok(())
    }
}

struct BrokenStore(fn() -> SyncError);

impl ManifestStore for BrokenStore {
    fn describe(&self) -> String {
        "broken".into()
    }

    fn get_packages(&self) -> Result<Vec<PackageDefinition>> {
        Err((self.0)())
    }

    fn save_packages(&self, _packages: &[PackageDefinition]) -> Result<()> {
        Ok(())
    }
}

fn flag_value(argv: &[String], flag: &str) -> Option<String> {
    argv.iter()
        .position(|a| a == flag)
        .and_then(|i| argv.get(i + 1))
        .cloned()
}

fn local(id: &str, version: &str) -> LocalPackage {
    LocalPackage {
        id: id.to_string(),
        name: id.to_string(),
        version: version.to_string(),
        available: None,
        source: Some("winget".into()),
    }
}

fn pinned(id: &str, version: &str) -> PinRecord {
    PinRecord {
        id: id.to_string(),
        pin_type: "Pinning".into(),
        version: Some(version.to_string()),
    }
}

fn tombstone(id: &str) -> PackageDefinition {
    PackageDefinition {
        uninstall: true,
        ..PackageDefinition::new(id)
    }
}

fn with_version(id: &str, version: &str) -> PackageDefinition {
    PackageDefinition {
        version: Some(version.into()),
        ..PackageDefinition::new(id)
    }
}

fn with_pin(id: &str, pin: &str) -> PackageDefinition {
    PackageDefinition {
        pin: Some(pin.into()),
        ..PackageDefinition::new(id)
    }
}

fn script(machine: &Shared, verb: &str, id: &str, script: Script) {
    machine
        .borrow_mut()
        .scripts
        .insert((verb.to_string(), id.to_lowercase()), script);
}

fn effect(id: &str, action: PinAction, outcome: BestEffort) -> PinSideEffect {
    PinSideEffect {
        id: id.to_string(),
        action,
        outcome,
    }
}

fn ids(defs: &[PackageDefinition]) -> Vec<&str> {
    defs.iter().map(|d| d.id.as_str()).collect()
}

fn argv(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

fn sync_with(machine: &Shared, manifest: Vec<PackageDefinition>) -> SyncResult {
    let invoker = FakeInvoker(machine.clone());
    let inventory = FakeInventory(machine.clone());
    ReconciliationEngine::new(&inventory, &invoker)
        .sync(&MemoryStore(manifest))
        .expect("sync")
}

#[test]
fn converges_mixed_manifest() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("A", "3.0"), local("C", "1.5")];

    let result = sync_with(
        &machine,
        vec![tombstone("A"), with_version("B", "1.0"), with_pin("C", "2.0")],
    );

    assert_eq!(ids(result.uninstalled()), vec!["A"]);
    assert_eq!(ids(result.installed()), vec!["B"]);
    assert_eq!(ids(result.pin_updated()), vec!["C"]);
    assert!(result.pin_removed().is_empty());
    assert!(result.success());

    assert_eq!(
        machine.borrow().calls,
        vec![
            argv(&["uninstall", "--id", "A"]),
            argv(&["install", "--id", "B", "--version", "1.0"]),
            argv(&["pin", "add", "--id", "C", "--version", "2.0", "--force"]),
        ]
    );
}

#[test]
fn second_run_performs_no_invocations() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("A", "3.0"), local("C", "1.5")];
    let manifest = vec![tombstone("A"), with_version("B", "1.0"), with_pin("C", "2.0")];

    sync_with(&machine, manifest.clone());
    let calls_after_first = machine.borrow().calls.len();

    let second = sync_with(&machine, manifest);

    assert_eq!(machine.borrow().calls.len(), calls_after_first);
    assert!(!second.has_changes());
    assert!(second.success());
}

#[test]
fn uninstall_runs_before_install_regardless_of_manifest_order() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("A", "1.0")];

    sync_with(&machine, vec![PackageDefinition::new("B"), tombstone("A")]);

    let calls = machine.borrow().calls.clone();
    let uninstall = calls.iter().position(|c| c[0] == "uninstall").expect("uninstall call");
    let install = calls.iter().position(|c| c[0] == "install").expect("install call");
    assert!(uninstall < install);
}

#[test]
fn missing_tombstone_is_skipped() {
    let machine = Shared::default();

    let result = sync_with(&machine, vec![tombstone("Gone.App")]);

    assert!(machine.borrow().calls.is_empty());
    assert!(result.uninstalled().is_empty());
    assert!(result.success());
}

#[test]
fn sentinel_exit_code_counts_as_installed() {
    let machine = Shared::default();
    script(&machine, "install", "B", Script::Exit(PACKAGE_ALREADY_INSTALLED));

    let result = sync_with(&machine, vec![PackageDefinition::new("B")]);

    assert_eq!(ids(result.installed()), vec!["B"]);
    assert!(result.failed().is_empty());
}

#[test]
fn post_check_overrides_generic_failure_code() {
    let machine = Shared::default();
    script(&machine, "install", "B", Script::ApplyThenExit(1603));

    let result = sync_with(&machine, vec![PackageDefinition::new("B")]);

    assert_eq!(ids(result.installed()), vec!["B"]);
    assert!(result.success());
}

#[test]
fn failed_install_records_observed_code() {
    let machine = Shared::default();
    script(&machine, "install", "B", Script::Exit(1603));

    let result = sync_with(&machine, vec![PackageDefinition::new("B")]);

    assert!(result.installed().is_empty());
    assert_eq!(result.failure_code("B"), Some(1603));
    assert!(!result.success());
}

#[test]
fn thrown_invocation_error_is_isolated_per_package() {
    let machine = Shared::default();
    script(&machine, "install", "Two", Script::Error);

    let result = sync_with(
        &machine,
        vec![
            PackageDefinition::new("One"),
            PackageDefinition::new("Two"),
            PackageDefinition::new("Three"),
        ],
    );

    assert_eq!(ids(result.installed()), vec!["One", "Three"]);
    assert_eq!(result.failed().len(), 1);
    assert_eq!(result.failure_code("Two"), Some(INVOCATION_ERROR));
}

#[test]
fn failed_uninstall_is_recorded_with_its_code() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("A", "1.0")];
    script(&machine, "uninstall", "A", Script::Exit(5));

    let result = sync_with(&machine, vec![tombstone("A")]);

    assert!(result.uninstalled().is_empty());
    assert_eq!(result.failure_code("A"), Some(5));
}

#[test]
fn uninstalling_pinned_package_removes_pin_best_effort() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("A", "1.0")];
    machine.borrow_mut().pins = vec![pinned("A", "1.0")];
    script(&machine, "pin remove", "A", Script::Exit(1));

    let result = sync_with(&machine, vec![tombstone("A")]);

    assert_eq!(ids(result.uninstalled()), vec!["A"]);
    assert!(result.success());
    assert_eq!(
        result.pin_side_effects(),
        &[effect("A", PinAction::Remove, BestEffort::Ignored { code: 1 })]
    );
}

#[test]
fn pin_failure_after_install_keeps_package_installed() {
    let machine = Shared::default();
    script(&machine, "pin add", "B", Script::Exit(2));

    let result = sync_with(&machine, vec![with_pin("B", "3.0")]);

    assert_eq!(ids(result.installed()), vec!["B"]);
    assert!(result.success());
    assert!(result.pin_updated().is_empty());
    assert_eq!(
        result.pin_side_effects(),
        &[effect("B", PinAction::Add, BestEffort::Ignored { code: 2 })]
    );

    let calls = machine.borrow().calls.clone();
    assert_eq!(calls[0], argv(&["install", "--id", "B", "--version", "3.0"]));
    assert_eq!(calls[1], argv(&["pin", "add", "--id", "B", "--version", "3.0"]));
}

#[test]
fn matching_pin_is_not_reapplied() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("C", "2.0")];
    machine.borrow_mut().pins = vec![pinned("C", "2.0")];

    let result = sync_with(&machine, vec![with_pin("C", "2.0")]);

    assert!(machine.borrow().calls.is_empty());
    assert!(result.pin_updated().is_empty());
    assert_eq!(
        result.pin_side_effects(),
        &[effect("C", PinAction::Add, BestEffort::Skipped)]
    );
}

#[test]
fn versionless_local_pin_is_replaced() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("C", "2.0")];
    machine.borrow_mut().pins = vec![PinRecord {
        id: "C".into(),
        pin_type: "Pinning".into(),
        version: None,
    }];

    let result = sync_with(&machine, vec![with_pin("C", "2.0")]);

    assert_eq!(ids(result.pin_updated()), vec!["C"]);
    assert_eq!(
        machine.borrow().calls,
        vec![argv(&["pin", "add", "--id", "C", "--version", "2.0", "--force"])]
    );
}

#[test]
fn stale_local_pin_is_removed() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("D", "4.0")];
    machine.borrow_mut().pins = vec![pinned("D", "4.0")];

    let result = sync_with(&machine, vec![PackageDefinition::new("D")]);

    assert_eq!(ids(result.pin_removed()), vec!["D"]);
    assert_eq!(
        machine.borrow().calls,
        vec![argv(&["pin", "remove", "--id", "D"])]
    );
}

#[test]
fn pin_pass_failures_never_reach_failed() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("C", "1.5")];
    script(&machine, "pin add", "C", Script::Error);

    let result = sync_with(&machine, vec![with_pin("C", "2.0")]);

    assert!(result.success());
    assert!(result.pin_updated().is_empty());
    assert_eq!(
        result.pin_side_effects()[0].outcome,
        BestEffort::Ignored {
            code: INVOCATION_ERROR
        }
    );
}

#[test]
fn pin_type_is_forwarded_on_pin_update() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("C", "1.5")];
    let mut def = with_pin("C", "2.0");
    def.pin_type = Some("Blocking".into());

    sync_with(&machine, vec![def]);

    assert_eq!(
        machine.borrow().calls,
        vec![argv(&[
            "pin", "add", "--id", "C", "--version", "2.0", "--blocking", "--force"
        ])]
    );
}

#[test]
fn unavailable_manifest_aborts_before_any_invocation() {
    let machine = Shared::default();
    let invoker = FakeInvoker(machine.clone());
    let inventory = FakeInventory(machine.clone());
    let engine = ReconciliationEngine::new(&inventory, &invoker);

    let err = engine
        .sync(&BrokenStore(|| SyncError::MissingCredentials("no token".into())))
        .expect_err("should fail");
    assert!(matches!(err, SyncError::ManifestUnavailable(_)));

    let err = engine
        .sync(&BrokenStore(|| SyncError::ManifestParse {
            source_name: "m".into(),
            message: "bad".into(),
        }))
        .expect_err("should fail");
    assert!(matches!(err, SyncError::ManifestParse { .. }));

    assert!(machine.borrow().calls.is_empty());
}

#[test]
fn duplicate_ids_are_processed_once() {
    let machine = Shared::default();

    let result = sync_with(
        &machine,
        vec![with_version("App", "1.0"), with_version("app", "2.0")],
    );

    assert_eq!(machine.borrow().calls.len(), 1);
    assert_eq!(result.installed()[0].version.as_deref(), Some("2.0"));
}

#[test]
fn cancellation_stops_between_packages() {
    let machine = Shared::default();
    let invoker = FakeInvoker(machine.clone());
    let inventory = FakeInventory(machine.clone());
    let observed = machine.clone();
    let engine = ReconciliationEngine::new(&inventory, &invoker)
        .with_cancellation(move || !observed.borrow().calls.is_empty());

    let result = engine
        .sync(&MemoryStore(vec![
            PackageDefinition::new("One"),
            PackageDefinition::new("Two"),
        ]))
        .expect("sync");

    assert!(result.interrupted());
    assert_eq!(ids(result.installed()), vec!["One"]);
    assert_eq!(machine.borrow().calls.len(), 1);
}

#[test]
fn refresh_failure_falls_back_to_first_snapshot() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("A", "1.0"), local("C", "1.5")];
    machine.borrow_mut().fail_listing_after = Some(1);

    let result = sync_with(&machine, vec![tombstone("A"), with_pin("C", "2.0")]);

    assert_eq!(machine.borrow().list_calls, 2);
    assert_eq!(ids(result.uninstalled()), vec!["A"]);
    assert_eq!(ids(result.pin_updated()), vec!["C"]);
}

#[test]
fn refresh_can_be_disabled() {
    let machine = Shared::default();
    machine.borrow_mut().installed = vec![local("A", "1.0")];
    let invoker = FakeInvoker(machine.clone());
    let inventory = FakeInventory(machine.clone());
    let calls = Cell::new(0);

    let result = ReconciliationEngine::new(&inventory, &invoker)
        .with_options(EngineOptions {
            refresh_before_pins: false,
        })
        .with_cancellation(|| {
            calls.set(calls.get() + 1);
            false
        })
        .sync(&MemoryStore(vec![tombstone("A"), PackageDefinition::new("B")]))
        .expect("sync");

    assert!(result.success());
    assert_eq!(machine.borrow().list_calls, 1);
    assert!(calls.get() >= 2);
}

#[test]
fn plan_reports_work_without_invoking() {
    let machine = Shared::default();
    {
        let mut m = machine.borrow_mut();
        m.installed = vec![local("A", "3.0"), local("C", "1.5"), local("D", "1.0")];
        m.pins = vec![pinned("D", "1.0")];
    }
    let invoker = FakeInvoker(machine.clone());
    let inventory = FakeInventory(machine.clone());

    let plan = ReconciliationEngine::new(&inventory, &invoker)
        .plan(vec![
            tombstone("A"),
            with_version("B", "1.0"),
            with_pin("C", "2.0"),
            PackageDefinition::new("D"),
        ])
        .expect("plan");

    assert_eq!(ids(&plan.uninstall), vec!["A"]);
    assert_eq!(ids(&plan.install), vec!["B"]);
    assert_eq!(ids(&plan.pin_update), vec!["C"]);
    assert_eq!(ids(&plan.pin_remove), vec!["D"]);
    assert!(!plan.is_empty());
    assert!(machine.borrow().calls.is_empty());
}
