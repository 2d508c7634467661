use super::command_exec::run_captured;
use crate::core::exit_codes::INVOCATION_ERROR;
use crate::error::{Result, SyncError};
use crate::traits::{Invocation, PackageManagerInvoker};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Runs the package-manager executable as a child process.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    binary: PathBuf,
}

impl ProcessInvoker {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Resolve `name` on `PATH` (or accept it as a path).
    pub fn locate(name: &str) -> Result<Self> {
        let binary = which::which(name).map_err(|_| {
            SyncError::DependencyMissing(format!(
                "package manager '{}' was not found on PATH",
                name
            ))
        })?;
        Ok(Self::new(binary))
    }
}

impl PackageManagerInvoker for ProcessInvoker {
    fn run(&self, argv: &[String]) -> Result<Invocation> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(argv);

        let output = run_captured(&mut cmd)?;
        // Killed by a signal: no native code.
        let exit_code = output.status.code().unwrap_or(INVOCATION_ERROR);
        debug!(binary = %self.binary.display(), code = exit_code, "package manager exited");

        Ok(Invocation {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
