use crate::error::{Result, SyncError};
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};

fn drain(mut pipe: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

/// Terminal Ctrl-C is delivered to the foreground process group; start the
/// child outside it.
#[cfg(unix)]
fn detach_from_terminal_interrupts(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach_from_terminal_interrupts(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach_from_terminal_interrupts(_cmd: &mut Command) {}

/// Run a command to completion, capturing stdout and stderr. Never times out.
///
/// Both pipes are drained on their own threads while waiting. The child
/// runs in its own process group, so an interrupt only reaches pkgsync,
/// which stops between packages.
pub fn run_captured(cmd: &mut Command) -> Result<Output> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let failed = |reason: String| SyncError::SystemCommandFailed {
        command: program.clone(),
        reason,
    };

    detach_from_terminal_interrupts(cmd);
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| failed(e.to_string()))?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(failed("output pipes were not captured".into()));
    };
    let stdout = drain(stdout);
    let stderr = drain(stderr);

    let status = child.wait().map_err(|e| failed(e.to_string()))?;

    Ok(Output {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}
