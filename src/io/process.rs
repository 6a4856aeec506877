use std::{
    ffi::OsStr,
    io::Read,
    path::Path,
    process::{Child, Command, Output, Stdio},
    sync::mpsc::{self, RecvTimeoutError, Sender},
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use tracing::debug;

use crate::error::Result;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// A `Command` for an external tool that never pops up a console window.
pub fn tool_command(program: impl AsRef<OsStr>) -> Command {
    #[allow(unused_mut)]
    let mut cmd = Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd.stdin(Stdio::null());
    cmd
}

/// Runs a command to completion, capturing stdout and stderr.
///
/// Only a failure to spawn is an error here; callers judge the exit status.
pub fn run_captured(cmd: &mut Command) -> Result<Output> {
    debug!(cmd = ?cmd, "spawning");
    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to run {:?}", cmd.get_program()))?;
    debug!(status = %output.status, "finished");
    Ok(output)
}

/// Lossy UTF-8 view of a process's stderr, trimmed.
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Checks whether `program` says anything at all when invoked with `args`.
///
/// Any output on stdout or stderr counts as a response, whatever the exit
/// status. A spawn failure, silence, or running past `timeout` does not.
pub fn probe_responds(program: &Path, args: &[&str], timeout: Duration) -> bool {
    let child = tool_command(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let mut child = match child {
        Ok(c) => c,
        Err(e) => {
            debug!(program = %program.display(), error = %e, "probe spawn failed");
            return false;
        }
    };

    let (tx, said) = mpsc::channel();
    drain(child.stdout.take(), tx.clone());
    drain(child.stderr.take(), tx);

    let deadline = Instant::now() + timeout;
    if !wait_until(&mut child, deadline) {
        debug!(program = %program.display(), "probe timed out");
        let _ = child.kill();
        let _ = child.wait();
        return false;
    }

    // Reader threads stay detached: a grandchild may still hold the pipes.
    let remaining = deadline
        .saturating_duration_since(Instant::now())
        .max(Duration::from_millis(50));
    match said.recv_timeout(remaining) {
        Ok(_) => true,
        Err(RecvTimeoutError::Timeout) => {
            debug!(program = %program.display(), "probe output pipes held open past timeout");
            false
        }
        Err(RecvTimeoutError::Disconnected) => false,
    }
}

/// Reports the size of the first non-empty read from `pipe`, then keeps draining.
fn drain<R: Read + Send + 'static>(pipe: Option<R>, said: Sender<usize>) {
    let Some(mut pipe) = pipe else {
        return;
    };
    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        let mut reported = false;
        while let Ok(n) = pipe.read(&mut buf) {
            if n == 0 {
                break;
            }
            if !reported {
                let _ = said.send(n);
                reported = true;
            }
        }
    });
}

fn wait_until(child: &mut Child, deadline: Instant) -> bool {
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) if Instant::now() >= deadline => return false,
            Ok(None) => thread::sleep(Duration::from_millis(20)),
            Err(_) => return false,
        }
    }
}
