//! Graceful subprocess shutdown
//!
//! The external tool must get a chance to flush partial output and remove
//! its temporary files, so termination is interrupt-first with a bounded
//! wait and a forced kill as the fallback. The interrupt targets the
//! child's own process group, never the parent's.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Build a command for the external tool with stdio redirected and the
/// child placed in its own process group, so [`interrupt`] can target it
/// without signalling ourselves.
pub(crate) fn tool_command(tool_path: &Path) -> Command {
    let mut cmd = Command::new(tool_path);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        // Child becomes its own process-group leader.
        cmd.process_group(0);
    }

    #[cfg(windows)]
    {
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);
    }

    cmd
}

/// Send a graceful interrupt to the child's process group.
pub(crate) fn interrupt(pid: u32) {
    debug!("interrupting process group of pid {}", pid);

    #[cfg(unix)]
    unsafe {
        libc::kill(-(pid as i32), libc::SIGINT);
    }

    #[cfg(windows)]
    unsafe {
        use winapi::um::wincon::{GenerateConsoleCtrlEvent, CTRL_BREAK_EVENT};
        GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid);
    }
}

/// Ensure the child is no longer running: interrupt its group, wait out the
/// grace period, then force-kill.
pub(crate) async fn shutdown(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    if child.try_wait()?.is_some() {
        return Ok(());
    }

    if let Some(pid) = child.id() {
        interrupt(pid);
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => {
            debug!("tool exited with {:?}", status?.code());
            Ok(())
        }
        Err(_) => {
            warn!("tool ignored the interrupt for {:?}, force-killing", grace);
            child.kill().await
        }
    }
}
