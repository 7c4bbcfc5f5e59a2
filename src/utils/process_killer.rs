use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const GRACE_PERIOD: Duration = Duration::from_millis(50);

async fn get_child_pids(pid: u32) -> Vec<u32> {
    let output = Command::new("pgrep")
        .args(["-P", &pid.to_string()])
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) => String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.trim().parse::<u32>().ok())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn to_pid(raw: u32) -> Option<Pid> {
    i32::try_from(raw).ok().filter(|p| *p > 0).map(Pid::from_raw)
}

fn send_signal(pid: u32, signal: Signal) {
    if let Some(pid) = to_pid(pid) {
        match kill(pid, signal) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => debug!(%pid, ?signal, error = %e, "signal failed"),
        }
    }
}

fn signal_group(pgid: u32, signal: Signal) {
    if let Some(pgid) = to_pid(pgid) {
        match killpg(pgid, signal) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => debug!(%pgid, ?signal, error = %e, "group signal failed"),
        }
    }
}

/// Kills `pid` and all of its descendants, depth first: SIGTERM, a short
/// grace period, then SIGKILL.
///
/// Only finds descendants still attached to their parent. Anything that was
/// reparented is reached through `kill_process_group`.
pub fn kill_process_tree(pid: u32) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        // collect children before the parent dies and they get reparented
        let children = get_child_pids(pid).await;
        for child_pid in children {
            kill_process_tree(child_pid).await;
        }

        debug!(pid, "terminating process");
        send_signal(pid, Signal::SIGTERM);
        tokio::time::sleep(GRACE_PERIOD).await;
        send_signal(pid, Signal::SIGKILL);
    })
}

/// SIGTERM then SIGKILL to every member of process group `pgid`, including
/// backgrounded members whose parent already exited.
pub async fn kill_process_group(pgid: u32) {
    debug!(pgid, "terminating process group");
    signal_group(pgid, Signal::SIGTERM);
    tokio::time::sleep(GRACE_PERIOD).await;
    signal_group(pgid, Signal::SIGKILL);
}
