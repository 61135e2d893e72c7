//! Stopping a running instance of the installed program.

use std::{ffi::OsStr, path::Path, thread, time::Duration};
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::error::InstallError;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const EXIT_POLL_ATTEMPTS: usize = 50;

/// Force-kills every process named `image_name` and waits for each to exit.
/// Returns how many were killed; none running is not an error.
pub fn terminate_by_name(image_name: &str) -> Result<usize, InstallError> {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);
    let own_pid = sysinfo::get_current_pid().ok();

    let pids: Vec<Pid> = system
        .processes()
        .iter()
        .filter(|(pid, process)| Some(**pid) != own_pid && matches_name(process.name(), image_name))
        .map(|(pid, _)| *pid)
        .collect();

    if pids.is_empty() {
        tracing::debug!("{image_name} is not running");
        return Ok(0);
    }

    for pid in &pids {
        tracing::info!("terminating {image_name} (pid {pid})");
        let Some(process) = system.process(*pid) else {
            continue;
        };
        if !process.kill() && still_running(&mut system, *pid) {
            return Err(InstallError::ProcessTermination {
                name: image_name.to_string(),
                reason: format!("kill refused for pid {pid}"),
            });
        }
    }

    for pid in &pids {
        wait_for_exit(&mut system, *pid, image_name)?;
    }
    Ok(pids.len())
}

fn still_running(system: &mut System, pid: Pid) -> bool {
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}

fn wait_for_exit(system: &mut System, pid: Pid, image_name: &str) -> Result<(), InstallError> {
    for _ in 0..EXIT_POLL_ATTEMPTS {
        if !still_running(system, pid) {
            return Ok(());
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
    Err(InstallError::ProcessTermination {
        name: image_name.to_string(),
        reason: format!("pid {pid} still running after kill"),
    })
}

/// Case-insensitive, and tolerant of a missing `.exe` so `OpenRGB.exe` also
/// matches a native `openrgb` binary.
pub fn matches_name(process_name: &OsStr, image_name: &str) -> bool {
    let name = process_name.to_string_lossy();
    if name.eq_ignore_ascii_case(image_name) {
        return true;
    }
    let stem = |s: &str| -> String {
        Path::new(s)
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    };
    let wanted = stem(image_name);
    !wanted.is_empty() && stem(&name) == wanted
}
