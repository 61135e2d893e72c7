use anyhow::{bail, Context, Result};
use std::{
    path::Path,
    process::{Command, Stdio},
};

use crate::paths::Target;

/// Starts the installed program detached from the installer.
/// Returns the child's pid.
pub fn launch_installed(install_root: &Path, target: &Target) -> Result<u32> {
    let exe = target.executable_path(install_root);
    if !exe.is_file() {
        bail!("OpenRGB executable not found at {}", exe.display());
    }
    let mut cmd = Command::new(&exe);
    cmd.current_dir(target.install_dir(install_root))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x00000008;
        cmd.creation_flags(DETACHED_PROCESS);
    }
    let child = cmd
        .spawn()
        .with_context(|| format!("launch {}", exe.display()))?;
    tracing::info!("launched {} (pid {})", exe.display(), child.id());
    Ok(child.id())
}
