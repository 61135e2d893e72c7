//! Start menu and desktop launchers, one implementation per platform.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use crate::error::InstallError;

/// A launcher to create: where it goes and what it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    pub link: PathBuf,
    pub name: String,
    pub target: PathBuf,
    pub icon: Option<PathBuf>,
    pub working_dir: PathBuf,
}

pub trait CreateLauncher: Send + Sync {
    /// File name of a launcher called `name` inside a launcher directory.
    fn file_name(&self, name: &str) -> String;

    fn create(&self, launcher: &Launcher) -> Result<(), InstallError>;

    fn link_path(&self, dir: &Path, name: &str) -> PathBuf {
        dir.join(self.file_name(name))
    }
}

#[cfg(windows)]
pub fn platform() -> Box<dyn CreateLauncher> {
    Box::new(ShellLink)
}

#[cfg(target_os = "macos")]
pub fn platform() -> Box<dyn CreateLauncher> {
    Box::new(Symlink)
}

#[cfg(not(any(windows, target_os = "macos")))]
pub fn platform() -> Box<dyn CreateLauncher> {
    Box::new(DesktopEntry)
}

fn ensure_parent(link: &Path) -> Result<(), InstallError> {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent).map_err(|err| InstallError::fs("create", parent, err))?;
    }
    Ok(())
}

/// Windows `.lnk` files, written through the WScript.Shell COM object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellLink;

impl CreateLauncher for ShellLink {
    fn file_name(&self, name: &str) -> String {
        format!("{name}.lnk")
    }

    fn create(&self, launcher: &Launcher) -> Result<(), InstallError> {
        ensure_parent(&launcher.link)?;
        let script = shell_link_script(launcher);
        let mut cmd = Command::new("powershell");
        cmd.arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-Command")
            .arg(script);
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }
        let output = cmd.output().map_err(|err| InstallError::ShortcutCreation {
            path: launcher.link.clone(),
            reason: format!("run powershell: {err}"),
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InstallError::ShortcutCreation {
                path: launcher.link.clone(),
                reason: format!("powershell exit {:?}: {}", output.status.code(), stderr.trim()),
            });
        }
        Ok(())
    }
}

fn shell_link_script(launcher: &Launcher) -> String {
    let lnk = ps_quote(&launcher.link.display().to_string());
    let tgt = ps_quote(&launcher.target.display().to_string());
    let dir = ps_quote(&launcher.working_dir.display().to_string());
    let mut script = format!(
        "$WshShell = New-Object -ComObject WScript.Shell; \
         $Shortcut = $WshShell.CreateShortcut({lnk}); \
         $Shortcut.TargetPath = {tgt}; \
         $Shortcut.WorkingDirectory = {dir}; \
         $Shortcut.Description = {}; ",
        ps_quote(&launcher.name)
    );
    if let Some(icon) = &launcher.icon {
        let icon = ps_quote(&format!("{},0", icon.display()));
        script.push_str(&format!("$Shortcut.IconLocation = {icon}; "));
    }
    script.push_str("$Shortcut.Save();");
    script
}

fn ps_quote(value: &str) -> String {
    let escaped = value.replace('\'', "''");
    format!("'{}'", escaped)
}

/// freedesktop.org `.desktop` entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopEntry;

impl CreateLauncher for DesktopEntry {
    fn file_name(&self, name: &str) -> String {
        format!("{}.desktop", name.to_lowercase().replace(' ', "-"))
    }

    fn create(&self, launcher: &Launcher) -> Result<(), InstallError> {
        ensure_parent(&launcher.link)?;
        let contents = desktop_entry(launcher);
        fs::write(&launcher.link, contents)
            .map_err(|err| InstallError::fs("write", &launcher.link, err))?;
        // Desktop environments only trust launchers that are executable.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&launcher.link, fs::Permissions::from_mode(0o755))
                .map_err(|err| InstallError::fs("chmod", &launcher.link, err))?;
        }
        Ok(())
    }
}

fn desktop_entry(launcher: &Launcher) -> String {
    let mut out = String::from("[Desktop Entry]\nType=Application\n");
    out.push_str(&format!("Name={}\n", launcher.name));
    out.push_str(&format!("Exec={}\n", exec_quote(&launcher.target)));
    out.push_str(&format!("Path={}\n", launcher.working_dir.display()));
    if let Some(icon) = &launcher.icon {
        out.push_str(&format!("Icon={}\n", icon.display()));
    }
    out.push_str("Terminal=false\n");
    out
}

fn exec_quote(path: &Path) -> String {
    let raw = path.display().to_string();
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('`', "\\`")
        .replace('$', "\\$");
    format!("\"{escaped}\"")
}

/// macOS has no launcher file format we need; a symlink to the executable
/// serves for both Applications and the desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct Symlink;

impl CreateLauncher for Symlink {
    fn file_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn create(&self, launcher: &Launcher) -> Result<(), InstallError> {
        ensure_parent(&launcher.link)?;
        if fs::symlink_metadata(&launcher.link).is_ok() {
            fs::remove_file(&launcher.link)
                .map_err(|err| InstallError::fs("remove", &launcher.link, err))?;
        }
        symlink(&launcher.target, &launcher.link)
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> Result<(), InstallError> {
    std::os::unix::fs::symlink(target, link).map_err(|err| InstallError::fs("symlink", link, err))
}

#[cfg(not(unix))]
fn symlink(_target: &Path, link: &Path) -> Result<(), InstallError> {
    Err(InstallError::ShortcutCreation {
        path: link.to_path_buf(),
        reason: "symlink launchers are only supported on unix".to_string(),
    })
}
