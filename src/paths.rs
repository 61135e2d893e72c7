use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::Config;

pub const HOME_ENV: &str = "OPENRGB_INSTALLER_HOME";

const HOME_DIR_NAME: &str = "OpenRGB-Installer";
const VERSION_FILE_NAME: &str = "installed_version.txt";
const LOCK_FILE_NAME: &str = "installer.lock";
const ARCHIVE_FILE_NAME: &str = "openrgb.zip";
const EXTRACT_DIR_NAME: &str = "OpenRGBExtracted";
const WORK_DIR_NAME: &str = "work";

/// The program being installed and the names it is installed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub install_folder: &'static str,
    pub executable: &'static str,
    pub shortcut_name: &'static str,
}

pub const OPENRGB: Target = Target {
    install_folder: "OpenRGB Windows 64-bit",
    executable: "OpenRGB.exe",
    shortcut_name: "OpenRGB",
};

impl Target {
    pub fn install_dir(&self, install_root: &Path) -> PathBuf {
        install_root.join(self.install_folder)
    }

    pub fn executable_path(&self, install_root: &Path) -> PathBuf {
        self.install_dir(install_root).join(self.executable)
    }
}

/// Every location a run touches apart from the install root itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub work_dir: PathBuf,
    pub version_file: PathBuf,
    pub start_menu_dir: PathBuf,
    pub desktop_dir: PathBuf,
    pub lock_file: PathBuf,
}

impl Layout {
    pub fn resolve(home: &Path, config: &Config) -> Result<Self> {
        let start_menu_dir = match &config.start_menu_dir {
            Some(dir) => dir.clone(),
            None => default_start_menu_dir()?,
        };
        let desktop_dir = match &config.desktop_dir {
            Some(dir) => dir.clone(),
            None => dirs::desktop_dir()
                .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
                .context("desktop directory not found")?,
        };
        Ok(Self {
            work_dir: home.join(WORK_DIR_NAME),
            version_file: home.join(VERSION_FILE_NAME),
            start_menu_dir,
            desktop_dir,
            lock_file: home.join(LOCK_FILE_NAME),
        })
    }

    /// Everything under one directory; used by tests and portable setups.
    pub fn rooted(base: &Path) -> Self {
        Self {
            work_dir: base.join("home").join(WORK_DIR_NAME),
            version_file: base.join("home").join(VERSION_FILE_NAME),
            start_menu_dir: base.join("start-menu"),
            desktop_dir: base.join("desktop"),
            lock_file: base.join("home").join(LOCK_FILE_NAME),
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.work_dir.join(ARCHIVE_FILE_NAME)
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.work_dir.join(EXTRACT_DIR_NAME)
    }
}

pub fn logs_dir(home: &Path) -> PathBuf {
    home.join("logs")
}

/// Where the installer keeps its own files: version record, lock, logs, config.
pub fn installer_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        if !home.trim().is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    let data = dirs::data_dir().context("data directory not found")?;
    Ok(data.join(HOME_DIR_NAME))
}

pub fn default_install_root(config: &Config) -> Result<PathBuf> {
    if let Some(root) = &config.install_root {
        return Ok(root.clone());
    }
    let local = dirs::data_local_dir().context("local data directory not found")?;
    Ok(local.join("Programs"))
}

#[cfg(windows)]
pub fn default_start_menu_dir() -> Result<PathBuf> {
    let appdata = dirs::data_dir().context("APPDATA not set")?;
    Ok(appdata
        .join("Microsoft")
        .join("Windows")
        .join("Start Menu")
        .join("Programs"))
}

#[cfg(target_os = "macos")]
pub fn default_start_menu_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("home directory not found")?;
    Ok(home.join("Applications"))
}

#[cfg(not(any(windows, target_os = "macos")))]
pub fn default_start_menu_dir() -> Result<PathBuf> {
    let data = dirs::data_dir().context("data directory not found")?;
    Ok(data.join("applications"))
}
