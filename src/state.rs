//! What is installed right now. Everything here is advisory: failures are
//! logged and degrade to "not installed" instead of surfacing.

use std::{fs, path::Path};

use crate::{fs_ops, paths::Target};

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    Install,
    Reinstall,
}

impl PrimaryAction {
    pub fn label(self) -> &'static str {
        match self {
            PrimaryAction::Install => "Install",
            PrimaryAction::Reinstall => "Reinstall",
        }
    }
}

/// Which actions the front end should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub primary_action: PrimaryAction,
    pub can_uninstall: bool,
    pub can_launch: bool,
}

pub fn is_installed(install_root: &Path, target: &Target) -> bool {
    target.install_dir(install_root).is_dir()
}

pub fn availability(install_root: &Path, target: &Target) -> Availability {
    let installed = is_installed(install_root, target);
    Availability {
        primary_action: if installed {
            PrimaryAction::Reinstall
        } else {
            PrimaryAction::Install
        },
        can_uninstall: installed,
        can_launch: installed,
    }
}

pub fn read_version(record: &Path) -> String {
    match fs::read_to_string(record) {
        Ok(label) if !label.trim().is_empty() => label.trim().to_string(),
        Ok(_) => NOT_AVAILABLE.to_string(),
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("read {}: {err}", record.display());
            }
            NOT_AVAILABLE.to_string()
        }
    }
}

pub fn write_version(record: &Path, label: &str) {
    if let Some(parent) = record.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!("create {}: {err}", parent.display());
            return;
        }
    }
    if let Err(err) = fs_ops::write_bytes_with_retry(record, label.as_bytes(), 3) {
        tracing::warn!("write {}: {err}", record.display());
    }
}

/// Removes the record, then its directory if nothing else lives there.
pub fn clear_version(record: &Path) {
    match fs_ops::remove_file_if_exists(record) {
        Ok(true) => {
            if let Some(parent) = record.parent() {
                let _ = fs::remove_dir(parent);
            }
        }
        Ok(false) => {}
        Err(err) => tracing::warn!("remove {}: {err}", record.display()),
    }
}
