//! The install and uninstall pipelines.
//!
//! Both are a fixed sequence of steps. Each step returns a `Result`; the
//! first failure ends the run. A run reports any number of
//! [`ProgressEvent`]s followed by exactly one [`Outcome`].

use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver},
    thread::{self, JoinHandle},
};

use crate::{
    archive,
    config::NetworkConfig,
    download::{self, Fetcher},
    error::InstallError,
    fs_ops,
    lock::RunLock,
    paths::{Layout, Target},
    process,
    shortcuts::{self, CreateLauncher, Launcher},
    state,
};

const INSTALL_SUCCESS: &str =
    "OpenRGB installed successfully! Created start menu and desktop shortcuts.";
const UNINSTALL_SUCCESS: &str = "OpenRGB uninstalled successfully.";

/// The share of the bar the download occupies when the server reports a length.
const DOWNLOAD_SPAN: u64 = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Recorded as the installed version once the run succeeds.
    pub label: String,
    pub source_url: String,
    pub install_root: PathBuf,
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percent: u8,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Progress(ProgressEvent),
    Finished(Outcome),
}

/// Keeps reported percentages non-decreasing.
struct Progress<F: FnMut(ProgressEvent)> {
    last: u8,
    emit: F,
}

impl<F: FnMut(ProgressEvent)> Progress<F> {
    fn new(emit: F) -> Self {
        Self { last: 0, emit }
    }

    fn report(&mut self, percent: u8, label: &str) {
        let percent = percent.clamp(self.last, 100);
        self.last = percent;
        tracing::debug!("progress {percent}%: {label}");
        (self.emit)(ProgressEvent {
            percent,
            label: label.to_string(),
        });
    }

    fn report_if_higher(&mut self, percent: u8, label: &str) {
        if percent > self.last {
            self.report(percent, label);
        }
    }
}

/// Runs the install pipeline with injected collaborators.
pub fn install_with_deps(
    request: &InstallRequest,
    layout: &Layout,
    target: &Target,
    terminate_fn: impl Fn(&str) -> Result<usize, InstallError>,
    fetch_fn: impl Fn(&str, &Path, &mut dyn FnMut(u64, Option<u64>)) -> Result<u64, InstallError>,
    launcher: &dyn CreateLauncher,
    emit: impl FnMut(ProgressEvent),
) -> Outcome {
    let mut progress = Progress::new(emit);
    tracing::info!(
        "install {} from {} into {}",
        request.label,
        request.source_url,
        request.install_root.display()
    );
    let result = install_steps(
        request,
        layout,
        target,
        &terminate_fn,
        &fetch_fn,
        launcher,
        &mut progress,
    );
    cleanup_work_dir(layout);

    match result {
        Ok(()) => {
            tracing::info!("install of {} completed", request.label);
            Outcome::success(INSTALL_SUCCESS)
        }
        Err(err) => {
            tracing::error!("install of {} failed: {err}", request.label);
            Outcome::failure(format!("An error occurred: {err}"))
        }
    }
}

fn install_steps<F: FnMut(ProgressEvent)>(
    request: &InstallRequest,
    layout: &Layout,
    target: &Target,
    terminate_fn: &impl Fn(&str) -> Result<usize, InstallError>,
    fetch_fn: &impl Fn(&str, &Path, &mut dyn FnMut(u64, Option<u64>)) -> Result<u64, InstallError>,
    launcher: &dyn CreateLauncher,
    progress: &mut Progress<F>,
) -> Result<(), InstallError> {
    progress.report(0, "Starting install...");
    let killed = terminate_fn(target.executable)?;
    if killed > 0 {
        tracing::info!("stopped {killed} running instance(s) of {}", target.executable);
    }

    progress.report(0, "Downloading...");
    std::fs::create_dir_all(&layout.work_dir)
        .map_err(|err| InstallError::fs("create", &layout.work_dir, err))?;
    let archive_path = layout.archive_path();
    fetch_fn(&request.source_url, &archive_path, &mut |done: u64, total: Option<u64>| {
        if let Some(total) = total {
            let share = (done.saturating_mul(DOWNLOAD_SPAN) / total).min(DOWNLOAD_SPAN - 1);
            progress.report_if_higher(share as u8, "Downloading...");
        }
    })?;
    if let Some(expected) = request.sha256.as_deref() {
        download::verify_sha256(&archive_path, expected)?;
    }

    progress.report(25, "Extracting files...");
    let extract_dir = layout.extract_dir();
    let entries = archive::extract_clean(&archive_path, &extract_dir)?;
    tracing::info!("extracted {entries} top-level entries");

    progress.report(50, "Installing to target path...");
    let source = archive::locate_folder(&extract_dir, target.install_folder)?;
    let install_dir = relocate(&source, &request.install_root, target, layout)?;

    progress.report(75, "Creating shortcuts...");
    for link in create_shortcuts(layout, target, &request.install_root, launcher)? {
        tracing::info!("created {}", link.display());
    }

    state::write_version(&layout.version_file, &request.label);
    tracing::info!("installed into {}", install_dir.display());
    progress.report(100, "Install finished.");
    Ok(())
}

/// Replaces `<install_root>/<install folder>` with `source`. Never merges.
///
/// The version record is cleared as soon as the previous build is gone, so it
/// never names a build that is no longer on disk.
fn relocate(
    source: &Path,
    install_root: &Path,
    target: &Target,
    layout: &Layout,
) -> Result<PathBuf, InstallError> {
    let dest = target.install_dir(install_root);
    if fs_ops::remove_dir_if_exists(&dest).map_err(|err| InstallError::fs("remove", &dest, err))? {
        tracing::info!("removed previous install at {}", dest.display());
        state::clear_version(&layout.version_file);
    }
    std::fs::create_dir_all(install_root)
        .map_err(|err| InstallError::fs("create", install_root, err))?;
    fs_ops::move_dir(source, &dest).map_err(|err| InstallError::fs("move", source, err))?;
    Ok(dest)
}

fn shortcut_links(layout: &Layout, target: &Target, launcher: &dyn CreateLauncher) -> [PathBuf; 2] {
    [
        launcher.link_path(&layout.start_menu_dir, target.shortcut_name),
        launcher.link_path(&layout.desktop_dir, target.shortcut_name),
    ]
}

fn create_shortcuts(
    layout: &Layout,
    target: &Target,
    install_root: &Path,
    launcher: &dyn CreateLauncher,
) -> Result<[PathBuf; 2], InstallError> {
    let exe = target.executable_path(install_root);
    let links = shortcut_links(layout, target, launcher);
    for link in &links {
        launcher.create(&Launcher {
            link: link.clone(),
            name: target.shortcut_name.to_string(),
            target: exe.clone(),
            icon: Some(exe.clone()),
            working_dir: target.install_dir(install_root),
        })?;
    }
    Ok(links)
}

fn cleanup_work_dir(layout: &Layout) {
    let archive_path = layout.archive_path();
    if let Err(err) = fs_ops::remove_file_if_exists(&archive_path) {
        tracing::warn!("remove {}: {err}", archive_path.display());
    }
    let extract_dir = layout.extract_dir();
    if let Err(err) = fs_ops::remove_dir_if_exists(&extract_dir) {
        tracing::warn!("remove {}: {err}", extract_dir.display());
    }
    // Only succeeds when empty.
    let _ = std::fs::remove_dir(&layout.work_dir);
}

/// Runs the uninstall pipeline. Anything already absent counts as removed.
pub fn uninstall_with_deps(
    install_root: &Path,
    layout: &Layout,
    target: &Target,
    terminate_fn: impl Fn(&str) -> Result<usize, InstallError>,
    launcher: &dyn CreateLauncher,
    emit: impl FnMut(ProgressEvent),
) -> Outcome {
    let mut progress = Progress::new(emit);
    tracing::info!("uninstall from {}", install_root.display());
    match uninstall_steps(install_root, layout, target, &terminate_fn, launcher, &mut progress) {
        Ok(()) => {
            tracing::info!("uninstall completed");
            Outcome::success(UNINSTALL_SUCCESS)
        }
        Err(err) => {
            tracing::error!("uninstall failed: {err}");
            Outcome::failure(format!("An error occurred during uninstallation: {err}"))
        }
    }
}

fn uninstall_steps<F: FnMut(ProgressEvent)>(
    install_root: &Path,
    layout: &Layout,
    target: &Target,
    terminate_fn: &impl Fn(&str) -> Result<usize, InstallError>,
    launcher: &dyn CreateLauncher,
    progress: &mut Progress<F>,
) -> Result<(), InstallError> {
    progress.report(0, "Uninstalling OpenRGB...");
    terminate_fn(target.executable)?;

    progress.report(25, "Removing installation folder...");
    let install_dir = target.install_dir(install_root);
    if fs_ops::remove_dir_if_exists(&install_dir)
        .map_err(|err| InstallError::fs("remove", &install_dir, err))?
    {
        tracing::info!("removed {}", install_dir.display());
    }

    progress.report(50, "Removing shortcuts...");
    for link in shortcut_links(layout, target, launcher) {
        if fs_ops::remove_file_if_exists(&link).map_err(|err| InstallError::fs("remove", &link, err))? {
            tracing::info!("removed {}", link.display());
        }
    }

    progress.report(75, "Removing version record...");
    state::clear_version(&layout.version_file);

    progress.report(100, "Uninstall complete.");
    Ok(())
}

/// Real collaborators for a background run.
pub struct Services {
    pub fetcher: Fetcher,
    pub launcher: Box<dyn CreateLauncher>,
}

impl Services {
    pub fn new(network: &NetworkConfig) -> anyhow::Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(network)?,
            launcher: shortcuts::platform(),
        })
    }
}

/// A pipeline running on its worker thread.
pub struct PipelineHandle {
    events: Receiver<PipelineEvent>,
    worker: JoinHandle<()>,
}

impl PipelineHandle {
    /// Blocks until the run finishes, passing progress to `on_progress`.
    pub fn wait(self, mut on_progress: impl FnMut(&ProgressEvent)) -> Outcome {
        let mut outcome = None;
        for event in self.events.iter() {
            match event {
                PipelineEvent::Progress(p) => on_progress(&p),
                PipelineEvent::Finished(o) => {
                    outcome = Some(o);
                    break;
                }
            }
        }
        let _ = self.worker.join();
        outcome.unwrap_or_else(|| Outcome::failure("the worker stopped without reporting an outcome"))
    }
}

/// Starts an install on a worker thread. Fails with [`InstallError::Busy`]
/// while another run holds the lock.
pub fn spawn_install(
    request: InstallRequest,
    layout: Layout,
    target: Target,
    services: Services,
) -> Result<PipelineHandle, InstallError> {
    let lock = RunLock::acquire(&layout.lock_file)?;
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let _lock = lock;
        let progress_tx = tx.clone();
        let outcome = install_with_deps(
            &request,
            &layout,
            &target,
            process::terminate_by_name,
            |url, dest, on_progress| services.fetcher.fetch(url, dest, on_progress),
            services.launcher.as_ref(),
            move |event| {
                let _ = progress_tx.send(PipelineEvent::Progress(event));
            },
        );
        let _ = tx.send(PipelineEvent::Finished(outcome));
    });
    Ok(PipelineHandle { events: rx, worker })
}

/// Starts an uninstall on a worker thread.
pub fn spawn_uninstall(
    install_root: PathBuf,
    layout: Layout,
    target: Target,
    launcher: Box<dyn CreateLauncher>,
) -> Result<PipelineHandle, InstallError> {
    let lock = RunLock::acquire(&layout.lock_file)?;
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let _lock = lock;
        let progress_tx = tx.clone();
        let outcome = uninstall_with_deps(
            &install_root,
            &layout,
            &target,
            process::terminate_by_name,
            launcher.as_ref(),
            move |event| {
                let _ = progress_tx.send(PipelineEvent::Progress(event));
            },
        );
        let _ = tx.send(PipelineEvent::Finished(outcome));
    });
    Ok(PipelineHandle { events: rx, worker })
}
