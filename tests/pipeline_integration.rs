use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use openrgb_installer::{
    error::InstallError,
    lock::RunLock,
    paths::{Layout, OPENRGB},
    pipeline::{install_with_deps, spawn_uninstall, uninstall_with_deps, InstallRequest, ProgressEvent},
    releases::Release,
    shortcuts::{CreateLauncher, Launcher},
    state,
};

#[derive(Default)]
struct RecordingLauncher {
    created: Mutex<Vec<Launcher>>,
}

impl CreateLauncher for RecordingLauncher {
    fn file_name(&self, name: &str) -> String {
        format!("{name}.lnk")
    }

    fn create(&self, launcher: &Launcher) -> Result<(), InstallError> {
        fs::create_dir_all(launcher.link.parent().unwrap()).unwrap();
        fs::write(&launcher.link, launcher.target.display().to_string()).unwrap();
        self.created.lock().unwrap().push(launcher.clone());
        Ok(())
    }
}

struct FailingLauncher;

impl CreateLauncher for FailingLauncher {
    fn file_name(&self, name: &str) -> String {
        format!("{name}.lnk")
    }

    fn create(&self, launcher: &Launcher) -> Result<(), InstallError> {
        Err(InstallError::ShortcutCreation {
            path: launcher.link.clone(),
            reason: "denied".to_string(),
        })
    }
}

fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, body) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn release_zip() -> Vec<u8> {
    zip_bytes(&[
        ("OpenRGB Windows 64-bit/OpenRGB.exe", "new-binary"),
        ("OpenRGB Windows 64-bit/plugins/readme.txt", "plugins"),
    ])
}

fn request(root: &Path, release: Release) -> InstallRequest {
    InstallRequest {
        label: release.label().to_string(),
        source_url: release.url().to_string(),
        install_root: root.to_path_buf(),
        sha256: None,
    }
}

fn no_processes(_: &str) -> Result<usize, InstallError> {
    Ok(0)
}

fn serve(
    body: Vec<u8>,
) -> impl Fn(&str, &Path, &mut dyn FnMut(u64, Option<u64>)) -> Result<u64, InstallError> {
    move |_url: &str, dest: &Path, on_progress: &mut dyn FnMut(u64, Option<u64>)| {
        let total = body.len() as u64;
        let half = body.len() / 2;
        on_progress(half as u64, Some(total));
        on_progress(total, Some(total));
        fs::write(dest, &body).unwrap();
        Ok(total)
    }
}

fn assert_monotone(events: &[ProgressEvent]) {
    for pair in events.windows(2) {
        assert!(
            pair[0].percent <= pair[1].percent,
            "progress went from {} to {}",
            pair[0].percent,
            pair[1].percent
        );
    }
}

#[test]
fn install_release_records_version_and_creates_shortcuts() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let root = tmp.path().join("apps");
    let launcher = RecordingLauncher::default();
    let mut events = Vec::new();
    let requested = std::cell::RefCell::new(Vec::new());

    let fetch = serve(release_zip());
    let outcome = install_with_deps(
        &request(&root, Release::V0_8),
        &layout,
        &OPENRGB,
        no_processes,
        |url: &str, dest: &Path, on_progress: &mut dyn FnMut(u64, Option<u64>)| {
            requested.borrow_mut().push(url.to_string());
            fetch(url, dest, on_progress)
        },
        &launcher,
        |e| events.push(e),
    );

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(
        outcome.message,
        "OpenRGB installed successfully! Created start menu and desktop shortcuts."
    );
    assert_eq!(
        requested.borrow().as_slice(),
        ["https://openrgb.org/releases/release_0.8/OpenRGB_0.8_Windows_64_fb88964.zip"]
    );
    let install_dir = root.join("OpenRGB Windows 64-bit");
    assert_eq!(fs::read_to_string(install_dir.join("OpenRGB.exe")).unwrap(), "new-binary");
    assert_eq!(state::read_version(&layout.version_file), "0.8");

    let created = launcher.created.lock().unwrap();
    let links: Vec<PathBuf> = created.iter().map(|l| l.link.clone()).collect();
    assert_eq!(
        links,
        vec![
            layout.start_menu_dir.join("OpenRGB.lnk"),
            layout.desktop_dir.join("OpenRGB.lnk"),
        ]
    );
    for l in created.iter() {
        assert_eq!(l.target, install_dir.join("OpenRGB.exe"));
        assert_eq!(l.working_dir, install_dir);
    }

    assert_monotone(&events);
    let labels: Vec<&str> = events.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels.first(), Some(&"Starting install..."));
    assert!(labels.contains(&"Extracting files..."));
    assert!(labels.contains(&"Installing to target path..."));
    assert!(labels.contains(&"Creating shortcuts..."));
    let last = events.last().unwrap();
    assert_eq!((last.percent, last.label.as_str()), (100, "Install finished."));
    assert!(events
        .iter()
        .any(|e| e.label == "Downloading..." && e.percent > 0 && e.percent < 25));

    assert!(!layout.archive_path().exists());
    assert!(!layout.extract_dir().exists());
    assert!(!layout.work_dir.exists());
}

#[test]
fn reinstall_replaces_previous_contents() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let root = tmp.path().join("apps");
    let install_dir = root.join("OpenRGB Windows 64-bit");
    fs::create_dir_all(install_dir.join("old-plugins")).unwrap();
    fs::write(install_dir.join("OpenRGB.exe"), "old-binary").unwrap();
    fs::write(install_dir.join("leftover.dll"), "old").unwrap();

    let outcome = install_with_deps(
        &request(&root, Release::V0_9),
        &layout,
        &OPENRGB,
        no_processes,
        serve(release_zip()),
        &RecordingLauncher::default(),
        |_| {},
    );

    assert!(outcome.success, "{}", outcome.message);
    assert!(!install_dir.join("leftover.dll").exists());
    assert!(!install_dir.join("old-plugins").exists());
    assert_eq!(fs::read_to_string(install_dir.join("OpenRGB.exe")).unwrap(), "new-binary");
    assert_eq!(state::read_version(&layout.version_file), "0.9");
}

#[test]
fn single_unexpected_top_level_folder_is_accepted() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let root = tmp.path().join("apps");
    let body = zip_bytes(&[("OpenRGB_0.6/OpenRGB.exe", "renamed")]);

    let outcome = install_with_deps(
        &request(&root, Release::V0_6),
        &layout,
        &OPENRGB,
        no_processes,
        serve(body),
        &RecordingLauncher::default(),
        |_| {},
    );

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(
        fs::read_to_string(root.join("OpenRGB Windows 64-bit").join("OpenRGB.exe")).unwrap(),
        "renamed"
    );
}

#[test]
fn empty_archive_fails_before_touching_the_install() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let root = tmp.path().join("apps");
    let launcher = RecordingLauncher::default();
    let mut events = Vec::new();

    let outcome = install_with_deps(
        &request(&root, Release::Master),
        &layout,
        &OPENRGB,
        no_processes,
        serve(zip_bytes(&[])),
        &launcher,
        |e| events.push(e),
    );

    assert!(!outcome.success);
    assert_eq!(
        outcome.message,
        "An error occurred: no files or folders found in the extracted contents"
    );
    assert!(!root.join("OpenRGB Windows 64-bit").exists());
    assert!(launcher.created.lock().unwrap().is_empty());
    assert_eq!(state::read_version(&layout.version_file), state::NOT_AVAILABLE);
    assert_monotone(&events);
    assert!(events.iter().all(|e| e.percent < 100));
}

#[test]
fn termination_failure_stops_before_download() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let fetched = std::cell::Cell::new(false);

    let outcome = install_with_deps(
        &request(&tmp.path().join("apps"), Release::Master),
        &layout,
        &OPENRGB,
        |name: &str| {
            Err(InstallError::ProcessTermination {
                name: name.to_string(),
                reason: "access denied".to_string(),
            })
        },
        |_: &str, _: &Path, _: &mut dyn FnMut(u64, Option<u64>)| {
            fetched.set(true);
            Ok(0)
        },
        &RecordingLauncher::default(),
        |_| {},
    );

    assert!(!outcome.success);
    assert!(outcome.message.starts_with("An error occurred: "));
    assert!(outcome.message.contains("OpenRGB.exe"));
    assert!(!fetched.get());
}

#[test]
fn http_failure_leaves_previous_install_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let root = tmp.path().join("apps");
    let install_dir = root.join("OpenRGB Windows 64-bit");
    fs::create_dir_all(&install_dir).unwrap();
    fs::write(install_dir.join("OpenRGB.exe"), "old-binary").unwrap();
    state::write_version(&layout.version_file, "0.7");

    let outcome = install_with_deps(
        &request(&root, Release::V0_9),
        &layout,
        &OPENRGB,
        no_processes,
        |url: &str, _: &Path, _: &mut dyn FnMut(u64, Option<u64>)| {
            Err(InstallError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        },
        &RecordingLauncher::default(),
        |_| {},
    );

    assert!(!outcome.success);
    assert!(outcome.message.contains("404"));
    assert_eq!(fs::read_to_string(install_dir.join("OpenRGB.exe")).unwrap(), "old-binary");
    assert_eq!(state::read_version(&layout.version_file), "0.7");
}

#[test]
fn checksum_mismatch_fails_the_install() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let root = tmp.path().join("apps");
    let mut req = request(&root, Release::V0_9);
    req.sha256 = Some("00".repeat(32));

    let outcome = install_with_deps(
        &req,
        &layout,
        &OPENRGB,
        no_processes,
        serve(release_zip()),
        &RecordingLauncher::default(),
        |_| {},
    );

    assert!(!outcome.success);
    assert!(outcome.message.contains("checksum mismatch"));
    assert!(!root.join("OpenRGB Windows 64-bit").exists());
}

#[test]
fn shortcut_failure_fails_the_install() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let root = tmp.path().join("apps");
    let mut events = Vec::new();

    let outcome = install_with_deps(
        &request(&root, Release::V0_9),
        &layout,
        &OPENRGB,
        no_processes,
        serve(release_zip()),
        &FailingLauncher,
        |e| events.push(e),
    );

    assert!(!outcome.success);
    assert!(outcome.message.contains("denied"));
    assert_eq!(state::read_version(&layout.version_file), state::NOT_AVAILABLE);
    assert_eq!(events.last().unwrap().percent, 75);
}

#[test]
fn failed_reinstall_does_not_keep_the_replaced_label() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let root = tmp.path().join("apps");
    let install_dir = root.join("OpenRGB Windows 64-bit");
    fs::create_dir_all(&install_dir).unwrap();
    fs::write(install_dir.join("OpenRGB.exe"), "old-binary").unwrap();
    state::write_version(&layout.version_file, "0.7");

    let outcome = install_with_deps(
        &request(&root, Release::V0_9),
        &layout,
        &OPENRGB,
        no_processes,
        serve(release_zip()),
        &FailingLauncher,
        |_| {},
    );

    assert!(!outcome.success);
    assert_eq!(fs::read_to_string(install_dir.join("OpenRGB.exe")).unwrap(), "new-binary");
    assert_eq!(state::read_version(&layout.version_file), state::NOT_AVAILABLE);
}

#[test]
fn uninstall_removes_everything_and_is_repeatable() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let root = tmp.path().join("apps");
    let launcher = RecordingLauncher::default();

    let installed = install_with_deps(
        &request(&root, Release::V0_8),
        &layout,
        &OPENRGB,
        no_processes,
        serve(release_zip()),
        &launcher,
        |_| {},
    );
    assert!(installed.success, "{}", installed.message);
    assert!(state::is_installed(&root, &OPENRGB));

    for _ in 0..2 {
        let mut events = Vec::new();
        let outcome = uninstall_with_deps(
            &root,
            &layout,
            &OPENRGB,
            no_processes,
            &launcher,
            |e| events.push(e),
        );
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.message, "OpenRGB uninstalled successfully.");
        assert_monotone(&events);
        let percents: Vec<u8> = events.iter().map(|e| e.percent).collect();
        assert_eq!(percents, vec![0, 25, 50, 75, 100]);
        assert_eq!(events.last().unwrap().label, "Uninstall complete.");
    }

    assert!(!root.join("OpenRGB Windows 64-bit").exists());
    assert!(!layout.start_menu_dir.join("OpenRGB.lnk").exists());
    assert!(!layout.desktop_dir.join("OpenRGB.lnk").exists());
    assert_eq!(state::read_version(&layout.version_file), state::NOT_AVAILABLE);
    assert!(!state::is_installed(&root, &OPENRGB));
}

#[test]
fn uninstall_with_nothing_installed_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let outcome = uninstall_with_deps(
        &tmp.path().join("apps"),
        &layout,
        &OPENRGB,
        no_processes,
        &RecordingLauncher::default(),
        |_| {},
    );
    assert!(outcome.success, "{}", outcome.message);
}

#[test]
fn uninstall_termination_failure_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let outcome = uninstall_with_deps(
        &tmp.path().join("apps"),
        &layout,
        &OPENRGB,
        |name: &str| {
            Err(InstallError::ProcessTermination {
                name: name.to_string(),
                reason: "access denied".to_string(),
            })
        },
        &RecordingLauncher::default(),
        |_| {},
    );
    assert!(!outcome.success);
    assert!(outcome
        .message
        .starts_with("An error occurred during uninstallation: "));
}

#[test]
fn second_run_is_refused_while_lock_is_held() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let _held = RunLock::acquire(&layout.lock_file).unwrap();

    let err = spawn_uninstall(
        tmp.path().join("apps"),
        layout.clone(),
        OPENRGB,
        Box::new(RecordingLauncher::default()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, InstallError::Busy));
}

#[test]
fn background_uninstall_reports_outcome() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::rooted(tmp.path());
    let handle = spawn_uninstall(
        tmp.path().join("apps"),
        layout.clone(),
        OPENRGB,
        Box::new(RecordingLauncher::default()),
    )
    .unwrap();

    let mut percents = Vec::new();
    let outcome = handle.wait(|e| percents.push(e.percent));
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(percents.last(), Some(&100));

    // Lock is released once the worker finishes.
    RunLock::acquire(&layout.lock_file).unwrap();
}
