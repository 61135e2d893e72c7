use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use crate::{error::InstallError, fs_ops};

/// Expands `archive` into `dest`, wiping any stale extraction first.
/// Returns the number of top-level entries produced; zero is an error.
pub fn extract_clean(archive: &Path, dest: &Path) -> Result<usize, InstallError> {
    fs_ops::remove_dir_if_exists(dest).map_err(|err| InstallError::fs("remove", dest, err))?;
    fs::create_dir_all(dest).map_err(|err| InstallError::fs("create", dest, err))?;

    let file = fs::File::open(archive).map_err(|err| InstallError::fs("open", archive, err))?;
    let mut zip = zip::ZipArchive::new(file)?;
    tracing::debug!("{} entries in {}", zip.len(), archive.display());

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_owned();
        let path = Path::new(&name);
        if path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_) | Component::RootDir))
        {
            return Err(InstallError::ArchiveExtraction(format!(
                "invalid path in archive: {name}"
            )));
        }

        let out_path = dest.join(path);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|err| InstallError::fs("create", &out_path, err))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|err| InstallError::fs("create", parent, err))?;
        }
        let mut out_file = fs::File::create(&out_path)
            .map_err(|err| InstallError::fs("create", &out_path, err))?;
        io::copy(&mut entry, &mut out_file)
            .map_err(|err| InstallError::fs("write", &out_path, err))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o777));
        }
    }

    let top_level = top_level_entries(dest)?;
    if top_level.is_empty() {
        return Err(InstallError::EmptyArchive);
    }
    Ok(top_level.len())
}

/// The extracted folder to install: `expected` if present, otherwise the
/// only top-level directory when there is exactly one.
pub fn locate_folder(extract_dir: &Path, expected: &str) -> Result<PathBuf, InstallError> {
    let candidate = extract_dir.join(expected);
    if candidate.is_dir() {
        return Ok(candidate);
    }
    let dirs: Vec<PathBuf> = top_level_entries(extract_dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    match dirs.as_slice() {
        [only] => {
            tracing::warn!(
                "expected folder '{expected}' not in archive, installing {} instead",
                only.display()
            );
            Ok(only.clone())
        }
        [] => Err(InstallError::ArchiveExtraction(
            "no folder found in the extracted contents".to_string(),
        )),
        _ => Err(InstallError::ArchiveExtraction(format!(
            "folder '{expected}' not found in the extracted contents"
        ))),
    }
}

fn top_level_entries(dir: &Path) -> Result<Vec<PathBuf>, InstallError> {
    let entries = fs::read_dir(dir).map_err(|err| InstallError::fs("read_dir", dir, err))?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| InstallError::fs("read_dir", dir, err))?;
        out.push(entry.path());
    }
    out.sort();
    Ok(out)
}
