use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

const ATTEMPTS: usize = 5;

fn retry<F>(mut op: F, attempts: usize) -> io::Result<()>
where
    F: FnMut() -> io::Result<()>,
{
    let mut delay = Duration::from_millis(200);
    for i in 0..attempts {
        match op() {
            Ok(()) => return Ok(()),
            Err(err) => {
                if i + 1 == attempts {
                    return Err(err);
                }
                tracing::debug!("retrying after error: {err}");
            }
        }
        std::thread::sleep(delay);
        delay = std::cmp::min(delay * 2, Duration::from_secs(2));
    }
    Ok(())
}

fn temp_path_for(dest: &Path) -> io::Result<PathBuf> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "dest has no parent"))?;
    let name = dest
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "dest has no filename"))?
        .to_string_lossy();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(Duration::from_millis(0))
        .as_nanos();
    Ok(parent.join(format!("{name}.tmp-{nonce}")))
}

fn write_bytes_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = temp_path_for(dest)?;
    fs::write(&tmp, bytes)?;
    if dest.exists() {
        fs::remove_file(dest)?;
    }
    fs::rename(&tmp, dest).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

/// Readers see either the old contents or the new ones, never a partial write.
pub fn write_bytes_with_retry(dest: &Path, bytes: &[u8], attempts: usize) -> io::Result<()> {
    retry(|| write_bytes_atomic(dest, bytes), attempts)
}

/// Recursively removes `dir`. A missing directory counts as removed.
///
/// Retries because a process that was just killed may still hold handles
/// to files inside the directory for a moment.
pub fn remove_dir_if_exists(dir: &Path) -> io::Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    retry(
        || match fs::remove_dir_all(dir) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        },
        ATTEMPTS,
    )?;
    Ok(true)
}

pub fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => {
            retry(|| fs::remove_file(path), ATTEMPTS)?;
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Moves `src` to `dest`. Falls back to copy-then-delete when a plain
/// rename is impossible, e.g. across filesystems.
pub fn move_dir(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(
                "rename {} -> {} failed ({rename_err}), copying instead",
                src.display(),
                dest.display()
            );
            if let Err(copy_err) = copy_dir_all(src, dest) {
                let _ = fs::remove_dir_all(dest);
                return Err(copy_err);
            }
            fs::remove_dir_all(src)
        }
    }
}

fn copy_dir_all(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}
