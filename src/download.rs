use sha2::{Digest, Sha256};
use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::Path,
};

use crate::{config::NetworkConfig, error::InstallError};

const CHUNK_SIZE: usize = 8192;

/// Blocking HTTP(S) downloader with connect and overall timeouts.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::blocking::Client,
}

impl Fetcher {
    pub fn new(network: &NetworkConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("openrgb-installer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(network.connect_timeout())
            .timeout(network.timeout())
            .build()?;
        Ok(Self { client })
    }

    /// Streams `url` into `dest`, calling `on_progress(downloaded, total)`
    /// after each chunk. `dest` only appears once the body is complete.
    pub fn fetch(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64, InstallError> {
        tracing::info!("downloading {url}");
        let mut resp = self
            .client
            .get(url)
            .send()
            .map_err(|err| InstallError::network(url, err))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(InstallError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let total = resp.content_length().filter(|len| *len > 0);

        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|err| InstallError::fs("create", parent, err))?;
        let mut file = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(parent)
            .map_err(|err| InstallError::fs("create temp file in", parent, err))?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut downloaded = 0u64;
        loop {
            let read = match resp.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(InstallError::network(url, err)),
            };
            file.write_all(&buf[..read])
                .map_err(|err| InstallError::fs("write", file.path(), err))?;
            downloaded += read as u64;
            on_progress(downloaded, total);
        }
        file.flush()
            .map_err(|err| InstallError::fs("write", file.path(), err))?;

        if dest.exists() {
            fs::remove_file(dest).map_err(|err| InstallError::fs("remove", dest, err))?;
        }
        file.persist(dest)
            .map_err(|err| InstallError::fs("persist", dest, err.error))?;
        tracing::info!("downloaded {downloaded} bytes to {}", dest.display());
        Ok(downloaded)
    }
}

pub fn sha256_file(path: &Path) -> Result<String, InstallError> {
    let mut file = File::open(path).map_err(|err| InstallError::fs("open", path, err))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut buf)
            .map_err(|err| InstallError::fs("read", path, err))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn verify_sha256(path: &Path, expected: &str) -> Result<(), InstallError> {
    let actual = sha256_file(path)?;
    let expected = normalize_hex(expected);
    if actual != expected {
        return Err(InstallError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn normalize_hex(value: &str) -> String {
    value
        .trim()
        .trim_start_matches("sha256:")
        .to_ascii_lowercase()
}
