//! Retrieval of remote ClinVar files and checking them against their MD5 sidecar.

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use md5::{Digest, Md5};
use thousands::Separable;

use crate::err::DownloadError;

/// Whether `location` should be downloaded rather than opened.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("https://") || location.starts_with("http://")
}

/// Local file name for a downloaded `url`, its last path component.
pub fn local_name(url: &str) -> PathBuf {
    let name = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    PathBuf::from(name)
}

fn fetch(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<reqwest::blocking::Response, anyhow::Error> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| anyhow::anyhow!("failed to download {}: {}", url, e))?;
    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        }
        .into());
    }
    Ok(response)
}

/// Download `url` to `path`.
pub fn download_file<P: AsRef<Path>>(url: &str, path: P) -> Result<(), anyhow::Error> {
    tracing::info!("Downloading {} to {:?}", url, path.as_ref());
    let before_download = Instant::now();
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(3600))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create HTTP client: {}", e))?;
    let mut response = fetch(&client, url)?;

    let mut file = File::create(path.as_ref())
        .map_err(|e| anyhow::anyhow!("failed to create {:?}: {}", path.as_ref(), e))?;
    let bytes = response.copy_to(&mut file)?;
    file.flush()?;
    tracing::info!(
        "... done downloading {} bytes in {:?}",
        bytes.separate_with_commas(),
        before_download.elapsed()
    );

    Ok(())
}

/// Fetch the expected MD5 checksum published at `<url>.md5`.
pub fn fetch_md5(url: &str) -> Result<String, anyhow::Error> {
    let client = reqwest::blocking::Client::new();
    let md5_url = format!("{}.md5", url);
    let text = fetch(&client, &md5_url)?
        .text()
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", md5_url, e))?;
    parse_md5(&text)
}

/// Extract the checksum from the contents of an `.md5` file (`"<hex>  <file name>"`).
pub fn parse_md5(contents: &str) -> Result<String, anyhow::Error> {
    contents
        .split_whitespace()
        .next()
        .map(|s| s.to_ascii_lowercase())
        .ok_or_else(|| anyhow::anyhow!("empty md5 file"))
}

/// Compute the hex-encoded MD5 checksum of the file at `path`.
pub fn hash_file_md5<P: AsRef<Path>>(path: P) -> Result<String, anyhow::Error> {
    let mut reader = File::open(path.as_ref()).map(BufReader::new)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(base16ct::lower::encode_string(&hasher.finalize()))
}

/// Compare the MD5 checksum of the file at `path` with `expected`.
pub fn verify_md5<P: AsRef<Path>>(path: P, expected: &str) -> Result<(), anyhow::Error> {
    let local = hash_file_md5(path.as_ref())?;
    if local != expected.to_ascii_lowercase() {
        return Err(DownloadError::ChecksumMismatch {
            path: path.as_ref().to_path_buf(),
            local,
            remote: expected.to_string(),
        }
        .into());
    }
    tracing::debug!("md5 of {:?} verified: {}", path.as_ref(), &local);
    Ok(())
}

/// A source location resolved to a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// The local path to read from.
    pub path: PathBuf,
    /// Whether the file was downloaded by us and may be removed afterwards.
    pub downloaded: bool,
}

/// Make `location` available locally, downloading it to the working directory if remote.
///
/// With `verify`, a downloaded file is checked against `<location>.md5`.
pub fn ensure_local(location: &str, verify: bool) -> Result<LocalFile, anyhow::Error> {
    if !is_remote(location) {
        return Ok(LocalFile {
            path: PathBuf::from(location),
            downloaded: false,
        });
    }

    let path = local_name(location);
    remove_on_error(
        &path,
        download_file(location, &path).and_then(|()| {
            if verify {
                verify_md5(&path, &fetch_md5(location)?)
            } else {
                Ok(())
            }
        }),
    )?;
    Ok(LocalFile {
        path,
        downloaded: true,
    })
}

/// Pass through `result`, removing the partial or unverified download at `path` on error.
fn remove_on_error<T>(path: &Path, result: Result<T, anyhow::Error>) -> Result<T, anyhow::Error> {
    if result.is_err() && path.exists() {
        tracing::debug!("removing failed download {:?}", path);
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("could not remove {:?}: {}", path, e);
        }
    }
    result
}

/// Remove downloaded files; failures are only logged.
pub fn cleanup(files: &[LocalFile]) {
    for file in files.iter().filter(|f| f.downloaded) {
        tracing::debug!("removing downloaded file {:?}", &file.path);
        if let Err(e) = std::fs::remove_file(&file.path) {
            tracing::warn!("could not remove {:?}: {}", &file.path, e);
        }
    }
}
