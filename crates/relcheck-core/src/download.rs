use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::release::Release;

const FALLBACK_FILE_NAME: &str = "update-download";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("release {version} has no downloadable asset for this platform")]
    MissingAsset { version: String },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("download failed with HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

impl DownloadError {
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    fn io_with_path(context: &'static str, path: &Path, source: &std::io::Error) -> Self {
        Self::io(
            context,
            std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        )
    }
}

/// Fetches a release artifact to local storage.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download the artifact of `release`, returning where it was written.
    async fn download(&self, release: &Release) -> Result<PathBuf, DownloadError>;
}

/// Streams release assets over HTTP into a destination directory.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    dest_dir: PathBuf,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            dest_dir: dest_dir.into(),
        }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, release: &Release) -> Result<PathBuf, DownloadError> {
        let url = release
            .download_url
            .as_deref()
            .ok_or_else(|| DownloadError::MissingAsset {
                version: release.version.to_string(),
            })?;

        tokio::fs::create_dir_all(&self.dest_dir)
            .await
            .map_err(|error| {
                DownloadError::io_with_path(
                    "failed to create download directory",
                    &self.dest_dir,
                    &error,
                )
            })?;

        let file_name = file_name_from_url(url);
        let temp = tempfile::NamedTempFile::new_in(&self.dest_dir)
            .map_err(|error| DownloadError::io("failed to create temp file", error))?;

        info!("Downloading update from {url}");
        let downloaded = stream_to_file(&self.client, url, temp.path()).await?;
        if let Some(total) = release.download_size
            && total != downloaded
        {
            debug!("Downloaded {downloaded} bytes, release advertised {total}");
        }

        if let Some(expected) = &release.download_sha256 {
            let actual = sha256_file(temp.path())?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(DownloadError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
            info!("Checksum verified for {file_name}");
        }

        let dest = self.dest_dir.join(file_name);
        temp.persist(&dest).map_err(|error| {
            DownloadError::io_with_path("failed to move download into place", &dest, &error.error)
        })?;

        info!("Saved update to {}", dest.display());
        Ok(dest)
    }
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, DownloadError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| DownloadError::http("download request failed", error))?;

    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status()));
    }

    let mut file = tokio::fs::File::create(dest).await.map_err(|error| {
        DownloadError::io_with_path("failed to create download file", dest, &error)
    })?;

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| DownloadError::http("download stream error", error))?;
        file.write_all(&chunk).await.map_err(|error| {
            DownloadError::io_with_path("failed to write download data", dest, &error)
        })?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await.map_err(|error| {
        DownloadError::io_with_path("failed to flush download file", dest, &error)
    })?;

    debug!("Download complete: {downloaded} bytes");
    Ok(downloaded)
}

fn file_name_from_url(url: &str) -> &str {
    let raw = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or(FALLBACK_FILE_NAME);
    Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && !n.contains(".."))
        .unwrap_or(FALLBACK_FILE_NAME)
}

fn sha256_file(path: &Path) -> Result<String, DownloadError> {
    let mut file = std::fs::File::open(path).map_err(|error| {
        DownloadError::io_with_path("failed to open file for checksum", path, &error)
    })?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];

    loop {
        let read = file.read(&mut buffer).map_err(|error| {
            DownloadError::io_with_path("failed to read file for checksum", path, &error)
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
