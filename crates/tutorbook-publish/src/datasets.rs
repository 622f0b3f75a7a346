//! Dataset downloads declared in tutorial manifests.
//!
//! ```yaml
//! datasets:
//!   web:
//!     - https://pl-flash-data.s3.amazonaws.com/titanic.zip
//!   kaggle:
//!     - titanic
//! ```

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use url::Url;

use tutorbook_core::{CommandRunner, ToolCommand};

use crate::error::{PublishError, PublishResult};

/// Downloads datasets into a shared directory.
pub trait DatasetFetcher: Send + Sync {
    /// Download a file from `url` into `dest_dir`, returning its local path.
    fn fetch_web(&self, url: &str, dest_dir: &Path) -> PublishResult<PathBuf>;

    /// Download a Kaggle competition's data into `dest_dir`.
    fn fetch_kaggle(&self, competition: &str, dest_dir: &Path) -> PublishResult<PathBuf>;
}

/// Local layout of a web download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// File name of the payload as served.
    pub file_name: String,

    /// Name after gzip decompression, for `.gz` files that are not tarballs.
    pub unpacked_name: Option<String>,
}

impl DownloadTarget {
    /// Derive the local file names from the last path segment of `url`.
    pub fn from_url(url: &str) -> PublishResult<Self> {
        let parsed = Url::parse(url).map_err(|e| PublishError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PublishError::Download {
                url: url.to_string(),
                message: "URL has no file name".to_string(),
            })?
            .to_string();

        let unpacked_name = match file_name.strip_suffix(".gz") {
            Some(stem) if !stem.ends_with(".tar") => Some(stem.to_string()),
            _ => None,
        };

        Ok(Self {
            file_name,
            unpacked_name,
        })
    }

    /// Final local path under `dest_dir`.
    pub fn local_path(&self, dest_dir: &Path) -> PathBuf {
        dest_dir.join(self.unpacked_name.as_deref().unwrap_or(&self.file_name))
    }
}

/// [`DatasetFetcher`] using `reqwest` for web files and the `kaggle` CLI.
pub struct HttpFetcher {
    runner: Arc<dyn CommandRunner>,
}

impl HttpFetcher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl DatasetFetcher for HttpFetcher {
    fn fetch_web(&self, url: &str, dest_dir: &Path) -> PublishResult<PathBuf> {
        let target = DownloadTarget::from_url(url)?;
        let local = target.local_path(dest_dir);
        if local.exists() {
            tracing::info!("Dataset {} already present", local.display());
            return Ok(local);
        }

        tracing::info!("Downloading {} into {}", url, dest_dir.display());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let bytes = runtime.block_on(download(url, &dest_dir.join(&target.file_name)))?;

        if target.unpacked_name.is_some() {
            let mut decoder = flate2::read::GzDecoder::new(&bytes[..]);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| PublishError::Download {
                    url: url.to_string(),
                    message: format!("failed to decompress: {e}"),
                })?;
            fs::write(&local, decompressed)?;
            fs::remove_file(dest_dir.join(&target.file_name))?;
        }

        Ok(local)
    }

    fn fetch_kaggle(&self, competition: &str, dest_dir: &Path) -> PublishResult<PathBuf> {
        let archive = dest_dir.join(format!("{competition}.zip"));
        if archive.exists() {
            tracing::info!("Kaggle dataset {} already present", competition);
            return Ok(archive);
        }

        fs::create_dir_all(dest_dir)?;
        let command = ToolCommand::new("kaggle")
            .args(["competitions", "download", "-c", competition, "-p"])
            .arg(dest_dir.to_string_lossy());
        self.runner.run(&command)?;
        Ok(archive)
    }
}

/// Download `url` to `path`, returning the payload.
async fn download(url: &str, path: &Path) -> PublishResult<Vec<u8>> {
    let failed = |message: String| PublishError::Download {
        url: url.to_string(),
        message,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let response = reqwest::get(url).await.map_err(|e| failed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| failed(format!("failed to read response: {e}")))?;

    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;

    Ok(bytes.to_vec())
}
