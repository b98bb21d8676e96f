use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::release::{Release, Version};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch latest release: {0}")]
    Request(#[source] reqwest::Error),
    #[error("latest release request failed with HTTP {status}{body_snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body_snippet: String,
    },
    #[error("failed to parse latest release response: {0}")]
    Parse(#[source] reqwest::Error),
}

/// Where the "latest release" record comes from.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_release(&self) -> Result<Release, FetchError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
    #[serde(default)]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

impl GitHubRelease {
    /// Map the API record onto a [`Release`], picking the asset named
    /// `asset_template` (with `{version}` substituted).
    #[must_use]
    pub fn into_release(self, asset_template: &str) -> Release {
        let version = Version::parse(&self.tag_name);
        let bare_tag = self
            .tag_name
            .trim()
            .strip_prefix(['v', 'V'])
            .unwrap_or(self.tag_name.trim());
        let expected = asset_template.replace("{version}", bare_tag);

        let asset = self
            .assets
            .iter()
            .find(|asset| asset.name == expected)
            .or_else(|| match self.assets.as_slice() {
                [only] => Some(only),
                _ => None,
            });
        if asset.is_none() {
            debug!("No asset named {expected} in release {}", self.tag_name);
        }

        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.tag_name.clone());

        Release {
            version,
            name,
            changelog: self.body.unwrap_or_default(),
            download_url: asset.map(|a| a.browser_download_url.clone()),
            download_size: asset.map(|a| a.size),
            download_sha256: asset.and_then(|a| parse_sha256_digest(a.digest.as_deref()?)),
        }
    }
}

/// Default asset name for the running platform, as a `{version}` template.
#[must_use]
pub fn default_asset_template(bin_name: &str) -> String {
    let (os, ext) = if cfg!(target_os = "macos") {
        ("macos", "zip")
    } else if cfg!(target_os = "windows") {
        ("windows", "msi")
    } else {
        ("linux", "zip")
    };
    let arch = if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        "x64"
    };
    format!("{bin_name}-{{version}}-{os}-{arch}.{ext}")
}

/// Latest-release lookup against the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubReleaseSource {
    client: reqwest::Client,
    api_base: String,
    repo: String,
    asset_template: String,
}

impl GitHubReleaseSource {
    pub fn new(
        client: reqwest::Client,
        repo: impl Into<String>,
        asset_template: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: GITHUB_API_BASE.to_string(),
            repo: repo.into(),
            asset_template: asset_template.into(),
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn latest_url(&self) -> String {
        format!("{}/repos/{}/releases/latest", self.api_base, self.repo)
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleaseSource {
    async fn latest_release(&self) -> Result<Release, FetchError> {
        let url = self.latest_url();
        debug!("Fetching latest release from {url}");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(FetchError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, 160))
                .unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status,
                body_snippet,
            });
        }

        let release: GitHubRelease = response.json().await.map_err(FetchError::Parse)?;
        Ok(release.into_release(&self.asset_template))
    }
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

fn parse_sha256_digest(digest: &str) -> Option<String> {
    let (algorithm, hash) = digest.split_once(':')?;
    if !algorithm.eq_ignore_ascii_case("sha256") {
        return None;
    }
    if hash.len() != 64 || !hash.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    Some(hash.to_ascii_lowercase())
}
