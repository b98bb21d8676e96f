//! Last downloaded release, kept across runs so a later process does not
//! download the same artifact again.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use relcheck_core::{Release, Version};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateState {
    pub last_downloaded_version: Option<String>,
    pub downloaded_at: Option<DateTime<Utc>>,
    pub artifact_path: Option<PathBuf>,
}

impl UpdateState {
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }

    pub fn record_download(&mut self, release: &Release, artifact: &Path) {
        self.last_downloaded_version = Some(release.version.to_string());
        self.downloaded_at = Some(Utc::now());
        self.artifact_path = Some(artifact.to_path_buf());
    }

    /// Baseline for this run. An explicit version is used as given;
    /// otherwise the newer of the installed version and the last download.
    pub fn baseline_for(&self, explicit: Option<&str>, installed: &str) -> Release {
        match explicit {
            Some(version) => Release::installed(version),
            None => self.baseline(installed),
        }
    }

    /// The newer of the installed version and the last downloaded one.
    pub fn baseline(&self, installed: &str) -> Release {
        let installed = Release::installed(installed);
        match self.last_downloaded_version.as_deref().map(Version::parse) {
            Some(downloaded) if downloaded > installed.version => Release {
                version: downloaded,
                ..Release::default()
            },
            _ => installed,
        }
    }
}
