use std::path::PathBuf;

use relcheck_core::BaselinePolicy;
use relcheck_platform::AppPaths;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_repo")]
    pub repo: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Release asset to download, `{version}` is replaced with the tag.
    #[serde(default)]
    pub asset_name: Option<String>,

    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    #[serde(default)]
    pub baseline_policy: BaselinePolicy,
}

fn default_repo() -> String {
    "relcheck/relcheck".to_string()
}

fn default_api_base_url() -> String {
    relcheck_core::source::GITHUB_API_BASE.to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            api_base_url: default_api_base_url(),
            asset_name: None,
            download_dir: None,
            http_timeout_secs: default_http_timeout(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            baseline_policy: BaselinePolicy::default(),
        }
    }
}

impl AppSettings {
    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load(paths: &AppPaths) -> Self {
        let settings_path = paths.settings_file();
        if !settings_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&settings_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!(
                    "Ignoring invalid settings at {}: {error}",
                    settings_path.display()
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, paths: &AppPaths) -> Result<(), std::io::Error> {
        paths.ensure_dirs()?;

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.settings_file(), content)?;
        Ok(())
    }

    pub fn asset_template(&self) -> String {
        self.asset_name
            .clone()
            .unwrap_or_else(|| relcheck_core::default_asset_template(env!("CARGO_PKG_NAME")))
    }

    pub fn download_dir(&self, paths: &AppPaths) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| paths.downloads_dir())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AppPaths, AppSettings, BaselinePolicy};

    #[test]
    fn app_settings_defaults() {
        let settings = AppSettings::default();

        assert_eq!(settings.repo, "relcheck/relcheck");
        assert_eq!(settings.api_base_url, "https://api.github.com");
        assert_eq!(settings.http_timeout_secs, 30);
        assert_eq!(settings.max_log_size_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.baseline_policy, BaselinePolicy::AdvanceOnDownload);
        assert!(!settings.debug_logging);
        assert!(settings.asset_name.is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let value = json!({
            "repo": "google/android-classyshark",
            "baseline_policy": "fixed"
        });

        let settings: AppSettings =
            serde_json::from_value(value).expect("settings JSON should deserialize");

        assert_eq!(settings.repo, "google/android-classyshark");
        assert_eq!(settings.baseline_policy, BaselinePolicy::Fixed);
        assert_eq!(settings.http_timeout_secs, 30);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::rooted_at(temp.path());
        let settings = AppSettings {
            asset_name: Some("ClassyShark.jar".to_string()),
            debug_logging: true,
            ..AppSettings::default()
        };

        settings.save(&paths).expect("settings should save");
        let loaded = AppSettings::load(&paths);

        assert_eq!(loaded.asset_name.as_deref(), Some("ClassyShark.jar"));
        assert!(loaded.debug_logging);
        assert_eq!(loaded.asset_template(), "ClassyShark.jar");
    }

    #[test]
    fn load_falls_back_to_defaults_on_invalid_json() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::rooted_at(temp.path());
        paths.ensure_dirs().expect("dirs should be created");
        std::fs::write(paths.settings_file(), "{ not json").expect("file should be written");

        let loaded = AppSettings::load(&paths);

        assert_eq!(loaded.repo, "relcheck/relcheck");
    }

    #[test]
    fn download_dir_defaults_to_cache_downloads() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::rooted_at(temp.path());
        let mut settings = AppSettings::default();

        assert_eq!(settings.download_dir(&paths), paths.downloads_dir());

        settings.download_dir = Some(temp.path().join("elsewhere"));
        assert_eq!(settings.download_dir(&paths), temp.path().join("elsewhere"));
    }
}
