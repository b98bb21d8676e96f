//! Core update-check logic for relcheck.
//!
//! This crate is independent of the binary's UI and settings:
//! - Release model and version ordering.
//! - GitHub "latest release" source.
//! - Artifact downloader.
//! - Presenter capability and the console presenter.
//! - The update coordinator that ties them together.

pub mod coordinator;
pub mod download;
pub mod notify;
pub mod release;
pub mod source;

/// Check-cycle orchestration and its outcomes.
pub use coordinator::{BaselinePolicy, CheckOutcome, UpdateCoordinator};
/// Artifact download capability and HTTP implementation.
pub use download::{DownloadError, Downloader, HttpDownloader};
/// Notification capability, display modes, and console output.
pub use notify::{ConsolePresenter, DisplayMode, Presenter, Presenters};
/// Release model and version ordering.
pub use release::{Release, Version};
/// Latest-release lookup.
pub use source::{
    FetchError, GitHubRelease, GitHubReleaseSource, ReleaseSource, default_asset_template,
};
