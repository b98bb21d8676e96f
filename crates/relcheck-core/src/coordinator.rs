//! One update-check cycle: fetch the latest release, compare it against the
//! baseline, download it in the background and announce it.
//!
//! Downloads run in a single slot. A check that finds a newer release while
//! another download is still running is rejected with [`CheckOutcome::Busy`]
//! instead of starting a second download.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use crate::download::{DownloadError, Downloader};
use crate::notify::{DisplayMode, Presenters};
use crate::release::{Release, Version};
use crate::source::{FetchError, ReleaseSource};

/// What happens to the baseline after a successful download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselinePolicy {
    /// Keep comparing against the baseline given at construction.
    Fixed,
    /// The downloaded release becomes the new baseline.
    #[default]
    AdvanceOnDownload,
}

#[derive(Debug)]
pub enum CheckOutcome {
    UpToDate { latest: Version },
    Updated { release: Release, path: PathBuf },
    Busy { latest: Version },
    FetchFailed(FetchError),
    DownloadFailed(DownloadError),
}

impl CheckOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed(_) | Self::DownloadFailed(_))
    }
}

enum SlotClaim {
    Claimed {
        permit: OwnedSemaphorePermit,
        baseline: Release,
    },
    Busy,
    AlreadyDownloaded,
}

pub struct UpdateCoordinator {
    source: Arc<dyn ReleaseSource>,
    downloader: Arc<dyn Downloader>,
    presenters: Presenters,
    baseline: Arc<RwLock<Release>>,
    policy: BaselinePolicy,
    download_slot: Arc<Semaphore>,
}

impl UpdateCoordinator {
    /// Coordinator with an empty baseline, so any fetched release with a
    /// version counts as newer.
    pub fn new(
        source: Arc<dyn ReleaseSource>,
        downloader: Arc<dyn Downloader>,
        presenters: Presenters,
    ) -> Self {
        Self {
            source,
            downloader,
            presenters,
            baseline: Arc::new(RwLock::new(Release::default())),
            policy: BaselinePolicy::default(),
            download_slot: Arc::new(Semaphore::new(1)),
        }
    }

    #[must_use]
    pub fn with_baseline(self, baseline: Release) -> Self {
        *self
            .baseline
            .write()
            .unwrap_or_else(PoisonError::into_inner) = baseline;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: BaselinePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn baseline(&self) -> Release {
        self.baseline
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Start a check cycle that reports to the console.
    pub fn check_console(self: &Arc<Self>) -> JoinHandle<CheckOutcome> {
        self.spawn_check(DisplayMode::Console)
    }

    /// Start a check cycle that reports through a dialog.
    pub fn check_gui(self: &Arc<Self>) -> JoinHandle<CheckOutcome> {
        self.spawn_check(DisplayMode::Gui)
    }

    pub fn spawn_check(self: &Arc<Self>, mode: DisplayMode) -> JoinHandle<CheckOutcome> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.check(mode).await })
    }

    /// Take the download slot for `release`. The baseline is read again once
    /// the slot is held, since a download that just finished may have
    /// advanced it past `release`.
    fn claim_download_slot(&self, release: &Release) -> SlotClaim {
        let Ok(permit) = Arc::clone(&self.download_slot).try_acquire_owned() else {
            warn!(
                "Release {} found but another download is in progress",
                release.version
            );
            return SlotClaim::Busy;
        };

        let baseline = self.baseline();
        if !release.is_newer_than(&baseline) {
            debug!(
                "Release {} was already downloaded (baseline {})",
                release.version, baseline.version
            );
            return SlotClaim::AlreadyDownloaded;
        }
        SlotClaim::Claimed { permit, baseline }
    }

    /// Run one check cycle to completion.
    pub async fn check(&self, mode: DisplayMode) -> CheckOutcome {
        let release = match self.source.latest_release().await {
            Ok(release) => release,
            Err(e) => {
                error!("Update check failed: {e}");
                return CheckOutcome::FetchFailed(e);
            }
        };

        let baseline = self.baseline();
        if !release.is_newer_than(&baseline) {
            debug!(
                "Latest release {} is not newer than {}",
                release.version, baseline.version
            );
            return CheckOutcome::UpToDate {
                latest: release.version,
            };
        }

        let (permit, baseline) = match self.claim_download_slot(&release) {
            SlotClaim::Claimed { permit, baseline } => (permit, baseline),
            SlotClaim::Busy => {
                return CheckOutcome::Busy {
                    latest: release.version,
                };
            }
            SlotClaim::AlreadyDownloaded => {
                return CheckOutcome::UpToDate {
                    latest: release.version,
                };
            }
        };

        info!(
            "New release {} available (baseline {})",
            release.version, baseline.version
        );

        let downloader = Arc::clone(&self.downloader);
        let presenter = Arc::clone(self.presenters.for_mode(mode));
        let baseline_slot = Arc::clone(&self.baseline);
        let policy = self.policy;

        let task = tokio::spawn(async move {
            let _permit = permit;
            match downloader.download(&release).await {
                Ok(path) => {
                    if policy == BaselinePolicy::AdvanceOnDownload {
                        *baseline_slot
                            .write()
                            .unwrap_or_else(PoisonError::into_inner) = release.clone();
                    }
                    presenter.present(&release.name, &release.changelog);
                    CheckOutcome::Updated { release, path }
                }
                Err(e) => {
                    error!("Update download failed: {e}");
                    CheckOutcome::DownloadFailed(e)
                }
            }
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                error!("Update download task failed: {join_error}");
                CheckOutcome::DownloadFailed(DownloadError::io(
                    "download task failed",
                    std::io::Error::other(join_error.to_string()),
                ))
            }
        }
    }
}
