use clap::Parser;
use relcheck_core::DisplayMode;

use crate::settings::AppSettings;

/// Check for a newer release, download it, and announce it.
#[derive(Debug, Parser)]
#[command(name = "relcheck", version, about)]
pub struct Cli {
    /// Announce the update in a dialog instead of on the console
    #[arg(long)]
    pub gui: bool,

    /// Enable debug logging to stderr and the log file
    #[arg(long)]
    pub debug: bool,

    /// Version to treat as installed, ignoring any recorded download
    /// (defaults to this build's version)
    #[arg(long, value_name = "VERSION")]
    pub baseline: Option<String>,

    /// GitHub repository to check, as OWNER/NAME
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,
}

impl Cli {
    pub fn display_mode(&self) -> DisplayMode {
        if self.gui {
            DisplayMode::Gui
        } else {
            DisplayMode::Console
        }
    }

    pub fn apply_to(&self, settings: &mut AppSettings) {
        if let Some(repo) = &self.repo {
            settings.repo.clone_from(repo);
        }
        if self.debug {
            settings.debug_logging = true;
        }
    }

    pub fn baseline_override(&self) -> Option<&str> {
        self.baseline.as_deref()
    }
}
