use std::io::Write;
use std::sync::{Arc, Mutex};

use log::warn;

/// How a found update is announced to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    #[default]
    Console,
    Gui,
}

/// Announces an available release. Fire-and-forget.
pub trait Presenter: Send + Sync {
    fn present(&self, name: &str, changelog: &str);
}

/// Writes the release name and changelog to a console stream.
pub struct ConsolePresenter<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsolePresenter<std::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> Presenter for ConsolePresenter<W> {
    fn present(&self, name: &str, changelog: &str) {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let result = if changelog.trim().is_empty() {
            writeln!(out, "{name}")
        } else {
            writeln!(out, "{name}\n\n{changelog}")
        };
        if let Err(error) = result.and_then(|()| out.flush()) {
            warn!("Failed to write update notice: {error}");
        }
    }
}

/// One presenter per display mode.
#[derive(Clone)]
pub struct Presenters {
    pub console: Arc<dyn Presenter>,
    pub dialog: Arc<dyn Presenter>,
}

impl Presenters {
    pub fn new(console: Arc<dyn Presenter>, dialog: Arc<dyn Presenter>) -> Self {
        Self { console, dialog }
    }

    #[must_use]
    pub fn for_mode(&self, mode: DisplayMode) -> &Arc<dyn Presenter> {
        match mode {
            DisplayMode::Console => &self.console,
            DisplayMode::Gui => &self.dialog,
        }
    }
}
