//! The UI loop and the dialog presenter.
//!
//! Dialogs are only ever shown from the thread running [`UiLoop::run`]. In the
//! binary that is the main thread, which is what native dialog APIs expect.

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use relcheck_core::Presenter;

type UiJob = Box<dyn FnOnce() + Send>;

/// Posts work onto the UI loop. The loop stops once every handle is dropped.
#[derive(Clone)]
pub struct UiHandle {
    sender: Sender<UiJob>,
}

pub struct UiLoop {
    receiver: Receiver<UiJob>,
}

pub fn channel() -> (UiHandle, UiLoop) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (UiHandle { sender }, UiLoop { receiver })
}

impl UiHandle {
    /// Queue `job` for the UI thread. Returns `false` if the loop is gone.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.sender.send(Box::new(job)).is_ok()
    }
}

impl UiLoop {
    /// Run queued jobs on the current thread until all handles are dropped.
    pub fn run(self) -> usize {
        let mut executed = 0;
        while let Ok(job) = self.receiver.recv() {
            job();
            executed += 1;
        }
        debug!("UI loop finished after {executed} job(s)");
        executed
    }
}

type DialogRenderer = fn(&str, &str);

/// Shows the update notice as a modal message dialog on the UI loop.
pub struct DialogPresenter {
    ui: UiHandle,
    render: DialogRenderer,
}

impl DialogPresenter {
    pub fn new(ui: UiHandle) -> Self {
        Self {
            ui,
            render: show_message_dialog,
        }
    }

    #[cfg(test)]
    fn with_renderer(ui: UiHandle, render: DialogRenderer) -> Self {
        Self { ui, render }
    }
}

impl Presenter for DialogPresenter {
    fn present(&self, name: &str, changelog: &str) {
        let title = name.to_string();
        let body = changelog.to_string();
        let render = self.render;
        if !self.ui.post(move || render(&title, &body)) {
            warn!("UI loop is closed, dropping update dialog for {name}");
        }
    }
}

fn show_message_dialog(title: &str, body: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Info)
        .set_title(title)
        .set_description(body)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
