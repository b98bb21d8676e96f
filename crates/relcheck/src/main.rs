mod cli;
mod error;
mod logging;
mod report;
mod settings;
mod state;
mod ui;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};
use relcheck_core::{
    CheckOutcome, ConsolePresenter, DisplayMode, GitHubReleaseSource, HttpDownloader, Presenters,
    UpdateCoordinator,
};
use relcheck_platform::AppPaths;

use crate::cli::Cli;
use crate::error::AppError;
use crate::settings::AppSettings;
use crate::state::UpdateState;
use crate::ui::DialogPresenter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let exit = report::exit_for(&run(&cli));
    if let Some(message) = exit.message {
        eprintln!("{message}");
    }
    exit.code
}

fn run(cli: &Cli) -> Result<CheckOutcome, AppError> {
    let paths = AppPaths::new()?;
    let mut settings = AppSettings::load(&paths);
    if !paths.settings_file().exists()
        && let Err(error) = settings.save(&paths)
    {
        eprintln!("Could not write default settings: {error}");
    }
    cli.apply_to(&mut settings);
    logging::init_logging(&paths, settings.debug_logging, settings.max_log_size_bytes);

    let state_path = paths.state_file();
    let mut update_state = UpdateState::load(&state_path);
    let baseline =
        update_state.baseline_for(cli.baseline_override(), env!("CARGO_PKG_VERSION"));
    info!("Checking {} for releases newer than {}", settings.repo, baseline.version);

    let client = reqwest::Client::builder()
        .user_agent(format!("relcheck/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()
        .map_err(AppError::HttpClient)?;

    let source = GitHubReleaseSource::new(client.clone(), &settings.repo, settings.asset_template())
        .with_api_base(&settings.api_base_url);
    let downloader = HttpDownloader::new(client, settings.download_dir(&paths));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;

    let (ui_handle, ui_loop) = ui::channel();
    let presenters = Presenters::new(
        Arc::new(ConsolePresenter::stdout()),
        Arc::new(DialogPresenter::new(ui_handle)),
    );
    let coordinator = Arc::new(
        UpdateCoordinator::new(Arc::new(source), Arc::new(downloader), presenters)
            .with_baseline(baseline)
            .with_policy(settings.baseline_policy),
    );

    let mode = cli.display_mode();
    let cycle = runtime.spawn(async move {
        let check = match mode {
            DisplayMode::Console => coordinator.check_console(),
            DisplayMode::Gui => coordinator.check_gui(),
        };
        // Dropping the coordinator releases the last UI handle once the
        // check task is done, which ends the UI loop below.
        drop(coordinator);
        check.await
    });

    ui_loop.run();
    let outcome = runtime.block_on(cycle)??;

    match &outcome {
        CheckOutcome::Updated { release, path } => {
            update_state.record_download(release, path);
            if let Err(error) = update_state.save(&state_path) {
                warn!("Failed to save update state: {error}");
            }
            info!("Release {} saved to {}", release.version, path.display());
        }
        CheckOutcome::UpToDate { latest } => info!("Up to date (latest release {latest})"),
        CheckOutcome::Busy { latest } => {
            info!("Release {latest} is already being downloaded");
        }
        CheckOutcome::FetchFailed(_) | CheckOutcome::DownloadFailed(_) => {}
    }
    Ok(outcome)
}
