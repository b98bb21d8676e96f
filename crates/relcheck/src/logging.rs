use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use relcheck_platform::AppPaths;
#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};

/// Append-only log file that is reopened when it disappears underneath us,
/// e.g. when the user clears the data directory while a download runs.
struct LogFileWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LogFileWriter {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() || !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            *guard = Some(open_append(&self.path)?);
        }
        match guard.as_mut() {
            Some(file) => op(file),
            None => Err(io::Error::other("log file unavailable")),
        }
    }
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_mut().map_or(Ok(()), Write::flush)
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Cut an oversized log file down to its most recent half, starting at a line
/// boundary. Returns whether the file was trimmed.
fn trim_log_file(log_path: &Path, max_log_size: u64) -> bool {
    let Ok(metadata) = std::fs::metadata(log_path) else {
        return false;
    };
    if metadata.len() <= max_log_size {
        return false;
    }
    let Ok(contents) = std::fs::read(log_path) else {
        return false;
    };

    let half = contents.len() / 2;
    let keep_from = contents[half..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(half, |pos| half + pos + 1);
    std::fs::write(log_path, &contents[keep_from..]).is_ok()
}

/// Install the global logger: the debug log file under the data directory,
/// plus stderr in debug builds. Nothing is emitted unless `debug_enabled` is
/// set.
pub fn init_logging(paths: &AppPaths, debug_enabled: bool, max_log_size: u64) {
    let _ = paths.ensure_dirs();
    let log_path = paths.log_file();
    trim_log_file(&log_path, max_log_size);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("relcheck")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(
        LevelFilter::Debug,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));
    match LogFileWriter::open(log_path.clone()) {
        Ok(writer) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, writer)),
        Err(error) => eprintln!("Could not open log file {}: {error}", log_path.display()),
    }
    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }

    set_logging_enabled(debug_enabled);

    if debug_enabled {
        log::info!("Debug logging enabled, log file: {}", log_path.display());
    }
}

pub fn set_logging_enabled(enabled: bool) {
    if enabled {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Off);
    }
}
