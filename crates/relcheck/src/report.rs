use std::process::ExitCode;

use relcheck_core::CheckOutcome;

use crate::error::AppError;

/// How a finished run ends the process.
#[derive(Debug, PartialEq)]
pub struct Exit {
    pub code: ExitCode,
    /// Line for stderr, if the run failed.
    pub message: Option<String>,
}

impl Exit {
    fn success() -> Self {
        Self {
            code: ExitCode::SUCCESS,
            message: None,
        }
    }

    fn failure(reason: &dyn std::fmt::Display) -> Self {
        Self {
            code: ExitCode::FAILURE,
            message: Some(format!("ERROR: {reason}")),
        }
    }
}

pub fn exit_for(result: &Result<CheckOutcome, AppError>) -> Exit {
    match result {
        Ok(
            CheckOutcome::Updated { .. } | CheckOutcome::UpToDate { .. } | CheckOutcome::Busy { .. },
        ) => Exit::success(),
        Ok(CheckOutcome::FetchFailed(e)) => Exit::failure(e),
        Ok(CheckOutcome::DownloadFailed(e)) => Exit::failure(e),
        Err(e) => Exit::failure(e),
    }
}
