use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to resolve application paths: {0}")]
    Paths(#[from] relcheck_platform::AppPathsError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("update check task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
