//! Contract tests for the GitHub release source and the HTTP downloader,
//! run against a local mock server.

use std::sync::{Arc, Mutex};

use relcheck_core::{
    BaselinePolicy, CheckOutcome, DisplayMode, DownloadError, Downloader, FetchError,
    GitHubReleaseSource, HttpDownloader, Presenter, Presenters, Release, ReleaseSource,
    UpdateCoordinator, Version,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTIFACT: &[u8] = b"new artifact bytes";
const ARTIFACT_SHA256: &str = "72ad6acc9c104a19861b152cd8f95321c3ba1d22699c91a495c3697da187487c";

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("relcheck-tests")
        .build()
        .expect("test client should build")
}

fn release_json(server: &MockServer, tag: &str, digest: &str) -> serde_json::Value {
    json!({
        "tag_name": tag,
        "name": format!("ClassyShark {tag}"),
        "html_url": format!("https://github.com/google/android-classyshark/releases/tag/{tag}"),
        "body": "- faster dex parsing",
        "assets": [{
            "name": "ClassyShark.jar",
            "browser_download_url": format!("{}/download/ClassyShark.jar", server.uri()),
            "size": ARTIFACT.len(),
            "digest": digest
        }]
    })
}

async fn mount_latest(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/repos/google/android-classyshark/releases/latest"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn source(server: &MockServer) -> GitHubReleaseSource {
    GitHubReleaseSource::new(client(), "google/android-classyshark", "ClassyShark.jar")
        .with_api_base(server.uri())
}

#[tokio::test]
async fn latest_release_maps_github_fields() {
    let server = MockServer::start().await;
    mount_latest(
        &server,
        release_json(&server, "v8.2", &format!("sha256:{ARTIFACT_SHA256}")),
    )
    .await;

    let release = source(&server)
        .latest_release()
        .await
        .expect("latest release should be fetched");

    assert_eq!(release.version, Version::parse("8.2.0"));
    assert_eq!(release.name, "ClassyShark v8.2");
    assert_eq!(release.changelog, "- faster dex parsing");
    assert_eq!(
        release.download_url,
        Some(format!("{}/download/ClassyShark.jar", server.uri()))
    );
    assert_eq!(release.download_sha256.as_deref(), Some(ARTIFACT_SHA256));
}

#[tokio::test]
async fn latest_release_reports_http_status_with_snippet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("rate limit exceeded"))
        .mount(&server)
        .await;

    let result = source(&server).latest_release().await;

    match result {
        Err(FetchError::HttpStatus {
            status,
            body_snippet,
        }) => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(body_snippet, ": rate limit exceeded");
        }
        other => panic!("expected HTTP status error, got {other:?}"),
    }
}

#[tokio::test]
async fn latest_release_reports_parse_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = source(&server).latest_release().await;

    assert!(matches!(result, Err(FetchError::Parse(_))));
}

#[tokio::test]
async fn downloader_writes_verified_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/ClassyShark.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ARTIFACT))
        .expect(1)
        .mount(&server)
        .await;
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let downloader = HttpDownloader::new(client(), temp.path().join("downloads"));
    let release = Release {
        version: Version::parse("8.2"),
        download_url: Some(format!("{}/download/ClassyShark.jar", server.uri())),
        download_sha256: Some(ARTIFACT_SHA256.to_string()),
        ..Release::default()
    };

    let path = downloader
        .download(&release)
        .await
        .expect("download should succeed");

    assert_eq!(path, temp.path().join("downloads").join("ClassyShark.jar"));
    assert_eq!(std::fs::read(&path).expect("artifact should exist"), ARTIFACT);
}

#[tokio::test]
async fn downloader_rejects_checksum_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".to_vec()))
        .mount(&server)
        .await;
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let downloader = HttpDownloader::new(client(), temp.path());
    let release = Release {
        version: Version::parse("8.2"),
        download_url: Some(format!("{}/download/ClassyShark.jar", server.uri())),
        download_sha256: Some(ARTIFACT_SHA256.to_string()),
        ..Release::default()
    };

    let result = downloader.download(&release).await;

    assert!(matches!(result, Err(DownloadError::ChecksumMismatch { .. })));
    assert!(!temp.path().join("ClassyShark.jar").exists());
}

#[tokio::test]
async fn downloader_reports_http_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let downloader = HttpDownloader::new(client(), temp.path());
    let release = Release {
        version: Version::parse("8.2"),
        download_url: Some(format!("{}/download/ClassyShark.jar", server.uri())),
        ..Release::default()
    };

    let result = downloader.download(&release).await;

    assert!(matches!(
        result,
        Err(DownloadError::Status(status)) if status.as_u16() == 404
    ));
}

#[derive(Default)]
struct Collected(Mutex<Vec<String>>);

impl Presenter for Collected {
    fn present(&self, name: &str, _changelog: &str) {
        self.0.lock().expect("collected lock").push(name.to_string());
    }
}

#[tokio::test]
async fn full_cycle_downloads_and_notifies_once() {
    let server = MockServer::start().await;
    mount_latest(
        &server,
        release_json(&server, "1.2.0", &format!("sha256:{ARTIFACT_SHA256}")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/download/ClassyShark.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ARTIFACT))
        .expect(1)
        .mount(&server)
        .await;
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let console = Arc::new(Collected::default());
    let dialog = Arc::new(Collected::default());
    let coordinator = Arc::new(
        UpdateCoordinator::new(
            Arc::new(source(&server)),
            Arc::new(HttpDownloader::new(client(), temp.path())),
            Presenters::new(console.clone(), dialog.clone()),
        )
        .with_baseline(Release::installed("0"))
        .with_policy(BaselinePolicy::AdvanceOnDownload),
    );

    let first = coordinator
        .check_console()
        .await
        .expect("check task should not panic");
    let second = coordinator.check(DisplayMode::Console).await;

    assert!(matches!(first, CheckOutcome::Updated { .. }));
    assert!(matches!(second, CheckOutcome::UpToDate { .. }));
    assert_eq!(
        *console.0.lock().expect("collected lock"),
        vec!["ClassyShark 1.2.0".to_string()]
    );
    assert!(dialog.0.lock().expect("collected lock").is_empty());
    assert!(temp.path().join("ClassyShark.jar").is_file());
}
