// Tests for Downloader against a mocked HTTP server
// Uses mockito for HTTP mocking

use mockito::Server;
use std::fs;
use tempfile::TempDir;

use eu_state_aids::fetch_error::FetchError;
use eu_state_aids::importers::Downloader;

#[tokio::test]
async fn test_download_success() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/OpenData_Aiuti_2019_03.xml.zip")
        .with_status(200)
        .with_header("content-type", "application/zip")
        .with_body(b"fake zip data")
        .create_async()
        .await;

    let downloader = Downloader::new();
    let result = downloader
        .download(&format!("{}/OpenData_Aiuti_2019_03.xml.zip", server.url()))
        .await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap(), b"fake zip data");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_download_404() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/OpenData_Aiuti_2021_08.xml.zip")
        .with_status(404)
        .create_async()
        .await;

    let downloader = Downloader::new();
    let result = downloader
        .download(&format!("{}/OpenData_Aiuti_2021_08.xml.zip", server.url()))
        .await;

    match result.unwrap_err() {
        FetchError::NotFound(msg) => {
            assert!(msg.contains("OpenData_Aiuti_2021_08.xml.zip"));
            assert!(msg.contains("not found"));
        }
        other => panic!("Expected NotFound error, got {other:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_download_server_error() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/document/860")
        .with_status(500)
        .create_async()
        .await;

    let downloader = Downloader::new();
    let result = downloader
        .download(&format!("{}/document/860", server.url()))
        .await;

    match result.unwrap_err() {
        FetchError::ServerError(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("/document/860"));
        }
        other => panic!("Expected ServerError, got {other:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_download_unexpected_status() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/forbidden")
        .with_status(403)
        .create_async()
        .await;

    let result = Downloader::new()
        .download(&format!("{}/forbidden", server.url()))
        .await;

    let err = result.unwrap_err();
    assert!(err.is_unavailable());
    assert!(matches!(
        err,
        FetchError::UnexpectedStatus { status: 403, .. }
    ));
}

#[tokio::test]
async fn test_download_connection_refused() {
    // Nothing listens on port 1
    let result = Downloader::new().download("http://127.0.0.1:1/file.zip").await;

    let err = result.unwrap_err();
    assert!(matches!(err, FetchError::Request(_)));
    assert!(!err.is_unavailable());
}

#[tokio::test]
async fn test_download_to_creates_directory() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/projects.xlsx")
        .with_status(200)
        .with_body(b"xlsx bytes")
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("data").join("bg").join("projects_2015.xlsx");

    let saved = Downloader::new()
        .download_to(&format!("{}/projects.xlsx", server.url()), &dest)
        .await
        .unwrap();

    assert_eq!(saved, dest);
    assert_eq!(fs::read(&dest).unwrap(), b"xlsx bytes");
}

#[tokio::test]
async fn test_download_to_overwrites_previous_copy() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/projects.xlsx")
        .with_status(200)
        .with_body(b"fresh")
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("projects_2015.xlsx");
    fs::write(&dest, b"stale copy").unwrap();

    Downloader::new()
        .download_to(&format!("{}/projects.xlsx", server.url()), &dest)
        .await
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), b"fresh");
}

#[tokio::test]
async fn test_download_to_failure_writes_nothing() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/missing.xlsx")
        .with_status(404)
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("missing.xlsx");

    let result = Downloader::new()
        .download_to(&format!("{}/missing.xlsx", server.url()), &dest)
        .await;

    assert!(result.is_err());
    assert!(!dest.exists());
}
