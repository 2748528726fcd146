// ABOUTME: Archive downloader for finished zip tasks
// ABOUTME: Streams the archive into a temp file in save_dir and atomically renames it into place

use anyhow::{Context, Result};
use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::MirrorError;
use crate::remote::SeafileClient;

pub const ARCHIVE_SUFFIX: &str = ".zip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArchive {
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

pub fn archive_path(save_dir: &Path, directory_name: &str) -> PathBuf {
    save_dir.join(format!("{}{}", directory_name, ARCHIVE_SUFFIX))
}

/// Downloads the archive of a ready job to `{save_dir}/{directory_name}.zip`,
/// replacing any existing file. Nothing is left behind if the stream fails.
pub async fn download_ready_job(
    client: &SeafileClient,
    token: &str,
    directory_name: &str,
    save_dir: &Path,
) -> Result<DownloadedArchive> {
    info!("Downloading directory '{}'...", directory_name);

    let response = client.open_zip(token).await?;
    let target = archive_path(save_dir, directory_name);

    let mut tmp = NamedTempFile::new_in(save_dir).map_err(|e| {
        MirrorError::Filesystem(format!(
            "Cannot create temporary file in {}: {}",
            save_dir.display(),
            e
        ))
    })?;

    let mut hasher = Sha256::new();
    let mut bytes: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .with_context(|| format!("Archive stream for '{}' was interrupted", directory_name))?;
        tmp.write_all(&chunk).map_err(|e| {
            MirrorError::Filesystem(format!("Failed writing {}: {}", target.display(), e))
        })?;
        hasher.update(&chunk);
        bytes += chunk.len() as u64;
    }

    tmp.flush()
        .map_err(|e| MirrorError::Filesystem(format!("Failed writing {}: {}", target.display(), e)))?;
    tmp.persist(&target).map_err(|e| {
        MirrorError::Filesystem(format!("Failed to move archive to {}: {}", target.display(), e))
    })?;

    let sha256 = format!("{:x}", hasher.finalize());
    info!(
        "Successfully downloaded directory '{}' ({} bytes, sha256 {}).",
        directory_name, bytes, sha256
    );

    Ok(DownloadedArchive {
        path: target,
        bytes,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAYLOAD: &[u8] = b"PK\x03\x04fake archive body";

    async fn mount_archive(server: &MockServer, token: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(format!("/seafhttp/zip/{}", token)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
    }

    fn zip_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_archive_path() {
        assert_eq!(
            archive_path(Path::new("/backup"), "My Docs"),
            PathBuf::from("/backup/My Docs.zip")
        );
    }

    #[tokio::test]
    async fn test_download_writes_archive() {
        let server = MockServer::start().await;
        mount_archive(&server, "tok-1", PAYLOAD).await;
        let dir = TempDir::new().unwrap();

        let client = SeafileClient::new(&server.uri(), "secret").unwrap();
        let archive = download_ready_job(&client, "tok-1", "Docs", dir.path())
            .await
            .unwrap();

        assert_eq!(archive.path, dir.path().join("Docs.zip"));
        assert_eq!(archive.bytes, PAYLOAD.len() as u64);
        assert_eq!(std::fs::read(&archive.path).unwrap(), PAYLOAD);
        assert_eq!(zip_files(dir.path()), vec!["Docs.zip"]);
    }

    #[tokio::test]
    async fn test_download_twice_overwrites_identically() {
        let server = MockServer::start().await;
        mount_archive(&server, "tok-1", PAYLOAD).await;
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Docs.zip"), b"stale").unwrap();

        let client = SeafileClient::new(&server.uri(), "secret").unwrap();
        let first = download_ready_job(&client, "tok-1", "Docs", dir.path())
            .await
            .unwrap();
        let second = download_ready_job(&client, "tok-1", "Docs", dir.path())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(dir.path().join("Docs.zip")).unwrap(), PAYLOAD);
        assert_eq!(zip_files(dir.path()), vec!["Docs.zip"]);
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/seafhttp/zip/tok-gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Token invalid"))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();

        let client = SeafileClient::new(&server.uri(), "secret").unwrap();
        let err = download_ready_job(&client, "tok-gone", "Docs", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MirrorError>(),
            Some(MirrorError::Api(_))
        ));
        assert!(zip_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_save_dir_is_filesystem_error() {
        let server = MockServer::start().await;
        mount_archive(&server, "tok-1", PAYLOAD).await;
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        let client = SeafileClient::new(&server.uri(), "secret").unwrap();
        let err = download_ready_job(&client, "tok-1", "Docs", &missing)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MirrorError>(),
            Some(MirrorError::Filesystem(_))
        ));
    }
}
