// ABOUTME: HTTP client for the Seafile v2.1 web API and the seafhttp file server
// ABOUTME: Handles directory listing, zip-task creation, progress queries and archive fetches

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};
use std::time::Duration;

use super::models::{Dirent, DirentList, ProgressReply, ZipTask};
use crate::error::MirrorError;

pub struct SeafileClient {
    client: Client,
    api_base_url: String,
}

/// Turns `--server` into a base URL. Bare hosts get `https://`.
pub fn base_url(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.contains("://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    }
}

impl SeafileClient {
    pub fn new(server: &str, auth_token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Token {}", auth_token))
            .context("Auth token contains characters that are not allowed in an HTTP header")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // No overall timeout: archive bodies can take arbitrarily long to stream.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base_url: base_url(server),
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub async fn list_dir(&self, repo_id: &str) -> Result<Vec<Dirent>> {
        let url = format!("{}/api/v2.1/repos/{}/dir/", self.api_base_url, repo_id);

        let response = self.client.get(&url).send().await.context(
            "Failed to list library root. Check that the server is reachable and the repository ID is correct",
        )?;
        let response = ensure_success(response, "Listing library root").await?;

        let listing: DirentList = response
            .json()
            .await
            .map_err(|e| MirrorError::Api(format!("Unexpected directory listing payload: {}", e)))?;

        Ok(listing.dirent_list)
    }

    pub async fn create_zip_task(&self, repo_id: &str, dirent: &str) -> Result<String> {
        let url = format!("{}/api/v2.1/repos/{}/zip-task/", self.api_base_url, repo_id);

        let response = self
            .client
            .get(&url)
            .query(&[("parent_dir", "/"), ("dirents", dirent)])
            .send()
            .await
            .with_context(|| format!("Failed to request ZIP creation for '{}'", dirent))?;
        let response = ensure_success(response, "ZIP task creation").await?;

        let task: ZipTask = response.json().await.map_err(|e| {
            MirrorError::Api(format!("Unexpected zip-task payload for '{}': {}", dirent, e))
        })?;

        Ok(task.zip_token)
    }

    /// Queries packaging progress. The HTTP status is not checked:
    /// the server reports oversized tasks through an error body, which the
    /// poller classifies as malformed.
    pub async fn query_zip_progress(&self, zip_token: &str) -> Result<ProgressReply> {
        let url = format!("{}/api/v2.1/query-zip-progress/", self.api_base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("token", zip_token)])
            .send()
            .await
            .context("Failed to query ZIP progress. The server may be unavailable")?;

        let body = response
            .text()
            .await
            .context("Failed to read ZIP progress response")?;

        Ok(ProgressReply::from_body(body))
    }

    /// Opens the finished archive for streaming.
    pub async fn open_zip(&self, zip_token: &str) -> Result<Response> {
        let url = format!("{}/seafhttp/zip/{}", self.api_base_url, zip_token);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to start ZIP download")?;

        ensure_success(response, "ZIP download").await
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(MirrorError::Api(format!("{} failed with status {}: {}", what, status, body)).into())
}
