//! GitHub REST client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.
//! Publishing is two-step: create the release, then upload each asset to
//! the URL the create response hands back.

use std::path::{Path, PathBuf};

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use tracing::{debug, info};

use crate::types::{Asset, Credentials, PublishedRelease, Release, ReleaseRequest};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

/// Errors from the GitHub client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid token")]
    InvalidToken,

    #[error("asset not found: {}", .0.display())]
    MissingFile(PathBuf),
}

/// GitHub API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client.
    pub fn new() -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("launchpad/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Overrides the API base URL (proxies, tests).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Creates a release on `owner/repo`.
    pub async fn create_release(
        &self,
        owner: &str,
        repo: &str,
        request: &ReleaseRequest,
        credentials: &Credentials,
    ) -> Result<Release, Error> {
        let url = format!("{}/repos/{owner}/{repo}/releases", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header(AUTHORIZATION, authorization(credentials)?)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(request)
            .send()
            .await?;

        let bytes = check(resp).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Uploads one file to a release's upload URL template.
    pub async fn upload_asset(
        &self,
        upload_url: &str,
        path: &Path,
        credentials: &Credentials,
    ) -> Result<Asset, Error> {
        let name = file_name(path);
        let data = tokio::fs::read(path).await?;
        let url = asset_upload_url(upload_url);

        debug!(asset = %name, bytes = data.len(), "uploading release asset");
        let resp = self
            .http
            .post(&url)
            .query(&[("name", name.as_str())])
            .header(AUTHORIZATION, authorization(credentials)?)
            .header(ACCEPT, "application/vnd.github+json")
            .header(CONTENT_TYPE, content_type(path))
            .body(data)
            .send()
            .await?;

        let bytes = check(resp).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Creates a release and attaches `assets` in order.
    ///
    /// Every asset is checked before the release is created. The first
    /// failing step aborts the rest; nothing is rolled back.
    pub async fn publish_release(
        &self,
        owner: &str,
        repo: &str,
        request: &ReleaseRequest,
        assets: &[PathBuf],
        credentials: &Credentials,
    ) -> Result<PublishedRelease, Error> {
        authorization(credentials)?;
        if let Some(missing) = assets.iter().find(|p| !p.is_file()) {
            return Err(Error::MissingFile(missing.clone()));
        }

        let release = self.create_release(owner, repo, request, credentials).await?;
        info!(release = release.id, tag = %request.tag_name, "github release created");

        let mut uploaded = Vec::with_capacity(assets.len());
        for path in assets {
            let asset = self
                .upload_asset(&release.upload_url, path, credentials)
                .await?;
            uploaded.push(asset);
        }

        Ok(PublishedRelease {
            release,
            assets: uploaded,
        })
    }
}

fn authorization(credentials: &Credentials) -> Result<HeaderValue, Error> {
    if credentials.token.trim().is_empty() {
        return Err(Error::InvalidToken);
    }
    HeaderValue::from_str(&format!("Bearer {}", credentials.token)).map_err(|_| Error::InvalidToken)
}

/// Returns the body of a 2xx response, or an `Api` error.
async fn check(resp: reqwest::Response) -> Result<Vec<u8>, Error> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Strips the `{?name,label}` template suffix from an upload URL.
fn asset_upload_url(template: &str) -> String {
    match template.find('{') {
        Some(i) => template[..i].to_string(),
        None => template.to_string(),
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string())
}
