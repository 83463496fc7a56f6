//! Discord REST client.
//!
//! Async HTTP client using `reqwest`. Credentials are passed per call so
//! one client can serve several servers and identities.

use std::path::{Path, PathBuf};

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::types::{AttachmentSlot, CreateMessage, Credentials, MessagePayload, MessageResponse};

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// Errors from the Discord client.
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

    #[error("attachment not found: {}", .0.display())]
    MissingFile(PathBuf),
}

/// Discord API client.
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

    /// Posts `payload` to a channel.
    ///
    /// Attachments are checked and read before any request is made; a
    /// missing file fails without touching the network.
    pub async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
        credentials: &Credentials,
    ) -> Result<MessageResponse, Error> {
        let auth = authorization(credentials)?;
        let files = read_attachments(&payload.attachments).await?;

        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        let request = self.http.post(&url).header(AUTHORIZATION, auth);

        let request = if files.is_empty() {
            request.json(&CreateMessage {
                content: &payload.content,
                attachments: Vec::new(),
            })
        } else {
            let body = CreateMessage {
                content: &payload.content,
                attachments: files
                    .iter()
                    .enumerate()
                    .map(|(id, (filename, _))| AttachmentSlot { id, filename })
                    .collect(),
            };
            let mut form = Form::new().text("payload_json", serde_json::to_string(&body)?);
            for (i, (filename, data)) in files.iter().enumerate() {
                let part = Part::bytes(data.clone()).file_name(filename.clone());
                form = form.part(format!("files[{i}]"), part);
            }
            request.multipart(form)
        };

        debug!(channel = channel_id, attachments = files.len(), "sending discord message");
        let resp = request.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn authorization(credentials: &Credentials) -> Result<HeaderValue, Error> {
    if credentials.token.trim().is_empty() {
        return Err(Error::InvalidToken);
    }
    HeaderValue::from_str(&credentials.header_value()).map_err(|_| Error::InvalidToken)
}

/// Reads every attachment, failing on the first missing one.
async fn read_attachments(paths: &[PathBuf]) -> Result<Vec<(String, Vec<u8>)>, Error> {
    if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
        return Err(Error::MissingFile(missing.clone()));
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let data = tokio::fs::read(path).await?;
        files.push((file_name(path), data));
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}
