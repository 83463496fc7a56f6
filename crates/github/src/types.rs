//! GitHub API types.

use serde::{Deserialize, Serialize};

/// Personal access or app token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
}

/// JSON body of a create-release request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRequest {
    pub tag_name: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
}

/// A created release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub html_url: String,
    /// Hypermedia template, e.g. `.../assets{?name,label}`.
    pub upload_url: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// An uploaded release asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub browser_download_url: String,
}

/// Result of creating a release and attaching its assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRelease {
    pub release: Release,
    pub assets: Vec<Asset>,
}
