//! GitHub release sender.
//!
//! Creates a release on a repository and attaches asset files to it
//! through the GitHub REST API.

pub mod client;
pub mod types;

pub use client::{Client, Error};
pub use types::{Asset, Credentials, PublishedRelease, Release, ReleaseRequest};
