//! Zip capability.
//!
//! Archiving is a capability handed to actions through [`Services`]
//! so tests can swap it out. [`ZipArchiver`] is the real one: it walks
//! the source directory and writes a deflated archive on a blocking
//! thread.
//!
//! [`Services`]: crate::context::Services

use std::fs::File;
use std::future::Future;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::pin::Pin;

use launchpad_task::ActionError;
use sha2::{Digest, Sha256};
use tracing::debug;
use zip::CompressionMethod;
use zip::write::FileOptions;

/// Future returned by [`Zipper::zip`].
pub type ZipFuture<'a> = Pin<Box<dyn Future<Output = Result<ArchiveInfo, ActionError>> + Send + 'a>>;

/// A written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    pub files: usize,
    /// Size of the archive on disk.
    pub bytes: u64,
    /// Hex SHA-256 of the archive.
    pub sha256: String,
}

/// Turns a directory into an archive.
pub trait Zipper: Send + Sync {
    fn zip<'a>(&'a self, source: &'a Path, destination: &'a Path) -> ZipFuture<'a>;
}

/// Deflate zip writer backed by the `zip` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver;

impl Zipper for ZipArchiver {
    fn zip<'a>(&'a self, source: &'a Path, destination: &'a Path) -> ZipFuture<'a> {
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || write_archive(&source, &destination))
                .await
                .map_err(|e| ActionError::Backend(format!("zip task failed: {e}")))?
        })
    }
}

fn write_archive(source: &Path, destination: &Path) -> Result<ArchiveInfo, ActionError> {
    if !source.is_dir() {
        return Err(ActionError::Config(format!(
            "{} is not a directory",
            source.display()
        )));
    }

    let mut entries = Vec::new();
    walk_dir(source, source, destination, &mut entries)?;
    entries.sort();

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = zip::ZipWriter::new(File::create(destination)?);
    for (name, path) in &entries {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(permissions(path)?);
        writer.start_file(name.as_str(), options).map_err(zip_error)?;
        io::copy(&mut File::open(path)?, &mut writer)?;
    }
    writer.finish().map_err(zip_error)?;

    let bytes = std::fs::metadata(destination)?.len();
    let sha256 = file_sha256(destination)?;
    debug!(
        archive = %destination.display(),
        files = entries.len(),
        bytes,
        "archive written"
    );

    Ok(ArchiveInfo {
        path: destination.to_path_buf(),
        files: entries.len(),
        bytes,
        sha256,
    })
}

/// Collects `(archive name, path)` pairs, skipping the archive itself.
fn walk_dir(
    root: &Path,
    current: &Path,
    skip: &Path,
    entries: &mut Vec<(String, PathBuf)>,
) -> Result<(), ActionError> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            walk_dir(root, &path, skip, entries)?;
        } else if metadata.is_file() && path != skip {
            let rel_path = path.strip_prefix(root).map_err(io::Error::other)?;
            // Zip entries always use forward slashes.
            let name = rel_path.to_string_lossy().replace('\\', "/");
            entries.push((name, path));
        }
    }
    Ok(())
}

#[cfg(unix)]
fn permissions(path: &Path) -> io::Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::metadata(path)?.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions(_path: &Path) -> io::Result<u32> {
    Ok(0o644)
}

fn zip_error(e: zip::result::ZipError) -> ActionError {
    ActionError::Backend(format!("zip: {e}"))
}

/// Computes the hex SHA-256 of a file.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
