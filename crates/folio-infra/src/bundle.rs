//! Static bundle fingerprinting.
//!
//! The deployment step carries a digest of the built frontend bundle as a
//! property, so an unchanged bundle plans as a no-op and any changed byte or
//! renamed file plans as an update.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundle directory not found: {0}")]
    Missing(PathBuf),

    #[error("bundle directory {0} contains no files")]
    Empty(PathBuf),

    #[error("failed to walk bundle: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Content digest of a bundle directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFingerprint {
    /// Lowercase hex SHA-256 over every file's relative path and contents.
    pub digest: String,
    pub files: usize,
    pub bytes: u64,
}

/// Fingerprint every regular file under `dir`.
///
/// Files are visited in file-name order and hashed as
/// `relative/path \0 length contents`, so the digest is independent of
/// directory iteration order and of the bundle's absolute location.
pub fn fingerprint(dir: &Path) -> Result<BundleFingerprint, BundleError> {
    if !dir.is_dir() {
        return Err(BundleError::Missing(dir.to_path_buf()));
    }

    let mut hasher = Sha256::new();
    let mut files = 0usize;
    let mut bytes = 0u64;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let contents = std::fs::read(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update((contents.len() as u64).to_le_bytes());
        hasher.update(&contents);

        files += 1;
        bytes += contents.len() as u64;
    }

    if files == 0 {
        return Err(BundleError::Empty(dir.to_path_buf()));
    }

    let digest = hex_encode(&hasher.finalize());
    tracing::debug!(dir = %dir.display(), files, bytes, digest = %digest, "fingerprinted bundle");
    Ok(BundleFingerprint {
        digest,
        files,
        bytes,
    })
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
