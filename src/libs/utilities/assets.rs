// Fetching tool sources: plain HTTP GETs through `ureq`, or local copies for
// `file://` mirrors, plus digest verification of what was fetched.

use crate::error::{Result, ToolError};
use crate::{log_debug, log_error};
use colored::Colorize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Downloads a file from a given URL and saves it to a specified destination on the local file system.
///
/// `http://` and `https://` URLs are fetched with a blocking GET. `file://` URLs and
/// bare filesystem paths are copied, which is how offline mirrors configured in the
/// overrides file are served.
///
/// # Arguments
/// * `url`: Where to fetch the file from.
/// * `dest`: Full path (including file name) of the downloaded file.
pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    log_debug!("[Grover::Download] Starting download from URL: {}", url.blue());

    if url.starts_with("http://") || url.starts_with("https://") {
        let response = match ureq::get(url).call() {
            Ok(res) => res,
            Err(e) => {
                log_error!("[Grover::Download] HTTP request failed for {}: {}", url.red(), e);
                return Err(ToolError::Download {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let mut file = File::create(dest)
            .map_err(|e| ToolError::io(format!("Creating {}", dest.display()), e))?;
        let mut reader = response.into_reader();
        io::copy(&mut reader, &mut file).map_err(|e| ToolError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    } else {
        let source = local_source_path(url);
        fs::copy(&source, dest).map_err(|e| ToolError::Download {
            url: url.to_string(),
            reason: format!("copying {}: {}", source.display(), e),
        })?;
    }

    log_debug!(
        "[Grover::Download] File downloaded successfully to {}",
        dest.to_string_lossy().green()
    );
    Ok(())
}

/// Fetches a small text document (such as a release list) into memory.
pub fn fetch_text(url: &str) -> Result<String> {
    log_debug!("[Grover::Download] Fetching {}", url.blue());
    if url.starts_with("http://") || url.starts_with("https://") {
        let response = ureq::get(url).call().map_err(|e| ToolError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        response.into_string().map_err(|e| ToolError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })
    } else {
        let source = local_source_path(url);
        fs::read_to_string(&source).map_err(|e| ToolError::Download {
            url: url.to_string(),
            reason: format!("reading {}: {}", source.display(), e),
        })
    }
}

fn local_source_path(url: &str) -> PathBuf {
    PathBuf::from(url.strip_prefix("file://").unwrap_or(url))
}

/// Computes the lowercase hex SHA-256 digest of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).map_err(|e| ToolError::io(format!("Opening {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| ToolError::io(format!("Hashing {}", path.display()), e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compares a file's digest with an expected hex SHA-256.
/// The expected value may carry a `0x` prefix and any letter case.
pub fn verify_sha256(path: &Path, expected: &str, url: &str) -> Result<()> {
    let expected = expected.trim().to_lowercase();
    let expected = expected
        .strip_prefix("0x")
        .map(str::to_string)
        .unwrap_or(expected);
    let actual = sha256_file(path)?;
    if actual != expected {
        log_error!(
            "[Grover::Download] Checksum mismatch for {}: expected {}, got {}",
            url.red(),
            expected,
            actual
        );
        return Err(ToolError::ChecksumMismatch {
            url: url.to_string(),
            expected,
            actual,
        });
    }
    log_debug!("[Grover::Download] Checksum verified for {}", url.green());
    Ok(())
}
