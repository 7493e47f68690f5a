// Archive extraction for downloaded tool releases.

use crate::{log_debug, log_error};
use bzip2::read::BzDecoder;
use colored::Colorize;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tar::Archive;
use xz2::read::XzDecoder;
use zip::ZipArchive;

/// Guesses the archive type from a file name, compound extensions first.
/// Anything unrecognized is treated as a plain binary.
pub fn detect_file_type(path: &Path) -> &'static str {
    let lower = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
        "tar.gz"
    } else if lower.ends_with(".tar.xz") || lower.ends_with(".txz") {
        "tar.xz"
    } else if lower.ends_with(".tar.bz2") || lower.ends_with(".tbz2") || lower.ends_with(".tbz") {
        "tar.bz2"
    } else if lower.ends_with(".zip") || lower.ends_with(".nupkg") {
        "zip"
    } else if lower.ends_with(".tar") {
        "tar"
    } else {
        "binary"
    }
}

/// Extracts the contents of an archive into `dest/extracted` and returns that directory.
///
/// # Arguments
/// * `src`: The archive to extract.
/// * `dest`: Parent directory of the `extracted` directory.
/// * `known_file_type`: Overrides the name-based detection when the caller already knows the type.
pub fn extract_archive(src: &Path, dest: &Path, known_file_type: Option<&str>) -> io::Result<PathBuf> {
    log_debug!(
        "[Grover::Extract] Extracting archive {:?} into {:?}",
        src.to_string_lossy().blue(),
        dest.to_string_lossy().cyan()
    );

    let file_type = known_file_type.unwrap_or_else(|| detect_file_type(src));

    let extracted_path = dest.join("extracted");
    fs::create_dir_all(&extracted_path)?;

    match file_type {
        "zip" => {
            let file = File::open(src)?;
            let mut archive = ZipArchive::new(file)?;
            archive.extract(&extracted_path)?;
        }
        "tar.gz" => {
            let decompressor = GzDecoder::new(File::open(src)?);
            Archive::new(decompressor).unpack(&extracted_path)?;
        }
        "tar.bz2" => {
            let decompressor = BzDecoder::new(File::open(src)?);
            Archive::new(decompressor).unpack(&extracted_path)?;
        }
        "tar.xz" => {
            let decompressor = XzDecoder::new(File::open(src)?);
            Archive::new(decompressor).unpack(&extracted_path)?;
        }
        "tar" => {
            Archive::new(File::open(src)?).unpack(&extracted_path)?;
        }
        "binary" => {
            // Nothing to unpack; the download is the executable itself.
            let file_name = src.file_name().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "Source path has no filename")
            })?;
            fs::copy(src, extracted_path.join(file_name))?;
        }
        other => {
            log_error!(
                "[Grover::Extract] Unsupported archive type '{}' for extraction: {:?}",
                other.red(),
                src
            );
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported archive type: {}", other),
            ));
        }
    }

    log_debug!(
        "[Grover::Extract] {} archive contents available at: {:?}",
        file_type,
        extracted_path.to_string_lossy().green()
    );
    Ok(extracted_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn detects_compound_extensions_first() {
        assert_eq!(detect_file_type(Path::new("z3-4.12.2.tar.gz")), "tar.gz");
        assert_eq!(detect_file_type(Path::new("z3.TAR.XZ")), "tar.xz");
        assert_eq!(detect_file_type(Path::new("z3-4.12.2-x64-win.zip")), "zip");
        assert_eq!(detect_file_type(Path::new("solc-static-linux")), "binary");
    }

    #[test]
    fn extracts_zip_with_nested_directories() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("tool.zip");
        {
            let mut writer = zip::ZipWriter::new(File::create(&archive_path).unwrap());
            let options = zip::write::FileOptions::default();
            writer.start_file("tool-1.0/bin/tool", options).unwrap();
            writer.write_all(b"#!/bin/sh\n").unwrap();
            writer.finish().unwrap();
        }

        let extracted = extract_archive(&archive_path, dir.path(), None).unwrap();

        assert!(extracted.join("tool-1.0/bin/tool").is_file());
    }

    #[test]
    fn plain_binary_is_copied() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("solc");
        fs::write(&binary, b"\x7fELF").unwrap();

        let extracted = extract_archive(&binary, &dir.path().join("stage"), None).unwrap();

        assert!(extracted.join("solc").is_file());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.7z");
        fs::write(&file, b"").unwrap();
        let err = extract_archive(&file, dir.path(), Some("7zip")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
