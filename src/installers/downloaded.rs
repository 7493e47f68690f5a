//! # Downloaded Tool Manager
//!
//! Installs tools that ship as a release archive (Z3): download the archive named by
//! `SourceUrl`, extract it, and place the executable at `CommandPath`.
//!
//! ## Installation Workflow
//!
//! 1. **Existence Check** - nothing to do when the executable is already in place
//! 2. **Staging** - a temporary directory is created inside `CommandPath`
//! 3. **Download** - the archive is fetched into the staging directory (and checked against `Sha256` if set)
//! 4. **Extraction** - zip / tar.* archives are unpacked; plain binaries are used as-is
//! 5. **Placement** - files next to the executable (native libraries) are moved in first,
//!    the executable itself is renamed into place last
//! 6. **Cleanup** - the staging directory is removed when it goes out of scope
//!
//! Because the executable is the last file to arrive, an interrupted install never
//! leaves something at `Command` that would make [`ToolManager::exists`] lie.

use crate::error::{Result, ToolError};
use crate::libs::tool_manager::ToolManager;
use crate::libs::utilities::assets::{download_file, verify_sha256};
use crate::libs::utilities::binary::{find_named_executable, make_executable, move_file};
use crate::libs::utilities::compression::{detect_file_type, extract_archive};
use crate::schemas::tool_settings::ToolSourceSettings;
use crate::{log_debug, log_info};
use colored::Colorize;
use std::fs;
use std::path::Path;

pub struct DownloadedToolManager {
    settings: ToolSourceSettings,
}

impl DownloadedToolManager {
    pub fn new(settings: ToolSourceSettings) -> Self {
        DownloadedToolManager { settings }
    }

    /// File name the archive is saved under, taken from the last URL segment.
    fn archive_file_name(&self) -> String {
        let without_query = self.settings.source_url.split(['?', '#']).next().unwrap_or("");
        match without_query.rsplit('/').next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{}.download", self.settings.name),
        }
    }

    fn install_from_archive(&self, staging: &Path) -> Result<()> {
        let url = &self.settings.source_url;
        let archive_path = staging.join(self.archive_file_name());

        download_file(url, &archive_path)?;
        if let Some(expected) = &self.settings.sha256 {
            verify_sha256(&archive_path, expected, url)?;
        }

        let file_type = detect_file_type(&archive_path);
        log_debug!(
            "[Grover::Tools::Downloaded] Detected file type: {}",
            file_type.magenta()
        );
        let extracted = extract_archive(&archive_path, &staging.join("unpack"), Some(file_type))
            .map_err(|e| ToolError::io(format!("Extracting {}", archive_path.display()), e))?;

        let exe_name = self.exe_name();
        let staged_exe = match find_named_executable(&extracted, &exe_name) {
            Some(path) => path,
            None if file_type == "binary" => extracted.join(self.archive_file_name()),
            None => {
                return Err(ToolError::ExecutableNotFound {
                    exe: exe_name,
                    dir: extracted,
                });
            }
        };

        self.place_staged_files(&staged_exe)
    }

    /// Moves the executable's siblings, then the executable, into `CommandPath`.
    fn place_staged_files(&self, staged_exe: &Path) -> Result<()> {
        let command_path = &self.settings.command_path;

        if let Some(bin_dir) = staged_exe.parent() {
            let entries = fs::read_dir(bin_dir)
                .map_err(|e| ToolError::io(format!("Reading {}", bin_dir.display()), e))?;
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if path == staged_exe || !path.is_file() {
                    continue;
                }
                let dest = command_path.join(entry.file_name());
                move_file(&path, &dest)
                    .map_err(|e| ToolError::io(format!("Placing {}", dest.display()), e))?;
            }
        }

        make_executable(staged_exe)
            .map_err(|e| ToolError::io(format!("Marking {} executable", staged_exe.display()), e))?;
        let command = self.command();
        move_file(staged_exe, &command)
            .map_err(|e| ToolError::io(format!("Placing {}", command.display()), e))?;
        Ok(())
    }
}

impl ToolManager for DownloadedToolManager {
    fn settings(&self) -> &ToolSourceSettings {
        &self.settings
    }

    fn ensure_existed(&self) -> Result<()> {
        if self.exists() {
            log_debug!(
                "[Grover::Tools::Downloaded] {} already installed at {}",
                self.settings.name.bold(),
                self.command().display()
            );
            return Ok(());
        }

        if self.settings.source_url.trim().is_empty() {
            return Err(ToolError::InvalidSettings(format!(
                "{} has no SourceUrl to download from",
                self.settings.name
            )));
        }

        log_info!(
            "[Grover::Tools::Downloaded] Installing {} {} from {}",
            self.settings.name.bold(),
            self.settings.version,
            self.settings.source_url.blue()
        );

        self.ensure_command_path_existed()?;
        let command_path = &self.settings.command_path;
        let staging = tempfile::Builder::new()
            .prefix(".grover-stage-")
            .tempdir_in(command_path)
            .map_err(|e| ToolError::io(format!("Creating staging directory in {}", command_path.display()), e))?;

        self.install_from_archive(staging.path())?;

        if !self.exists() {
            return Err(ToolError::ExecutableNotFound {
                exe: self.exe_name(),
                dir: self.settings.command_path.clone(),
            });
        }

        log_info!(
            "[Grover::Tools::Downloaded] Installed {} at {}",
            self.settings.name.bold().green(),
            self.command().display().to_string().cyan()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_release_zip(path: &Path, exe_name: &str) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options = zip::write::FileOptions::default();
        writer.start_file(format!("z3-4.12.2-x64/bin/{exe_name}"), options).unwrap();
        writer.write_all(b"#!/bin/sh\necho 'Z3 version 4.12.2 - 64 bit'\n").unwrap();
        writer.start_file("z3-4.12.2-x64/bin/libz3.so", options).unwrap();
        writer.write_all(b"native").unwrap();
        writer.start_file("z3-4.12.2-x64/LICENSE.txt", options).unwrap();
        writer.write_all(b"MIT").unwrap();
        writer.finish().unwrap();
    }

    fn z3_settings(command_path: &Path, source_url: String) -> ToolSourceSettings {
        ToolSourceSettings {
            name: "z3".to_string(),
            command_path: command_path.to_path_buf(),
            source_url,
            version: "4.12.2".to_string(),
            package: None,
            sha256: None,
            version_arg: "--version".to_string(),
        }
    }

    #[test]
    fn installs_into_empty_directory() {
        let dir = TempDir::new().unwrap();
        let manager_probe = DownloadedToolManager::new(z3_settings(dir.path(), String::new()));
        let archive = dir.path().join("z3.zip");
        write_release_zip(&archive, &manager_probe.exe_name());

        let tools = dir.path().join("tools/z3");
        let manager = DownloadedToolManager::new(z3_settings(&tools, format!("file://{}", archive.display())));
        assert!(!manager.exists());

        manager.ensure_existed().unwrap();

        assert!(manager.exists());
        assert_eq!(manager.command(), tools.join(manager.exe_name()));
        assert!(tools.join("libz3.so").is_file());
        // Staging directories are cleaned up.
        let leftovers: Vec<_> = fs::read_dir(&tools)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".grover-stage-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn existing_tool_is_not_downloaded_again() {
        let dir = TempDir::new().unwrap();
        let manager = DownloadedToolManager::new(z3_settings(
            dir.path(),
            format!("file://{}", dir.path().join("missing.zip").display()),
        ));
        fs::write(manager.command(), b"installed").unwrap();

        // The source does not exist, so any download attempt would fail.
        manager.ensure_existed().unwrap();
        manager.ensure_existed().unwrap();

        assert_eq!(fs::read(manager.command()).unwrap(), b"installed");
    }

    #[test]
    fn archive_without_executable_fails_and_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("empty.zip");
        write_release_zip(&archive, "not-z3");

        let tools = dir.path().join("tools/z3");
        let manager = DownloadedToolManager::new(z3_settings(&tools, format!("file://{}", archive.display())));

        let err = manager.ensure_existed().unwrap_err();

        assert!(matches!(err, ToolError::ExecutableNotFound { .. }));
        assert!(!manager.exists());
    }

    #[test]
    fn checksum_mismatch_aborts_install() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("z3.zip");
        write_release_zip(&archive, "z3");

        let tools = dir.path().join("tools/z3");
        let mut settings = z3_settings(&tools, format!("file://{}", archive.display()));
        settings.sha256 = Some("deadbeef".to_string());
        let manager = DownloadedToolManager::new(settings);

        assert!(matches!(
            manager.ensure_existed().unwrap_err(),
            ToolError::ChecksumMismatch { .. }
        ));
        assert!(!manager.exists());
    }

    #[test]
    fn empty_source_url_is_invalid() {
        let dir = TempDir::new().unwrap();
        let manager = DownloadedToolManager::new(z3_settings(dir.path(), String::new()));
        assert!(matches!(
            manager.ensure_existed().unwrap_err(),
            ToolError::InvalidSettings(_)
        ));
    }

    #[test]
    fn archive_name_ignores_query_string() {
        let manager = DownloadedToolManager::new(z3_settings(
            Path::new("/tools/z3"),
            "https://example/z3-4.12.2-x64-win.zip?raw=true".to_string(),
        ));
        assert_eq!(manager.archive_file_name(), "z3-4.12.2-x64-win.zip");
    }
}
