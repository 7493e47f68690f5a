//! # Solidity Compiler Manager
//!
//! `solc` is published through its own binaries channel rather than as a plain archive.
//! Each platform directory carries a `list.json` index:
//!
//! ```json
//! {
//!   "builds": [{ "path": "solc-linux-amd64-v0.8.21+commit.d9974bed", "version": "0.8.21", "sha256": "0x..." }],
//!   "releases": { "0.8.21": "solc-linux-amd64-v0.8.21+commit.d9974bed" },
//!   "latestRelease": "0.8.21"
//! }
//! ```
//!
//! The manager resolves the configured `Version` (or `latestRelease` when none is set)
//! to a build, downloads it, checks the published digest and installs it as `solc`.

use crate::error::{Result, ToolError};
use crate::libs::tool_manager::ToolManager;
use crate::libs::utilities::assets::{download_file, fetch_text, verify_sha256};
use crate::libs::utilities::binary::{find_named_executable, make_executable, move_file};
use crate::libs::utilities::compression::{detect_file_type, extract_archive};
use crate::libs::utilities::platform::Platform;
use crate::schemas::tool_settings::ToolSourceSettings;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use serde::Deserialize;
use std::collections::HashMap;

/// The `list.json` index of one platform directory.
#[derive(Debug, Deserialize)]
pub struct SolcBuildList {
    #[serde(default)]
    pub builds: Vec<SolcBuild>,
    #[serde(default)]
    pub releases: HashMap<String, String>,
    #[serde(rename = "latestRelease")]
    pub latest_release: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolcBuild {
    pub path: String,
    pub version: String,
    pub sha256: Option<String>,
}

/// Directory of the binaries channel holding builds for `platform`.
pub fn platform_dir(platform: Platform) -> &'static str {
    match platform {
        Platform::Linux => "linux-amd64",
        Platform::MacOs => "macosx-amd64",
        Platform::Windows => "windows-amd64",
    }
}

impl SolcBuildList {
    /// Picks the build for `version`, or the latest release when `version` is empty.
    pub fn resolve(&self, version: &str) -> Option<&SolcBuild> {
        let wanted = if version.is_empty() {
            self.latest_release.as_deref()?
        } else {
            version
        };
        let path = self.releases.get(wanted)?;
        self.builds.iter().find(|b| &b.path == path)
    }
}

pub struct SolcManager {
    settings: ToolSourceSettings,
}

impl SolcManager {
    pub fn new(settings: ToolSourceSettings) -> Self {
        SolcManager { settings }
    }

    fn channel_url(&self) -> String {
        format!(
            "{}/{}",
            self.settings.source_url.trim_end_matches('/'),
            platform_dir(self.platform())
        )
    }

    fn fetch_build_list(&self) -> Result<SolcBuildList> {
        let url = format!("{}/list.json", self.channel_url());
        log_debug!("[Grover::Tools::Solc] Fetching build index {}", url.blue());
        let body = fetch_text(&url)?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl ToolManager for SolcManager {
    fn settings(&self) -> &ToolSourceSettings {
        &self.settings
    }

    fn ensure_existed(&self) -> Result<()> {
        if self.exists() {
            log_debug!(
                "[Grover::Tools::Solc] solc already installed at {}",
                self.command().display()
            );
            return Ok(());
        }

        let list = self.fetch_build_list()?;
        let build = list.resolve(&self.settings.version).ok_or_else(|| ToolError::InstallFailed {
            tool: self.settings.name.clone(),
            reason: format!(
                "no release {} in {}",
                if self.settings.version.is_empty() { "latest" } else { self.settings.version.as_str() },
                self.channel_url()
            ),
        })?;
        log_info!(
            "[Grover::Tools::Solc] Installing solc {} ({})",
            build.version.bold(),
            build.path
        );

        self.ensure_command_path_existed()?;
        let command_path = &self.settings.command_path;
        let staging = tempfile::Builder::new()
            .prefix(".grover-stage-")
            .tempdir_in(command_path)
            .map_err(|e| ToolError::io(format!("Creating staging directory in {}", command_path.display()), e))?;

        let url = format!("{}/{}", self.channel_url(), build.path);
        let downloaded = staging.path().join(&build.path);
        download_file(&url, &downloaded)?;
        // A digest pinned in the settings wins over the published one.
        match self.settings.sha256.as_deref().or(build.sha256.as_deref()) {
            Some(expected) => verify_sha256(&downloaded, expected, &url)?,
            None => log_warn!("[Grover::Tools::Solc] No digest published for {}", build.path),
        }

        // Older Windows builds ship as zip archives.
        let staged_exe = if detect_file_type(&downloaded) == "zip" {
            let extracted = extract_archive(&downloaded, &staging.path().join("unpack"), Some("zip"))
                .map_err(|e| ToolError::io(format!("Extracting {}", downloaded.display()), e))?;
            find_named_executable(&extracted, &self.exe_name()).ok_or_else(|| ToolError::ExecutableNotFound {
                exe: self.exe_name(),
                dir: extracted.clone(),
            })?
        } else {
            downloaded
        };

        make_executable(&staged_exe)
            .map_err(|e| ToolError::io(format!("Marking {} executable", staged_exe.display()), e))?;
        let command = self.command();
        move_file(&staged_exe, &command).map_err(|e| ToolError::io(format!("Placing {}", command.display()), e))?;

        log_info!(
            "[Grover::Tools::Solc] Installed solc {} at {}",
            build.version.green(),
            command.display().to_string().cyan()
        );
        Ok(())
    }
}
