//! # Tool Manager Contract
//!
//! Every external tool Grover manages is described by a [`ToolSourceSettings`] and
//! driven through the [`ToolManager`] trait. The provided methods derive the
//! executable name and path from the settings; implementors only decide how a
//! missing tool gets installed ([`ToolManager::ensure_existed`]).
//!
//! Tools that find their SMT solver by looking next to their own executable also
//! implement [`SolverDependentTool`], which adds the linking step.

use crate::error::{Result, ToolError};
use crate::libs::process::run_cmd;
use crate::libs::utilities::platform::Platform;
use crate::schemas::tool_settings::ToolSourceSettings;
use crate::{log_debug, log_warn};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

pub trait ToolManager {
    /// The bound settings this manager was built from.
    fn settings(&self) -> &ToolSourceSettings;

    /// The host platform; decides the executable suffix.
    fn platform(&self) -> Platform {
        Platform::current()
    }

    /// Platform-dependent executable file name (`z3` or `z3.exe`).
    fn exe_name(&self) -> String {
        self.platform().exe_name(&self.settings().name)
    }

    /// Absolute path of the executable: `CommandPath` joined with [`Self::exe_name`].
    fn command(&self) -> PathBuf {
        let command = self.settings().command_path.join(self.exe_name());
        std::path::absolute(&command).unwrap_or(command)
    }

    /// Whether a regular file exists at [`Self::command`].
    fn exists(&self) -> bool {
        self.command().is_file()
    }

    /// Creates the install directory and any missing parents. Idempotent.
    fn ensure_command_path_existed(&self) -> Result<()> {
        let dir = &self.settings().command_path;
        if !dir.is_dir() {
            log_debug!(
                "[Grover::ToolManager] Creating install directory {}",
                dir.display().to_string().cyan()
            );
            fs::create_dir_all(dir)
                .map_err(|e| ToolError::io(format!("Creating {}", dir.display()), e))?;
        }
        Ok(())
    }

    /// Makes the tool available at [`Self::command`]. A no-op beyond the existence
    /// check when the tool is already there.
    fn ensure_existed(&self) -> Result<()>;

    /// Runs the tool with its version argument and returns one display line.
    fn version_info(&self) -> String {
        let settings = self.settings();
        let args = if settings.version_arg.is_empty() {
            Vec::new()
        } else {
            vec![settings.version_arg.clone()]
        };

        match run_cmd(&self.command(), &args, None) {
            Some(output) => {
                let first_line = output.lines().next().unwrap_or("").trim().to_string();
                warn_on_version_mismatch(settings, &first_line);
                format!("{}: {}", settings.name, first_line)
            }
            None => format!("{}: version unavailable", settings.name),
        }
    }
}

/// A tool that locates its SMT solver by sibling-directory convention.
pub trait SolverDependentTool: ToolManager {
    /// Places the solver executable (and its native libraries) into this tool's
    /// install directory. The solver must already be installed.
    fn ensure_linked_to_solver(&self, solver: &dyn ToolManager) -> Result<()>;

    /// This tool viewed through the base contract.
    fn as_tool(&self) -> &dyn ToolManager;
}

/// Pulls the first semantic version out of a tool's version banner.
/// Banners like `Z3 version 4.12.2 - 64 bit` or `Version: 0.8.21+commit.d9974bed` are handled.
pub fn extract_version(banner: &str) -> Option<semver::Version> {
    banner
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .map(|token| token.trim_start_matches(['v', 'V']))
        // Build metadata such as `+commit.d9974bed.Linux.g++` is not valid semver.
        .map(|token| token.split('+').next().unwrap_or(token))
        .find_map(|token| {
            if let Ok(version) = semver::Version::parse(token) {
                return Some(version);
            }
            // Two-component versions such as `1.1`.
            let padded = format!("{token}.0");
            semver::Version::parse(&padded).ok()
        })
}

fn warn_on_version_mismatch(settings: &ToolSourceSettings, banner: &str) {
    if settings.version.is_empty() {
        return;
    }
    let (Ok(expected), Some(reported)) = (semver::Version::parse(&settings.version), extract_version(banner))
    else {
        return;
    };
    if expected.major != reported.major
        || expected.minor != reported.minor
        || expected.patch != reported.patch
    {
        log_warn!(
            "[Grover::ToolManager] {} reports version {}, configured version is {}",
            settings.name.yellow(),
            reported,
            expected
        );
    }
}
