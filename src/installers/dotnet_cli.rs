//! # .NET CLI Tool Manager
//!
//! Installs verifiers distributed as .NET global tools (Boogie, Corral) with
//! `dotnet tool install <Package> --tool-path <CommandPath> [--version <Version>]`.
//!
//! Both tools look for `z3` next to their own executable rather than on a configurable
//! path, so this manager also implements [`SolverDependentTool`]: the installed solver
//! (and its `libz3*` native libraries) is symlinked, or copied where symlinks are not
//! available, into this tool's `CommandPath`.

use crate::error::{Result, ToolError};
use crate::libs::process::run_cmd;
use crate::libs::tool_manager::{SolverDependentTool, ToolManager};
use crate::libs::utilities::binary::link_or_copy;
use crate::schemas::tool_settings::ToolSourceSettings;
use crate::{log_debug, log_info};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix shared by the solver's native libraries (`libz3.so`, `libz3.dylib`, `libz3.dll`).
const SOLVER_LIBRARY_PREFIX: &str = "libz3";

pub struct DotnetCliToolManager {
    settings: ToolSourceSettings,
    dotnet: PathBuf,
}

impl DotnetCliToolManager {
    /// `dotnet` is the CLI used for installs; a bare name is looked up on `PATH`.
    pub fn new(settings: ToolSourceSettings, dotnet: impl Into<PathBuf>) -> Self {
        DotnetCliToolManager {
            settings,
            dotnet: dotnet.into(),
        }
    }

    /// Arguments passed to `dotnet` to install this tool.
    pub fn install_args(&self) -> Vec<String> {
        let mut args = vec![
            "tool".to_string(),
            "install".to_string(),
            self.settings.package_id().to_string(),
            "--tool-path".to_string(),
            self.settings.command_path.display().to_string(),
        ];
        if !self.settings.version.is_empty() {
            args.push("--version".to_string());
            args.push(self.settings.version.clone());
        }
        // A private feed can be given as the source URL.
        if !self.settings.source_url.is_empty() {
            args.push("--add-source".to_string());
            args.push(self.settings.source_url.clone());
        }
        args
    }

    fn link_into_command_path(&self, source: &Path) -> Result<()> {
        let Some(file_name) = source.file_name() else {
            return Ok(());
        };
        let dest = self.settings.command_path.join(file_name);
        // `exists` follows links, so a dangling one is relinked below.
        if dest.exists() {
            log_debug!(
                "[Grover::Tools::Dotnet] {} already present for {}",
                dest.display(),
                self.settings.name
            );
            return Ok(());
        }
        // Symlink targets resolve against the link's directory, not ours.
        let source = std::path::absolute(source)
            .map_err(|e| ToolError::io(format!("Resolving {}", source.display()), e))?;
        link_or_copy(&source, &dest).map_err(|e| ToolError::io(format!("Linking {}", dest.display()), e))
    }
}

impl ToolManager for DotnetCliToolManager {
    fn settings(&self) -> &ToolSourceSettings {
        &self.settings
    }

    fn ensure_existed(&self) -> Result<()> {
        if self.exists() {
            log_debug!(
                "[Grover::Tools::Dotnet] {} already installed at {}",
                self.settings.name.bold(),
                self.command().display()
            );
            return Ok(());
        }

        self.ensure_command_path_existed()?;
        log_info!(
            "[Grover::Tools::Dotnet] Installing {} with {} tool install",
            self.settings.package_id().bold(),
            self.dotnet.display()
        );

        if run_cmd(&self.dotnet, &self.install_args(), None).is_none() {
            return Err(ToolError::InstallFailed {
                tool: self.settings.name.clone(),
                reason: format!("{} tool install {} did not succeed", self.dotnet.display(), self.settings.package_id()),
            });
        }

        if !self.exists() {
            return Err(ToolError::ExecutableNotFound {
                exe: self.exe_name(),
                dir: self.settings.command_path.clone(),
            });
        }

        log_info!(
            "[Grover::Tools::Dotnet] Installed {} at {}",
            self.settings.name.bold().green(),
            self.command().display().to_string().cyan()
        );
        Ok(())
    }
}

impl SolverDependentTool for DotnetCliToolManager {
    fn ensure_linked_to_solver(&self, solver: &dyn ToolManager) -> Result<()> {
        let solver_command = solver.command();
        if !solver.exists() {
            return Err(ToolError::SolverMissing {
                tool: self.settings.name.clone(),
                solver: solver.settings().name.clone(),
                path: solver_command,
            });
        }

        self.ensure_command_path_existed()?;

        let solver_dir = &solver.settings().command_path;
        let entries = fs::read_dir(solver_dir)
            .map_err(|e| ToolError::io(format!("Reading {}", solver_dir.display()), e))?;
        for entry in entries.filter_map(|e| e.ok()) {
            let is_library = entry
                .file_name()
                .to_string_lossy()
                .starts_with(SOLVER_LIBRARY_PREFIX);
            if is_library && entry.path().is_file() {
                self.link_into_command_path(&entry.path())?;
            }
        }

        // The executable goes last, mirroring how installs place it.
        self.link_into_command_path(&solver_command)?;

        log_info!(
            "[Grover::Tools::Dotnet] {} linked to {}",
            self.settings.name.bold(),
            solver.settings().name.green()
        );
        Ok(())
    }

    fn as_tool(&self) -> &dyn ToolManager {
        self
    }
}
