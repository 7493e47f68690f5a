//! Tools Grover invokes but never installs (the bytecode translator, ssc). They are
//! expected at their configured `CommandPath`; a missing one is reported, not fetched.

use crate::error::{Result, ToolError};
use crate::libs::tool_manager::ToolManager;
use crate::schemas::tool_settings::ToolSourceSettings;
use crate::log_error;
use colored::Colorize;

pub struct PreinstalledTool {
    settings: ToolSourceSettings,
}

impl PreinstalledTool {
    pub fn new(settings: ToolSourceSettings) -> Self {
        PreinstalledTool { settings }
    }
}

impl ToolManager for PreinstalledTool {
    fn settings(&self) -> &ToolSourceSettings {
        &self.settings
    }

    fn ensure_existed(&self) -> Result<()> {
        if self.exists() {
            return Ok(());
        }
        log_error!(
            "[Grover::Tools] {} is not installed at {}. Install it manually or set its CommandPath.",
            self.settings.name.red(),
            self.command().display()
        );
        Err(ToolError::ExecutableNotFound {
            exe: self.exe_name(),
            dir: self.settings.command_path.clone(),
        })
    }
}
