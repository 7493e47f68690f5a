//! Application-level settings bound from `config.json`.

use serde::Deserialize;

/// Optional knobs read from `config.json` and `GROVER_*` environment variables.
/// Every field falls back to a built-in default when unset.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Path of the tool source settings file.
    #[serde(alias = "ToolSettings")]
    pub tool_settings: Option<String>,
    /// Path of the tool source overrides file.
    #[serde(alias = "ToolOverrides")]
    pub tool_overrides: Option<String>,
    /// Directory under which every tool gets its own install directory.
    #[serde(alias = "ToolsRoot")]
    pub tools_root: Option<String>,
    /// The `dotnet` executable used for package-manager installs.
    #[serde(alias = "Dotnet")]
    pub dotnet: Option<String>,
    /// Structured log file. No file sink when unset.
    #[serde(alias = "LogFile")]
    pub log_file: Option<String>,
    /// Extra directories probed when resolving assembly references.
    #[serde(alias = "ReferencePaths")]
    pub reference_paths: Vec<String>,
}

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_TOOL_SETTINGS_FILE: &str = "toolsourcesettings.json";
pub const DEFAULT_TOOL_OVERRIDES_FILE: &str = "toolsourceoverrides.json";
pub const DEFAULT_DOTNET: &str = "dotnet";

impl AppConfig {
    pub fn tool_settings_file(&self) -> &str {
        self.tool_settings
            .as_deref()
            .unwrap_or(DEFAULT_TOOL_SETTINGS_FILE)
    }

    pub fn tool_overrides_file(&self) -> &str {
        self.tool_overrides
            .as_deref()
            .unwrap_or(DEFAULT_TOOL_OVERRIDES_FILE)
    }

    pub fn dotnet_command(&self) -> &str {
        self.dotnet.as_deref().unwrap_or(DEFAULT_DOTNET)
    }
}
