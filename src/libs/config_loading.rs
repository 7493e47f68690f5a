use crate::error::{Result, ToolError};
use crate::libs::utilities::path_helpers::{default_tools_root, expand_path};
use crate::libs::utilities::platform::Platform;
use crate::schemas::app_config::AppConfig;
use crate::schemas::tool_settings::{ToolKey, ToolSourceConfig, ToolSourceSettings};
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variables whose presence marks a containerized execution context.
pub const CONTAINER_MARKERS: [&str; 2] = ["KUBERNETES_PORT", "OPENSHIFT_BUILD_NAMESPACE"];

/// Where Grover is running. Decides which configuration sources are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionEnvironment {
    /// A developer machine or CI host: `config.json` plus environment overrides.
    Local,
    /// A Kubernetes/OpenShift pod: environment variables only.
    Container,
}

/// Detects the execution environment from the container marker variables.
pub fn detect_environment(env: &dyn Fn(&str) -> Option<String>) -> ExecutionEnvironment {
    let in_container = CONTAINER_MARKERS
        .iter()
        .any(|var| env(var).is_some_and(|v| !v.is_empty()));
    if in_container {
        ExecutionEnvironment::Container
    } else {
        ExecutionEnvironment::Local
    }
}

/// Reads and deserializes an optional JSON file.
///
/// A missing file yields `None`; an unreadable or malformed file is an error,
/// since silently ignoring a broken config would install tools to surprising places.
pub fn load_optional_json<T>(path: &Path, config_name: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    if !path.exists() {
        log_debug!(
            "[Grover::Config] No {} file at {}. Using defaults.",
            config_name,
            path.display().to_string().yellow()
        );
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| ToolError::io(format!("Reading {} file {}", config_name, path.display()), e))?;
    let parsed = serde_json::from_str::<T>(&contents)?;
    log_debug!(
        "[Grover::Config] Loaded {} configuration from {}",
        config_name,
        path.display().to_string().green()
    );
    Ok(Some(parsed))
}

/// Binds the application configuration.
///
/// Locally, `config_file` is read (when present) and then overlaid by `GROVER_*`
/// environment variables. In a container only the environment is consulted.
pub fn load_app_config(
    config_file: &Path,
    environment: ExecutionEnvironment,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<AppConfig> {
    let mut config = match environment {
        ExecutionEnvironment::Local => {
            load_optional_json::<AppConfig>(config_file, "application")?.unwrap_or_default()
        }
        ExecutionEnvironment::Container => {
            log_debug!("[Grover::Config] Container detected, reading configuration from the environment only.");
            AppConfig::default()
        }
    };

    if let Some(v) = env("GROVER_TOOL_SETTINGS") {
        config.tool_settings = Some(v);
    }
    if let Some(v) = env("GROVER_TOOL_OVERRIDES") {
        config.tool_overrides = Some(v);
    }
    if let Some(v) = env("GROVER_TOOLS_ROOT") {
        config.tools_root = Some(v);
    }
    if let Some(v) = env("GROVER_DOTNET") {
        config.dotnet = Some(v);
    }
    if let Some(v) = env("GROVER_LOG_FILE") {
        config.log_file = Some(v);
    }
    if let Some(v) = env("GROVER_REFERENCE_PATHS") {
        config.reference_paths = std::env::split_paths(&v)
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.is_empty())
            .collect();
    }

    Ok(config)
}

/// Bound settings for every tool Grover knows about.
#[derive(Debug, Clone)]
pub struct BoundToolSettings {
    pub z3: ToolSourceSettings,
    pub boogie: ToolSourceSettings,
    pub corral: ToolSourceSettings,
    pub solc: ToolSourceSettings,
    pub bct: ToolSourceSettings,
    pub ssc: ToolSourceSettings,
}

/// Resolves the tools root from configuration, defaulting to the user data directory.
pub fn tools_root(config: &AppConfig) -> PathBuf {
    config
        .tools_root
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(default_tools_root)
}

/// Builds per-tool settings: built-in defaults, then the settings file, then the
/// overrides file. Missing files are tolerated.
pub fn load_tool_settings(
    settings_file: &Path,
    overrides_file: &Path,
    tools_root: &Path,
    platform: Platform,
) -> Result<BoundToolSettings> {
    let settings = load_optional_json::<ToolSourceConfig>(settings_file, "tool source settings")?;
    let overrides = load_optional_json::<ToolSourceConfig>(overrides_file, "tool source overrides")?;

    if settings.is_none() {
        log_info!(
            "[Grover::Config] {} not found, using built-in tool sources.",
            settings_file.display().to_string().yellow()
        );
    }
    if overrides.is_some() {
        log_warn!(
            "[Grover::Config] Tool source overrides applied from {}",
            overrides_file.display().to_string().yellow()
        );
    }

    let bind = |key: ToolKey| -> Result<ToolSourceSettings> {
        let mut bound = key.defaults(platform, tools_root);
        if let Some(section) = settings.as_ref().and_then(|c| c.section(key)) {
            bound.apply(section);
        }
        if let Some(section) = overrides.as_ref().and_then(|c| c.section(key)) {
            bound.apply(section);
        }
        bound.validate(key)?;
        log_debug!(
            "[Grover::Config] {} bound to {:?}",
            key.to_string().bold(),
            bound
        );
        Ok(bound)
    };

    Ok(BoundToolSettings {
        z3: bind(ToolKey::Z3)?,
        boogie: bind(ToolKey::Boogie)?,
        corral: bind(ToolKey::Corral)?,
        solc: bind(ToolKey::Solc)?,
        bct: bind(ToolKey::Bct)?,
        ssc: bind(ToolKey::Ssc)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn container_markers_are_detected() {
        assert_eq!(
            detect_environment(&env_from(&[("KUBERNETES_PORT", "tcp://10.0.0.1:443")])),
            ExecutionEnvironment::Container
        );
        assert_eq!(
            detect_environment(&env_from(&[("OPENSHIFT_BUILD_NAMESPACE", "")])),
            ExecutionEnvironment::Local
        );
    }

    #[test]
    fn env_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let config_file = dir.path().join("config.json");
        fs::write(&config_file, r#"{ "ToolsRoot": "/from/file", "Dotnet": "/usr/bin/dotnet" }"#).unwrap();

        let config = load_app_config(
            &config_file,
            ExecutionEnvironment::Local,
            &env_from(&[("GROVER_TOOLS_ROOT", "/from/env")]),
        )
        .unwrap();

        assert_eq!(config.tools_root.as_deref(), Some("/from/env"));
        assert_eq!(config.dotnet.as_deref(), Some("/usr/bin/dotnet"));
    }

    #[test]
    fn container_ignores_config_file() {
        let dir = TempDir::new().unwrap();
        let config_file = dir.path().join("config.json");
        fs::write(&config_file, r#"{ "Dotnet": "/usr/bin/dotnet" }"#).unwrap();

        let config = load_app_config(&config_file, ExecutionEnvironment::Container, &env_from(&[])).unwrap();

        assert!(config.dotnet.is_none());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config_file = dir.path().join("config.json");
        fs::write(&config_file, "{ not json").unwrap();

        let err = load_app_config(&config_file, ExecutionEnvironment::Local, &env_from(&[])).unwrap_err();
        assert!(matches!(err, ToolError::Json(_)));
    }

    #[test]
    fn missing_settings_files_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let bound = load_tool_settings(
            &dir.path().join("absent.json"),
            &dir.path().join("absent-overrides.json"),
            Path::new("/opt/grover"),
            Platform::Linux,
        )
        .unwrap();

        assert_eq!(bound.z3.command_path, PathBuf::from("/opt/grover/z3"));
        assert_eq!(bound.boogie.package_id(), "Boogie");
        assert_eq!(bound.solc.name, "solc");
    }

    #[test]
    fn overrides_win_over_settings() {
        let dir = TempDir::new().unwrap();
        let settings = dir.path().join("toolsourcesettings.json");
        let overrides = dir.path().join("toolsourceoverrides.json");
        fs::write(
            &settings,
            r#"{ "z3": { "CommandPath": "/tools/z3", "SourceUrl": "https://example/z3.zip" } }"#,
        )
        .unwrap();
        fs::write(&overrides, r#"{ "z3": { "SourceUrl": "file:///mirror/z3.zip" } }"#).unwrap();

        let bound = load_tool_settings(&settings, &overrides, Path::new("/opt"), Platform::Linux).unwrap();

        assert_eq!(bound.z3.command_path, PathBuf::from("/tools/z3"));
        assert_eq!(bound.z3.source_url, "file:///mirror/z3.zip");
    }

    #[test]
    fn empty_command_path_is_rejected() {
        let dir = TempDir::new().unwrap();
        let settings = dir.path().join("toolsourcesettings.json");
        fs::write(&settings, r#"{ "corral": { "CommandPath": "" } }"#).unwrap();

        let err = load_tool_settings(&settings, &dir.path().join("none.json"), Path::new("/opt"), Platform::Linux)
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidSettings(_)));
    }
}
