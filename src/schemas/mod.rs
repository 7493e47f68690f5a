// Configuration schemas bound from JSON files on disk.

// `config.json`: application-level settings.
pub mod app_config;
// `toolsourcesettings.json`: per-tool install and source settings.
pub mod tool_settings;
