//! # Application Context
//!
//! Everything a command needs besides its own arguments: the bound configuration,
//! where Grover is running, whether debug output is on, and the cancellation flag
//! raised by Ctrl-C. Built once in `main` and handed to every handler.

use crate::cli::type_enums::ExitResult;
use crate::error::Result;
use crate::libs::config_loading::{
    BoundToolSettings, ExecutionEnvironment, detect_environment, load_app_config, load_tool_settings,
    tools_root,
};
use crate::libs::utilities::path_helpers::expand_path;
use crate::libs::utilities::platform::Platform;
use crate::schemas::app_config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct AppContext {
    pub config: AppConfig,
    pub environment: ExecutionEnvironment,
    pub debug: bool,
    cancellation: Arc<AtomicBool>,
}

impl AppContext {
    pub fn new(config: AppConfig, environment: ExecutionEnvironment, debug: bool) -> Self {
        AppContext {
            config,
            environment,
            debug,
            cancellation: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Detects the execution environment and binds `config.json` plus `GROVER_*`
    /// variables from the process environment.
    pub fn from_process_env(debug: bool) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let environment = detect_environment(&env);
        let config = load_app_config(Path::new(DEFAULT_CONFIG_FILE), environment, &env)?;
        Ok(AppContext::new(config, environment, debug))
    }

    /// Shared handle to the cancellation flag, for work running off the main thread.
    pub fn cancellation(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancellation)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.load(Ordering::SeqCst)
    }

    pub fn platform(&self) -> Platform {
        Platform::current()
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.config.log_file.as_deref().map(expand_path)
    }

    /// Extra directories consulted when resolving assembly references.
    pub fn reference_paths(&self) -> Vec<PathBuf> {
        self.config
            .reference_paths
            .iter()
            .map(|p| expand_path(p))
            .collect()
    }

    /// Binds per-tool settings from the configured settings and overrides files.
    pub fn tool_settings(&self) -> Result<BoundToolSettings> {
        let settings_file = expand_path(self.config.tool_settings_file());
        let overrides_file = expand_path(self.config.tool_overrides_file());
        log_debug!(
            "[Grover::Context] Tool settings {} (overrides {})",
            settings_file.display(),
            overrides_file.display()
        );
        load_tool_settings(
            &settings_file,
            &overrides_file,
            &tools_root(&self.config),
            self.platform(),
        )
    }
}

/// Watches for Ctrl-C on a background thread. On interrupt the cancellation flag is
/// raised and the process exits with SUCCESS; an interrupt is not an error.
pub fn install_interrupt_handler(cancellation: Arc<AtomicBool>) -> io::Result<()> {
    std::thread::Builder::new()
        .name("grover-interrupt".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    log_warn!("[Grover::Context] Ctrl-C handling unavailable: {}", e);
                    return;
                }
            };
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        cancellation.store(true, Ordering::SeqCst);
                        log_info!("{}", "Ctrl-C pressed. Exiting.".yellow());
                        std::process::exit(ExitResult::Success.code());
                    }
                    Err(e) => log_warn!("[Grover::Context] Could not listen for Ctrl-C: {}", e),
                }
            });
        })?;
    Ok(())
}
