// Our custom logging macros to give us nicely formatted (and colored!) output.
use crate::{log_debug, log_warn};
use colored::Colorize;
use std::path::PathBuf;

/// Expands `~` and `$VARS` in a configured path.
///
/// Values that reference an undefined variable are logged and returned as
/// written, so the failure surfaces later as a readable "path not found".
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            log_warn!(
                "[Grover::Paths] Could not expand '{}': {}. Using it verbatim.",
                path.yellow(),
                e
            );
            PathBuf::from(path)
        }
    }
}

/// Returns the default root under which every external tool gets its own
/// directory, typically `~/.local/share/grover/tools` on Linux.
/// Falls back to `./.grover/tools` when no data directory can be determined.
pub fn default_tools_root() -> PathBuf {
    match dirs::data_local_dir() {
        Some(data_dir) => {
            let root = data_dir.join("grover").join("tools");
            log_debug!(
                "[Grover::Paths] Tools root resolved to: {}",
                root.display().to_string().cyan()
            );
            root
        }
        None => {
            log_warn!(
                "[Grover::Paths] Could not determine the local data directory. Using ./.grover/tools"
            );
            PathBuf::from(".grover").join("tools")
        }
    }
}
