// The `boogie`, `corral` and `ssc` verbs hand their arguments to the installed
// tool unchanged and print what it writes to stdout.

use crate::cli::type_enums::ExitResult;
use crate::libs::external_tools_manager::ExternalToolsManager;
use crate::libs::process::run_cmd;
use crate::libs::runtime::AppContext;
use crate::libs::tool_manager::ToolManager;
use crate::log_error;
use anyhow::Context;
use colored::Colorize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughTool {
    Boogie,
    Corral,
    /// The Spec# compiler. It runs from its own directory.
    SpecSharp,
}

impl PassthroughTool {
    fn display_name(self) -> &'static str {
        match self {
            PassthroughTool::Boogie => "Boogie",
            PassthroughTool::Corral => "Corral",
            PassthroughTool::SpecSharp => "ssc",
        }
    }
}

pub fn run(context: &AppContext, tool_kind: PassthroughTool, args: &[String]) -> anyhow::Result<ExitResult> {
    let tools = ExternalToolsManager::from_context(context).context("Binding external tool settings")?;
    let (tool, cwd) = match tool_kind {
        PassthroughTool::Boogie => (tools.boogie(), None),
        PassthroughTool::Corral => (tools.corral(), None),
        PassthroughTool::SpecSharp => (tools.spec_sharp(), Some(tools.spec_sharp().settings().command_path.as_path())),
    };
    Ok(run_tool(tool, tool_kind.display_name(), args, cwd))
}

/// Runs `tool` with `args`. Anything on stderr, or a failing exit status, is an error in results.
pub fn run_tool(tool: &dyn ToolManager, display_name: &str, args: &[String], cwd: Option<&Path>) -> ExitResult {
    if !tool.exists() {
        log_error!(
            "{} is not installed at {}. Run `grover install` first, or set its CommandPath.",
            display_name,
            tool.command().display().to_string().red()
        );
        return ExitResult::NotFound;
    }

    match run_cmd(&tool.command(), args, cwd) {
        Some(output) => {
            println!("{}", output.bold().white());
            ExitResult::Success
        }
        None => {
            log_error!("Error executing {}.", display_name);
            ExitResult::ErrorInResults
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::installers::preinstalled::PreinstalledTool;
    use crate::schemas::tool_settings::ToolSourceSettings;
    use std::path::PathBuf;

    fn tool(name: &str, dir: &str) -> PreinstalledTool {
        PreinstalledTool::new(ToolSourceSettings {
            name: name.to_string(),
            command_path: PathBuf::from(dir),
            source_url: String::new(),
            version: String::new(),
            package: None,
            sha256: None,
            version_arg: String::new(),
        })
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn stdout_only_run_succeeds() {
        let sh = tool("sh", "/bin");
        assert_eq!(run_tool(&sh, "Boogie", &args(&["-c", "echo Boogie 3.0.1"]), None), ExitResult::Success);
    }

    #[test]
    fn stderr_output_is_an_error_in_results() {
        let sh = tool("sh", "/bin");
        assert_eq!(
            run_tool(&sh, "Boogie", &args(&["-c", "echo 'parse error' >&2"]), None),
            ExitResult::ErrorInResults
        );
    }

    #[test]
    fn runs_from_the_given_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let sh = tool("sh", "/bin");
        let script = args(&["-c", "touch ssc.out"]);

        assert_eq!(run_tool(&sh, "ssc", &script, Some(dir.path())), ExitResult::Success);
        assert!(dir.path().join("ssc.out").is_file());
    }

    #[test]
    fn missing_tool_is_not_found() {
        let absent = tool("boogie", "/nonexistent/grover/boogie");
        assert_eq!(run_tool(&absent, "Boogie", &args(&["-version"]), None), ExitResult::NotFound);
    }
}
