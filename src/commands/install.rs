// The `install` verb: make sure every external tool is present, optionally
// followed by one version line per tool.

use crate::cli::type_enums::ExitResult;
use crate::libs::external_tools_manager::ExternalToolsManager;
use crate::libs::runtime::AppContext;
use crate::logger;
use anyhow::Context;

pub fn run(context: &AppContext, info: bool) -> anyhow::Result<ExitResult> {
    let tools = ExternalToolsManager::from_context(context).context("Binding external tool settings")?;

    let op = logger::begin("Installing external tools");
    tools
        .ensure_all_existed()
        .context("Installing external tools")?;
    op.complete();

    if info && !context.is_cancelled() {
        for line in tools.get_version_info() {
            println!("{line}");
        }
    }
    Ok(ExitResult::Success)
}
