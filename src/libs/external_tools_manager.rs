//! # External Tools Registry
//!
//! Holds one manager per external tool and drives them together:
//!
//! | Tool   | Role                     | Channel                         |
//! |--------|--------------------------|---------------------------------|
//! | z3     | SMT solver               | release archive                 |
//! | boogie | verifier, needs z3       | `dotnet tool install`           |
//! | corral | analyzer, needs z3       | `dotnet tool install`           |
//! | solc   | Solidity compiler        | soliditylang binaries channel   |
//! | bct    | bytecode translator      | preinstalled, only invoked      |
//! | ssc    | Spec# compiler           | preinstalled, only invoked      |
//!
//! The registry is built from an [`AppContext`] and owned by the command that
//! needs it; nothing here is process-global.

use crate::error::{Result, ToolError};
use crate::installers::dotnet_cli::DotnetCliToolManager;
use crate::installers::downloaded::DownloadedToolManager;
use crate::installers::preinstalled::PreinstalledTool;
use crate::installers::solc::SolcManager;
use crate::libs::config_loading::BoundToolSettings;
use crate::libs::runtime::AppContext;
use crate::libs::tool_manager::{SolverDependentTool, ToolManager};
use crate::libs::utilities::path_helpers::expand_path;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct ExternalToolsManager {
    solver: Box<dyn ToolManager>,
    boogie: Box<dyn SolverDependentTool>,
    corral: Box<dyn SolverDependentTool>,
    compiler: Box<dyn ToolManager>,
    translator: Box<dyn ToolManager>,
    spec_sharp: Box<dyn ToolManager>,
    cancellation: Arc<AtomicBool>,
}

impl ExternalToolsManager {
    pub fn new(
        solver: Box<dyn ToolManager>,
        boogie: Box<dyn SolverDependentTool>,
        corral: Box<dyn SolverDependentTool>,
        compiler: Box<dyn ToolManager>,
        translator: Box<dyn ToolManager>,
        spec_sharp: Box<dyn ToolManager>,
        cancellation: Arc<AtomicBool>,
    ) -> Self {
        ExternalToolsManager {
            solver,
            boogie,
            corral,
            compiler,
            translator,
            spec_sharp,
            cancellation,
        }
    }

    /// Wires each tool to the manager for its distribution channel.
    pub fn from_settings(settings: BoundToolSettings, dotnet: &str, cancellation: Arc<AtomicBool>) -> Self {
        let dotnet = expand_path(dotnet);
        ExternalToolsManager::new(
            Box::new(DownloadedToolManager::new(settings.z3)),
            Box::new(DotnetCliToolManager::new(settings.boogie, dotnet.clone())),
            Box::new(DotnetCliToolManager::new(settings.corral, dotnet)),
            Box::new(SolcManager::new(settings.solc)),
            Box::new(PreinstalledTool::new(settings.bct)),
            Box::new(PreinstalledTool::new(settings.ssc)),
            cancellation,
        )
    }

    pub fn from_context(context: &AppContext) -> Result<Self> {
        let settings = context.tool_settings()?;
        Ok(ExternalToolsManager::from_settings(
            settings,
            context.config.dotnet_command(),
            context.cancellation(),
        ))
    }

    pub fn solver(&self) -> &dyn ToolManager {
        self.solver.as_ref()
    }

    pub fn boogie(&self) -> &dyn ToolManager {
        self.boogie.as_tool()
    }

    pub fn corral(&self) -> &dyn ToolManager {
        self.corral.as_tool()
    }

    pub fn compiler(&self) -> &dyn ToolManager {
        self.compiler.as_ref()
    }

    pub fn translator(&self) -> &dyn ToolManager {
        self.translator.as_ref()
    }

    pub fn spec_sharp(&self) -> &dyn ToolManager {
        self.spec_sharp.as_ref()
    }

    /// The installable tools in registration order. The translator and the Spec#
    /// compiler are not among them.
    pub fn tools(&self) -> Vec<&dyn ToolManager> {
        vec![self.solver(), self.boogie(), self.corral(), self.compiler()]
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.load(Ordering::SeqCst) {
            log_warn!("[Grover::Tools] Installation cancelled.");
            return Err(ToolError::Cancelled);
        }
        Ok(())
    }

    /// Installs every tool: the solver first, then each solver-dependent tool
    /// (install, then link to the solver), then the compiler.
    ///
    /// The first failure is returned and the remaining tools are left alone.
    pub fn ensure_all_existed(&self) -> Result<()> {
        log_info!("[Grover::Tools] Ensuring external tools are installed...");

        self.check_cancelled()?;
        self.solver.ensure_existed()?;

        for dependent in [&self.boogie, &self.corral] {
            self.check_cancelled()?;
            dependent.ensure_existed()?;
            dependent.ensure_linked_to_solver(self.solver.as_ref())?;
        }

        self.check_cancelled()?;
        self.compiler.ensure_existed()?;

        log_info!("[Grover::Tools] {}", "All external tools are installed.".green());
        Ok(())
    }

    /// One version line per installable tool, in registration order.
    pub fn get_version_info(&self) -> Vec<String> {
        self.tools()
            .into_iter()
            .map(|tool| {
                let info = tool.version_info();
                log_debug!("[Grover::Tools] {}", info);
                info
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::utilities::platform::Platform;
    use crate::schemas::tool_settings::{ToolKey, ToolSourceSettings};
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<String>>>;

    struct RecordingTool {
        settings: ToolSourceSettings,
        calls: CallLog,
        fail_install: bool,
    }

    impl RecordingTool {
        fn boxed(name: &str, calls: &CallLog, fail_install: bool) -> Box<RecordingTool> {
            Box::new(RecordingTool {
                settings: ToolSourceSettings {
                    name: name.to_string(),
                    command_path: Path::new("/tools").join(name),
                    source_url: String::new(),
                    version: String::new(),
                    package: None,
                    sha256: None,
                    version_arg: "--version".to_string(),
                },
                calls: Rc::clone(calls),
                fail_install,
            })
        }
    }

    impl ToolManager for RecordingTool {
        fn settings(&self) -> &ToolSourceSettings {
            &self.settings
        }

        fn ensure_existed(&self) -> Result<()> {
            self.calls.borrow_mut().push(format!("install {}", self.settings.name));
            if self.fail_install {
                return Err(ToolError::InstallFailed {
                    tool: self.settings.name.clone(),
                    reason: "feed unreachable".to_string(),
                });
            }
            Ok(())
        }

        fn version_info(&self) -> String {
            format!("{}: 1.0.0", self.settings.name)
        }
    }

    impl SolverDependentTool for RecordingTool {
        fn ensure_linked_to_solver(&self, solver: &dyn ToolManager) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("link {} -> {}", self.settings.name, solver.settings().name));
            Ok(())
        }

        fn as_tool(&self) -> &dyn ToolManager {
            self
        }
    }

    fn registry(calls: &CallLog, failing: &str, cancellation: Arc<AtomicBool>) -> ExternalToolsManager {
        ExternalToolsManager::new(
            RecordingTool::boxed("z3", calls, failing == "z3"),
            RecordingTool::boxed("boogie", calls, failing == "boogie"),
            RecordingTool::boxed("corral", calls, failing == "corral"),
            RecordingTool::boxed("solc", calls, failing == "solc"),
            RecordingTool::boxed("BytecodeTranslator", calls, false),
            RecordingTool::boxed("ssc", calls, false),
            cancellation,
        )
    }

    #[test]
    fn solver_is_installed_before_anything_links_to_it() {
        let calls = CallLog::default();
        let tools = registry(&calls, "", Arc::new(AtomicBool::new(false)));

        tools.ensure_all_existed().unwrap();

        assert_eq!(
            *calls.borrow(),
            vec![
                "install z3",
                "install boogie",
                "link boogie -> z3",
                "install corral",
                "link corral -> z3",
                "install solc",
            ]
        );
    }

    #[test]
    fn first_failure_aborts_remaining_tools() {
        let calls = CallLog::default();
        let tools = registry(&calls, "boogie", Arc::new(AtomicBool::new(false)));

        let err = tools.ensure_all_existed().unwrap_err();

        assert!(matches!(err, ToolError::InstallFailed { ref tool, .. } if tool == "boogie"));
        assert_eq!(*calls.borrow(), vec!["install z3", "install boogie"]);
    }

    #[test]
    fn cancellation_stops_before_next_tool() {
        let calls = CallLog::default();
        let cancellation = Arc::new(AtomicBool::new(true));
        let tools = registry(&calls, "", cancellation);

        assert!(matches!(tools.ensure_all_existed().unwrap_err(), ToolError::Cancelled));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn version_info_follows_registration_order() {
        let calls = CallLog::default();
        let tools = registry(&calls, "", Arc::new(AtomicBool::new(false)));

        assert_eq!(
            tools.get_version_info(),
            vec!["z3: 1.0.0", "boogie: 1.0.0", "corral: 1.0.0", "solc: 1.0.0"]
        );
    }

    #[test]
    fn registry_binds_managers_from_settings() {
        let root = Path::new("/opt/grover");
        let platform = Platform::Linux;
        let settings = BoundToolSettings {
            z3: ToolKey::Z3.defaults(platform, root),
            boogie: ToolKey::Boogie.defaults(platform, root),
            corral: ToolKey::Corral.defaults(platform, root),
            solc: ToolKey::Solc.defaults(platform, root),
            bct: ToolKey::Bct.defaults(platform, root),
            ssc: ToolKey::Ssc.defaults(platform, root),
        };

        let tools = ExternalToolsManager::from_settings(settings, "dotnet", Arc::new(AtomicBool::new(false)));

        let names: Vec<_> = tools.tools().iter().map(|t| t.settings().name.clone()).collect();
        assert_eq!(names, vec!["z3", "boogie", "corral", "solc"]);
        assert_eq!(tools.translator().settings().name, "BytecodeTranslator");
        assert_eq!(tools.spec_sharp().command(), Path::new("/opt/grover/ssc/ssc"));
    }
}
