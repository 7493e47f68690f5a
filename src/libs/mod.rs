// Core machinery behind the command handlers: configuration binding, the tool
// manager contract and its registry, the subprocess runner and shared utilities.

pub mod config_loading;
pub mod external_tools_manager;
pub mod options_parser;
pub mod process;
pub mod runtime;
pub mod tool_manager;
pub mod utilities;
