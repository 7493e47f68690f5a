// One module per distribution channel an external tool can come from.
// Each module provides a `ToolManager` implementation; the registry in
// `libs::external_tools_manager` decides which tool uses which channel.

/// Release archives fetched from a URL and unpacked (Z3).
pub(crate) mod downloaded;

/// .NET global tools installed with `dotnet tool install` (Boogie, Corral).
/// These also link the solver into their own directory.
pub(crate) mod dotnet_cli;

/// The Solidity compiler's own binaries channel.
pub(crate) mod solc;

/// Tools that are only invoked, never installed (the bytecode translator).
pub(crate) mod preinstalled;
