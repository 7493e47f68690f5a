// Register application subcommands.
// Each module corresponds to one `grover` verb and returns the exit result for it.

// Inspects a .NET assembly's identity and references.
pub mod assembly;
// Installs the external tools and reports their versions.
pub mod install;
// Runs Boogie or Corral with the caller's arguments.
pub mod passthrough;
// Drives the bytecode translator over an assembly.
pub mod translate;
