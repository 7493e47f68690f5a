use crate::cli::type_enums::HeapModel;
use clap::{Parser, Subcommand};

/// Defines the command-line interface (CLI) for 'grover'.
/// `#[derive(Parser)]` automatically generates argument parsing code via `clap`.
#[derive(Parser, Debug)]
#[command(name = "grover")]
#[command(version, about = "Install and drive external .NET and Solidity verification tools")]
pub struct Cli {
    /// Enables detailed debug output for troubleshooting and development.
    #[arg(short, long, global = true)]
    pub(crate) debug: bool,

    /// Defines available subcommands for 'grover'.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Enumerates all supported verbs with their specific arguments and options.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install any required external tools.
    Install {
        /// Print version information for installed external tools.
        #[arg(short, long)]
        info: bool,
    },
    /// Load a .NET assembly and inspect its metadata.
    Assembly {
        /// Path to the .dll or .exe to load.
        file: String,
        /// Print the assembly's reference list.
        #[arg(short, long)]
        references: bool,
    },
    /// Run the installed Boogie verifier with the given arguments.
    Boogie {
        /// Arguments passed through to Boogie unchanged.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
    /// Run the installed Corral verifier with the given arguments.
    Corral {
        /// Arguments passed through to Corral unchanged.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
    /// Run the Spec# compiler with the given arguments.
    Ssc {
        /// Arguments passed through to ssc unchanged.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
    /// Translate a .NET bytecode assembly to Boogie IVL.
    Translate {
        /// The .dll or .exe to translate.
        file: String,
        /// Heap model used by the translator [possible values: general, split].
        #[arg(long, default_value = "general")]
        heap: HeapModel,
        /// Extra translator options as a comma separated key=value list.
        #[arg(short, long)]
        options: Option<String>,
    },
}
