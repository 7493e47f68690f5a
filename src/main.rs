// Grover: installs and drives the external verification tools (Z3, Boogie,
// Corral, solc) and inspects the .NET assemblies fed to them.

mod cli;
mod commands;
mod error;
mod installers;
mod libs;
mod logger;
mod metadata;
mod schemas;

use clap::Parser;
use clap::error::ErrorKind;
use cli::cmd_enums::{Cli, Commands};
use cli::type_enums::ExitResult;
use colored::Colorize;
use commands::passthrough::PassthroughTool;
use commands::{assembly, install, passthrough, translate};
use libs::runtime::{AppContext, install_interrupt_handler};

fn main() {
    eprintln!("{} v{}", "Grover".blue().bold(), env!("CARGO_PKG_VERSION"));

    std::panic::set_hook(Box::new(|info| {
        log_error!("Unhandled runtime error occurred. Grover CLI will now shutdown.");
        log_error!("{}", info);
        std::process::exit(ExitResult::UnhandledException.code());
    }));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let result = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitResult::Success,
                _ => ExitResult::InvalidOptions,
            };
            // clap renders help to stdout and errors to stderr.
            let _ = e.print();
            std::process::exit(result.code());
        }
    };

    let result = match run(cli) {
        Ok(result) => result,
        Err(e) => {
            log_error!("{:#}", e);
            ExitResult::UnhandledException
        }
    };
    log_debug!("[Grover] Exiting with {} ({})", result, result.code());
    std::process::exit(result.code());
}

fn run(cli: Cli) -> anyhow::Result<ExitResult> {
    logger::init(cli.debug, None);
    let context = AppContext::from_process_env(cli.debug)?;
    if let Some(log_file) = context.log_file() {
        logger::init(cli.debug, Some(&log_file));
    }
    if context.debug {
        log_info!("Debug mode set.");
    }
    log_debug!("[Grover] Execution environment: {:?}", context.environment);

    if let Err(e) = install_interrupt_handler(context.cancellation()) {
        log_warn!("[Grover] Could not install the Ctrl-C handler: {}", e);
    }

    match cli.command {
        Commands::Install { info } => install::run(&context, info),
        Commands::Assembly { file, references } => assembly::run(&context, &file, references),
        Commands::Boogie { args } => passthrough::run(&context, PassthroughTool::Boogie, &args),
        Commands::Corral { args } => passthrough::run(&context, PassthroughTool::Corral, &args),
        Commands::Ssc { args } => passthrough::run(&context, PassthroughTool::SpecSharp, &args),
        Commands::Translate { file, heap, options } => translate::run(&context, &file, heap, options.as_deref()),
    }
}
