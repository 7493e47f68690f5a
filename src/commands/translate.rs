// The `translate` verb: validate a .NET assembly and drive the bytecode
// translator over it to produce Boogie IVL.

use crate::cli::type_enums::{ExitResult, HeapModel};
use crate::libs::external_tools_manager::ExternalToolsManager;
use crate::libs::options_parser::{ERROR_KEY, has_errors, parse_options};
use crate::libs::process::run_cmd;
use crate::libs::runtime::AppContext;
use crate::metadata::Assembly;
use crate::{log_debug, log_error, log_info, logger};
use anyhow::Context;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Input kinds the translator accepts.
const ASSEMBLY_EXTENSIONS: [&str; 2] = ["dll", "exe"];

pub fn run(
    context: &AppContext,
    file: &str,
    heap: HeapModel,
    options: Option<&str>,
) -> anyhow::Result<ExitResult> {
    let path = Path::new(file);
    if !path.is_file() {
        log_error!("The file {} does not exist.", file.red());
        return Ok(ExitResult::InvalidOptions);
    }

    let is_assembly = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ASSEMBLY_EXTENSIONS.contains(&e.to_lowercase().as_str()));
    if !is_assembly {
        log_error!("{} is not a .NET assembly (.dll or .exe).", file.red());
        return Ok(ExitResult::InvalidOptions);
    }

    let translator_options = parse_options(options.unwrap_or(""));
    if has_errors(&translator_options) {
        log_error!(
            "Could not parse translator option '{}'. Expected key=value.",
            translator_options[ERROR_KEY].red()
        );
        return Ok(ExitResult::InvalidOptions);
    }

    let tools = ExternalToolsManager::from_context(context).context("Binding external tool settings")?;
    let translator = tools.translator();
    if translator.ensure_existed().is_err() {
        return Ok(ExitResult::NotFound);
    }

    let op = logger::begin(format!("Translating .NET assembly {file} to Boogie IVL"));
    let assembly = Assembly::load(path, &context.reference_paths())
        .with_context(|| format!("Loading assembly {file}"))?;
    log_debug!(
        "[Grover::Translate] {} references {} assemblies",
        file,
        assembly.references.len()
    );

    let files = vec![assembly.path.clone()];
    log_info!(
        "Assemblies to translate: {}.",
        files.iter().map(|f| f.display().to_string()).collect::<Vec<_>>().join(", ")
    );

    match run_translator(&translator.command(), &files, heap, &translator_options) {
        Some(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            op.complete();
            Ok(ExitResult::Success)
        }
        None => {
            log_error!("Error executing the bytecode translator.");
            Ok(ExitResult::ErrorInResults)
        }
    }
}

/// Runs the translator from the directory of the first input, so its outputs land
/// next to the assembly. Inputs are passed as absolute paths.
fn run_translator(
    translator: &Path,
    files: &[PathBuf],
    heap: HeapModel,
    options: &BTreeMap<String, String>,
) -> Option<String> {
    let files: Vec<PathBuf> = files
        .iter()
        .map(|f| std::path::absolute(f).unwrap_or_else(|_| f.clone()))
        .collect();
    let cwd = files.first().and_then(|f| f.parent()).map(Path::to_path_buf);
    run_cmd(translator, &translator_args(&files, heap, options), cwd.as_deref())
}

fn heap_option(heap: HeapModel) -> &'static str {
    match heap {
        HeapModel::General => "general",
        HeapModel::Split => "splitFields",
    }
}

/// Translator command line: the input files, the heap model, then `/key:value` per option.
pub fn translator_args(files: &[PathBuf], heap: HeapModel, options: &BTreeMap<String, String>) -> Vec<String> {
    files
        .iter()
        .map(|f| f.display().to_string())
        .chain(std::iter::once(format!("/heap:{}", heap_option(heap))))
        .chain(options.iter().map(|(key, value)| format!("/{key}:{value}")))
        .collect()
}
