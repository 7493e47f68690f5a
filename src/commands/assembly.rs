// The `assembly` verb: load a .NET assembly's metadata and optionally list
// what it references and where each reference was found.

use crate::cli::type_enums::ExitResult;
use crate::libs::runtime::AppContext;
use crate::metadata::Assembly;
use crate::{log_error, log_info, logger};
use anyhow::Context;
use colored::Colorize;
use prettytable::{Table, format, row};
use std::path::Path;

pub fn run(context: &AppContext, file: &str, references: bool) -> anyhow::Result<ExitResult> {
    let path = Path::new(file);
    if !path.is_file() {
        log_error!("The file {} does not exist.", file.red());
        return Ok(ExitResult::NotFound);
    }

    let op = logger::begin(format!("Loading assembly {file}"));
    let assembly = Assembly::load(path, &context.reference_paths())
        .with_context(|| format!("Loading assembly {file}"))?;
    op.complete();

    match &assembly.identity {
        Some(identity) => log_info!("{} ({})", identity.to_string().bold(), assembly.runtime_version),
        None => log_info!("{} is a module without an assembly manifest ({})", file, assembly.runtime_version),
    }

    if references {
        log_info!("References: {}", assembly.references.len());
        references_table(&assembly).printstd();
    }
    Ok(ExitResult::Success)
}

/// One row per reference: the declared name, the identity it resolved to, and the file.
pub fn references_table(assembly: &Assembly) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["Reference", "Resolved", "Path"]);
    for reference in &assembly.references {
        let resolved = reference
            .resolved
            .as_ref()
            .map(|identity| identity.version_string())
            .unwrap_or_else(|| "-".to_string());
        let path = reference
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unresolved".to_string());
        table.add_row(row![reference.reference.to_string(), resolved, path]);
    }
    table
}
