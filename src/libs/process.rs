// Running external tools as subprocesses and capturing what they print.

use crate::{log_debug, log_error};
use colored::Colorize;
use std::path::Path;
use std::process::Command;

/// Runs `program` with `args` and returns its trimmed standard output.
///
/// The call counts as failed, and `None` is returned, when:
/// * the process cannot be started,
/// * it writes anything to standard error, or
/// * it exits with a non-zero status.
///
/// Failures are logged with the error text the tool produced. A tool that prints
/// benign diagnostics on stderr is therefore reported as failed.
pub fn run_cmd(program: &Path, args: &[String], cwd: Option<&Path>) -> Option<String> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    log_debug!(
        "[Grover::Process] Executing: {} {}",
        program.display().to_string().cyan().bold(),
        args.join(" ").cyan()
    );

    let output = match command.output() {
        Ok(output) => output,
        Err(e) => {
            log_error!(
                "[Grover::Process] Error executing command {} {}: {}",
                program.display().to_string().red(),
                args.join(" "),
                e
            );
            return None;
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !stderr.trim().is_empty() {
        log_error!("{}", stderr.trim_end());
        return None;
    }

    if !output.status.success() {
        log_error!(
            "[Grover::Process] {} exited with {}. Output: {}",
            program.display().to_string().red(),
            output.status,
            stdout.trim()
        );
        return None;
    }

    let trimmed = stdout.trim().to_string();
    log_debug!(
        "[Grover::Process] Command {} {} returned {}",
        program.display(),
        args.join(" "),
        trimmed
    );
    Some(trimmed)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Option<String> {
        run_cmd(Path::new("sh"), &["-c".to_string(), script.to_string()], None)
    }

    #[test]
    fn returns_trimmed_stdout() {
        assert_eq!(sh("echo '  Boogie version 2.15.9  '").as_deref(), Some("Boogie version 2.15.9"));
    }

    #[test]
    fn any_stderr_output_is_a_failure() {
        assert_eq!(sh("echo ok; echo warning >&2"), None);
    }

    #[test]
    fn non_zero_exit_is_a_failure() {
        assert_eq!(sh("echo partial; exit 3"), None);
    }

    #[test]
    fn missing_program_is_a_failure() {
        assert_eq!(run_cmd(Path::new("/nonexistent/grover-tool"), &[], None), None);
    }

    #[test]
    fn runs_in_requested_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = run_cmd(Path::new("pwd"), &[], Some(dir.path())).unwrap();
        assert_eq!(
            std::fs::canonicalize(out).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }
}
