// Helpers for placing executables on disk: locating them inside extracted
// archives, moving them into place, fixing permissions and linking them.

use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Recursively searches `dir` for a file called `exe_name`.
///
/// Release archives nest their binaries (`z3-4.12.2-x64-glibc-2.31/bin/z3`), so the
/// name is matched anywhere in the tree. Shallower matches win.
pub fn find_named_executable(dir: &Path, exe_name: &str) -> Option<PathBuf> {
    log_debug!(
        "[Grover::Binary] Searching for {} in: {:?}",
        exe_name.bold(),
        dir.to_string_lossy().yellow()
    );

    let found = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(exe_name))
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path());

    match &found {
        Some(path) => log_debug!("[Grover::Binary] Found {} at {:?}", exe_name, path.display()),
        None => log_warn!(
            "[Grover::Binary] No {} found within {:?}",
            exe_name,
            dir.to_string_lossy().purple()
        ),
    }
    found
}

/// Moves a file to `to`, creating parent directories. Falls back to copy and
/// remove when source and destination are on different filesystems.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    log_debug!(
        "[Grover::Binary] Moving {:?} to {:?}",
        from.to_string_lossy().yellow(),
        to.to_string_lossy().cyan()
    );

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(from, to) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log_warn!(
                "[Grover::Binary] Cross-device move, falling back to copy and remove for {:?}: {}",
                from.display(),
                e
            );
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Makes a given file executable. On Unix-like systems, this is equivalent to `chmod 755 file`.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    log_debug!("[Grover::Binary] Making {:?} executable", path.to_string_lossy().yellow());
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
}

// Windows decides executability by extension, not mode bits.
#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Places `source` at `dest` as a symlink where the OS allows it, otherwise as a copy.
/// An existing `dest` is replaced.
pub fn link_or_copy(source: &Path, dest: &Path) -> io::Result<()> {
    if dest.symlink_metadata().is_ok() {
        fs::remove_file(dest)?;
    }

    #[cfg(unix)]
    {
        match std::os::unix::fs::symlink(source, dest) {
            Ok(()) => {
                log_debug!(
                    "[Grover::Binary] Symlinked {} -> {}",
                    dest.display().to_string().cyan(),
                    source.display()
                );
                return Ok(());
            }
            Err(e) => {
                log_warn!(
                    "[Grover::Binary] Symlink {} failed ({}), copying instead",
                    dest.display(),
                    e
                );
            }
        }
    }

    fs::copy(source, dest)?;
    make_executable(dest)?;
    log_info!(
        "[Grover::Binary] Copied {} to {}",
        source.display(),
        dest.display().to_string().green()
    );
    Ok(())
}
