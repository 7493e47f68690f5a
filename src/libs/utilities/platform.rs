// Host platform detection. Executable names, Z3 release assets and solc build
// directories all depend on which OS we are running on.

use crate::log_warn;
use colored::Colorize;
use std::fmt;

/// Operating systems Grover knows how to install tools for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Platform {
        normalize_os(std::env::consts::OS)
    }

    /// File name suffix of executables on this platform.
    pub fn exe_suffix(self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            Platform::MacOs | Platform::Linux => "",
        }
    }

    /// Appends the platform executable suffix to a bare tool name.
    pub fn exe_name(self, name: &str) -> String {
        format!("{}{}", name, self.exe_suffix())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::MacOs => write!(f, "osx"),
            Platform::Linux => write!(f, "linux"),
        }
    }
}

/// Maps the various spellings of an OS name onto a [`Platform`].
/// Unknown systems are treated as Linux, the closest Unix-like fallback.
pub fn normalize_os(os: &str) -> Platform {
    match os.to_lowercase().as_str() {
        "windows" | "win32" | "win64" => Platform::Windows,
        "macos" | "darwin" | "apple-darwin" | "osx" => Platform::MacOs,
        "linux" => Platform::Linux,
        other => {
            log_warn!(
                "[Grover::Platform] Unknown OS variant '{}', treating it as linux.",
                other.purple()
            );
            Platform::Linux
        }
    }
}

/// Normalized CPU architecture name (`x64` or `arm64`), as used in Z3 release assets.
pub fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "aarch64" | "arm64" => "arm64".to_string(),
        "amd64" | "x86_64" | "x64" => "x64".to_string(),
        other => other.to_string(),
    }
}
