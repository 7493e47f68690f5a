//! # Tool Source Settings Schema
//!
//! Data structures describing where each external tool is installed and where it
//! is fetched from, as bound from `toolsourcesettings.json`:
//!
//! ```json
//! {
//!   "z3":     { "Name": "z3", "CommandPath": "~/tools/z3", "SourceUrl": "https://...zip", "Version": "4.12.2" },
//!   "boogie": { "Name": "boogie", "CommandPath": "~/tools/boogie", "Package": "Boogie" }
//! }
//! ```
//!
//! Keys may be written PascalCase (as above) or lowercase. Every field is optional
//! in the file; missing fields keep the built-in defaults from [`ToolKey::defaults`].

use crate::error::{Result, ToolError};
use crate::libs::utilities::path_helpers::expand_path;
use crate::libs::utilities::platform::{Platform, normalize_arch};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Fully bound settings of one external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSourceSettings {
    /// Bare executable name, without platform suffix.
    pub name: String,
    /// Install directory. Created lazily.
    pub command_path: PathBuf,
    /// Archive URL, package feed or release channel, depending on the manager.
    pub source_url: String,
    /// Version to install. Empty means "whatever the source considers latest".
    pub version: String,
    /// Package identifier for package-manager installs. Defaults to `name`.
    pub package: Option<String>,
    /// Expected SHA-256 of the downloaded archive.
    pub sha256: Option<String>,
    /// Argument that makes the tool print its version.
    pub version_arg: String,
}

/// One section of the settings file before it is merged onto the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolSourceSection {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "CommandPath")]
    pub command_path: Option<String>,
    #[serde(alias = "SourceUrl")]
    pub source_url: Option<String>,
    #[serde(alias = "Version")]
    pub version: Option<String>,
    #[serde(alias = "Package")]
    pub package: Option<String>,
    #[serde(alias = "Sha256")]
    pub sha256: Option<String>,
    #[serde(alias = "VersionArg")]
    pub version_arg: Option<String>,
}

/// The whole settings (or overrides) file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolSourceConfig {
    #[serde(alias = "Z3")]
    pub z3: Option<ToolSourceSection>,
    #[serde(alias = "Boogie")]
    pub boogie: Option<ToolSourceSection>,
    #[serde(alias = "Corral")]
    pub corral: Option<ToolSourceSection>,
    #[serde(alias = "Solc")]
    pub solc: Option<ToolSourceSection>,
    #[serde(alias = "Bct", alias = "BCT")]
    pub bct: Option<ToolSourceSection>,
    #[serde(alias = "Ssc", alias = "SSC")]
    pub ssc: Option<ToolSourceSection>,
}

impl ToolSourceConfig {
    pub fn section(&self, key: ToolKey) -> Option<&ToolSourceSection> {
        match key {
            ToolKey::Z3 => self.z3.as_ref(),
            ToolKey::Boogie => self.boogie.as_ref(),
            ToolKey::Corral => self.corral.as_ref(),
            ToolKey::Solc => self.solc.as_ref(),
            ToolKey::Bct => self.bct.as_ref(),
            ToolKey::Ssc => self.ssc.as_ref(),
        }
    }
}

/// The tools Grover knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKey {
    Z3,     // SMT solver
    Boogie, // Intermediate verification language verifier
    Corral, // Reachability analyzer built on Boogie
    Solc,   // Solidity compiler
    Bct,    // Bytecode-to-Boogie translator (invoked, never installed)
    Ssc,    // Spec# compiler (invoked, never installed)
}

pub const DEFAULT_Z3_VERSION: &str = "4.12.2";
pub const DEFAULT_SOLC_VERSION: &str = "0.8.21";
pub const SOLC_BINARIES_URL: &str = "https://binaries.soliditylang.org";

impl ToolKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolKey::Z3 => "z3",
            ToolKey::Boogie => "boogie",
            ToolKey::Corral => "corral",
            ToolKey::Solc => "solc",
            ToolKey::Bct => "bct",
            ToolKey::Ssc => "ssc",
        }
    }

    /// Built-in settings used when the settings file is missing or silent.
    pub fn defaults(self, platform: Platform, tools_root: &Path) -> ToolSourceSettings {
        let command_path = tools_root.join(self.as_str());
        match self {
            ToolKey::Z3 => ToolSourceSettings {
                name: "z3".to_string(),
                command_path,
                source_url: z3_release_url(DEFAULT_Z3_VERSION, platform, std::env::consts::ARCH),
                version: DEFAULT_Z3_VERSION.to_string(),
                package: None,
                sha256: None,
                version_arg: "--version".to_string(),
            },
            ToolKey::Boogie => ToolSourceSettings {
                name: "boogie".to_string(),
                command_path,
                source_url: String::new(),
                version: String::new(),
                package: Some("Boogie".to_string()),
                sha256: None,
                version_arg: "-version".to_string(),
            },
            ToolKey::Corral => ToolSourceSettings {
                name: "corral".to_string(),
                command_path,
                source_url: String::new(),
                version: String::new(),
                package: Some("Corral".to_string()),
                sha256: None,
                version_arg: "/version".to_string(),
            },
            ToolKey::Solc => ToolSourceSettings {
                name: "solc".to_string(),
                command_path,
                source_url: SOLC_BINARIES_URL.to_string(),
                version: DEFAULT_SOLC_VERSION.to_string(),
                package: None,
                sha256: None,
                version_arg: "--version".to_string(),
            },
            ToolKey::Bct => ToolSourceSettings {
                name: "BytecodeTranslator".to_string(),
                command_path,
                source_url: String::new(),
                version: String::new(),
                package: None,
                sha256: None,
                version_arg: "/help".to_string(),
            },
            ToolKey::Ssc => ToolSourceSettings {
                name: "ssc".to_string(),
                command_path,
                source_url: String::new(),
                version: String::new(),
                package: None,
                sha256: None,
                version_arg: "/help".to_string(),
            },
        }
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Download URL of an official Z3 release asset for the given platform.
pub fn z3_release_url(version: &str, platform: Platform, arch: &str) -> String {
    let arch = normalize_arch(arch);
    let asset = match (platform, arch.as_str()) {
        (Platform::Windows, _) => format!("z3-{version}-x64-win.zip"),
        (Platform::MacOs, "arm64") => format!("z3-{version}-arm64-osx-11.0.zip"),
        (Platform::MacOs, _) => format!("z3-{version}-x64-osx-11.7.10.zip"),
        (Platform::Linux, "arm64") => format!("z3-{version}-arm64-glibc-2.35.zip"),
        (Platform::Linux, _) => format!("z3-{version}-x64-glibc-2.31.zip"),
    };
    format!("https://github.com/Z3Prover/z3/releases/download/z3-{version}/{asset}")
}

impl ToolSourceSettings {
    /// Overlays the fields present in `section`. `CommandPath` is expanded.
    pub fn apply(&mut self, section: &ToolSourceSection) {
        if let Some(name) = &section.name {
            self.name = name.clone();
        }
        if let Some(path) = &section.command_path {
            self.command_path = expand_path(path);
        }
        if let Some(url) = &section.source_url {
            self.source_url = url.clone();
        }
        if let Some(version) = &section.version {
            self.version = version.clone();
        }
        if let Some(package) = &section.package {
            self.package = Some(package.clone());
        }
        if let Some(sha256) = &section.sha256 {
            self.sha256 = Some(sha256.clone());
        }
        if let Some(arg) = &section.version_arg {
            self.version_arg = arg.clone();
        }
    }

    /// Checks the invariants that must hold once settings are bound.
    pub fn validate(&self, key: ToolKey) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ToolError::InvalidSettings(format!("{key}: Name is empty")));
        }
        if self.command_path.as_os_str().is_empty() {
            return Err(ToolError::InvalidSettings(format!("{key}: CommandPath is empty")));
        }
        Ok(())
    }

    /// Package identifier used by package-manager installs.
    pub fn package_id(&self) -> &str {
        self.package.as_deref().unwrap_or(&self.name)
    }
}
