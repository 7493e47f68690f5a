//! # Assembly Metadata
//!
//! Reads the identity and reference list of a .NET assembly straight from its
//! ECMA-335 metadata, and resolves each reference to a file on disk.
//!
//! Resolution probes, in order, `<Name>.dll` and `<Name>.exe` in the assembly's own
//! directory, then the same names in each configured reference path. A found file's
//! identity is read as well; a file that cannot be read leaves the reference unresolved.

mod pe;
mod tables;

use crate::log_debug;
use colored::Colorize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a PE image: {0}")]
    NotPe(String),

    #[error("PE image has no CLR runtime header (not a .NET assembly)")]
    NotManaged,

    #[error("Malformed metadata: {0}")]
    Malformed(String),

    #[error("Truncated {0}")]
    Truncated(&'static str),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

/// Public key material attached to an assembly name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    None,
    /// The 8-byte token references normally carry.
    Token(Vec<u8>),
    /// A full public key (the defining assembly, or references flagged as such).
    Full(Vec<u8>),
}

impl PublicKey {
    fn from_blob(blob: &[u8], full: bool) -> Self {
        match (blob.is_empty(), full) {
            (true, _) => PublicKey::None,
            (false, true) => PublicKey::Full(blob.to_vec()),
            (false, false) => PublicKey::Token(blob.to_vec()),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyIdentity {
    pub name: String,
    pub version: [u16; 4],
    /// Empty for culture-neutral assemblies.
    pub culture: String,
    pub public_key: PublicKey,
}

impl AssemblyIdentity {
    pub fn version_string(&self) -> String {
        let [major, minor, build, revision] = self.version;
        format!("{major}.{minor}.{build}.{revision}")
    }

    pub fn culture_or_neutral(&self) -> &str {
        if self.culture.is_empty() { "neutral" } else { &self.culture }
    }

    pub fn public_key_token(&self) -> String {
        match &self.public_key {
            PublicKey::None => "null".to_string(),
            PublicKey::Token(token) => hex(token),
            PublicKey::Full(key) => format!("(full key, {} bytes)", key.len()),
        }
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}, Version={}, Culture={}, PublicKeyToken={}",
            self.name,
            self.version_string(),
            self.culture_or_neutral(),
            self.public_key_token()
        )
    }
}

/// A declared reference, what it resolved to, and where.
#[derive(Debug, Clone)]
pub struct AssemblyReference {
    pub reference: AssemblyIdentity,
    pub resolved: Option<AssemblyIdentity>,
    pub path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Assembly {
    pub path: PathBuf,
    pub identity: Option<AssemblyIdentity>,
    pub runtime_version: String,
    pub references: Vec<AssemblyReference>,
}

struct ParsedMetadata {
    identity: Option<AssemblyIdentity>,
    runtime_version: String,
    references: Vec<AssemblyIdentity>,
}

fn parse_metadata_root(root: &[u8]) -> Result<ParsedMetadata> {
    let root = tables::MetadataRoot::parse(root)?;
    Ok(ParsedMetadata {
        identity: root.assembly()?,
        runtime_version: root.runtime_version.clone(),
        references: root.assembly_refs()?,
    })
}

fn read_metadata(path: &Path) -> Result<ParsedMetadata> {
    let bytes = fs::read(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_metadata_root(pe::metadata_root(&bytes)?)
}

/// First existing `<name>.dll` or `<name>.exe` across `dirs`.
pub fn probe_reference(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| ["dll", "exe"].map(|ext| dir.join(format!("{name}.{ext}"))))
        .find(|candidate| candidate.is_file())
}

impl Assembly {
    /// Loads `path` and resolves its references against its own directory, then
    /// `reference_paths`.
    pub fn load(path: &Path, reference_paths: &[PathBuf]) -> Result<Assembly> {
        let metadata = read_metadata(path)?;

        let mut search_dirs = Vec::with_capacity(reference_paths.len() + 1);
        if let Some(dir) = path.parent() {
            let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
            search_dirs.push(dir.to_path_buf());
        }
        search_dirs.extend(reference_paths.iter().cloned());

        let references = metadata
            .references
            .into_iter()
            .map(|reference| resolve(reference, &search_dirs))
            .collect();

        Ok(Assembly {
            path: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
            identity: metadata.identity,
            runtime_version: metadata.runtime_version,
            references,
        })
    }
}

fn resolve(reference: AssemblyIdentity, search_dirs: &[PathBuf]) -> AssemblyReference {
    let path = probe_reference(&reference.name, search_dirs);
    let resolved = path.as_deref().and_then(|p| match read_metadata(p) {
        Ok(metadata) => metadata.identity,
        Err(e) => {
            log_debug!(
                "[Grover::Metadata] Could not read {} while resolving {}: {}",
                p.display(),
                reference.name.yellow(),
                e
            );
            None
        }
    });
    AssemblyReference {
        reference,
        resolved,
        path,
    }
}
