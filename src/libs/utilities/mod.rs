// This is the main module file for the `utilities` directory.
// It declares the helpers shared by every tool installer.

// Fetching sources and checking their digests.
pub mod assets;
// Locating, moving and linking executables.
pub mod binary;
// Unpacking release archives.
pub mod compression;
// Expanding configured paths and the default tools root.
pub mod path_helpers;
// Host OS and architecture detection.
pub mod platform;
