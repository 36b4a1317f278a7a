//! Generator configuration
//!
//! All fields are optional in the TOML file; missing ones fall back to the
//! layout of an Mbed TLS style source tree.

use crate::GenerateError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where to read the header and write the generated source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Header declaring the PSA constants
    pub header: PathBuf,

    /// Generated C source
    pub output: PathBuf,

    /// Directory whose presence identifies the source tree root
    #[serde(rename = "marker-dir")]
    pub marker_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            header: PathBuf::from("include/psa/crypto.h"),
            output: PathBuf::from("programs/psa/psa_constant_names_generated.c"),
            marker_dir: PathBuf::from("programs"),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, GenerateError> {
        let contents = std::fs::read_to_string(path).map_err(|source| GenerateError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| GenerateError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Header path resolved against `root`
    pub fn header_path(&self, root: &Path) -> PathBuf {
        root.join(&self.header)
    }

    /// Output path resolved against `root`
    pub fn output_path(&self, root: &Path) -> PathBuf {
        root.join(&self.output)
    }
}

/// Finds the source tree root starting from `start`.
///
/// The generator may be launched from the tree root or from one of its
/// immediate subdirectories. If `marker_dir` is missing under `start` but
/// present under its parent, the parent is the root.
pub fn locate_root(start: &Path, marker_dir: &Path) -> PathBuf {
    if start.join(marker_dir).is_dir() {
        return start.to_path_buf();
    }
    let parent = start.join("..");
    if parent.join(marker_dir).is_dir() {
        return parent;
    }
    start.to_path_buf()
}
