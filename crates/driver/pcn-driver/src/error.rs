//! Generation errors
//!
//! Only I/O and configuration problems are errors. Header lines the collector
//! cannot use are skipped without a diagnostic.

use pcn_emit::EmitError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a generation run
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The header could not be opened or read
    #[error("failed to read header {}", path.display())]
    ReadHeader {
        /// Header path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The temporary output file could not be created or written
    #[error("failed to write generated source next to {}", path.display())]
    WriteOutput {
        /// Final output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The finished temporary file could not be renamed into place
    #[error("failed to move generated source into {}", path.display())]
    PromoteOutput {
        /// Final output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The configuration file could not be read
    #[error("failed to read config file {}", path.display())]
    ReadConfig {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`GeneratorConfig`](crate::GeneratorConfig)
    #[error("failed to parse config file {}", path.display())]
    ParseConfig {
        /// Config file path
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// The output template could not be assembled
    #[error(transparent)]
    Emit(#[from] EmitError),
}
