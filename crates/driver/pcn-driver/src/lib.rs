//! Generation driver
//!
//! Wires the pipeline together: read the header, classify its macros, render
//! the C source, and publish it atomically so that a partially written file
//! is never observed at the output path.

pub mod config;
pub mod error;

pub use config::{GeneratorConfig, locate_root};
pub use error::GenerateError;

use pcn_collect::{Category, MacroCollector};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Summary of a successful generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Path the generated source was written to
    pub output: PathBuf,
    /// Number of names per category, in [`Category::ALL`] order
    pub counts: Vec<(Category, usize)>,
    /// Size of the generated source in bytes
    pub bytes_written: usize,
}

impl GenerationReport {
    /// Number of names recorded under `category`
    pub fn count(&self, category: Category) -> usize {
        self.counts
            .iter()
            .find(|(counted, _)| *counted == category)
            .map_or(0, |(_, count)| *count)
    }
}

/// Reads and classifies every line of the header at `path`
///
/// # Errors
///
/// Returns an error if the header cannot be opened or read
pub fn collect_header(path: &Path) -> Result<MacroCollector, GenerateError> {
    let read_error = |source: io::Error| GenerateError::ReadHeader {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_error)?;
    let mut collector = MacroCollector::new();
    let recorded = collector
        .read_header(BufReader::new(file))
        .map_err(read_error)?;
    tracing::debug!(header = %path.display(), recorded, "collected header");
    if collector.is_empty() {
        tracing::warn!(header = %path.display(), "no PSA constants recognized in header");
    }
    Ok(collector)
}

/// Writes `contents` to `path` through a temporary file in the same directory.
///
/// The temporary file is renamed over `path` only once it is complete. On
/// failure it is removed and `path` is left as it was.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or renamed
pub fn write_atomically(path: &Path, contents: &str) -> Result<(), GenerateError> {
    let write_error = |source: io::Error| GenerateError::WriteOutput {
        path: path.to_path_buf(),
        source,
    };
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(directory).map_err(write_error)?;
    temp.write_all(contents.as_bytes()).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|error| GenerateError::PromoteOutput {
        path: path.to_path_buf(),
        source: error.error,
    })?;
    Ok(())
}

/// Generates the constant-name source for `header` into `output`
///
/// # Errors
///
/// Returns an error if the header cannot be read or the output cannot be written
pub fn generate_psa_constants(header: &Path, output: &Path) -> Result<GenerationReport, GenerateError> {
    let collector = collect_header(header)?;
    let source = pcn_emit::render(&collector)?;
    write_atomically(output, &source)?;

    let counts: Vec<(Category, usize)> = Category::ALL
        .into_iter()
        .map(|category| (category, collector.count(category)))
        .collect();
    tracing::info!(
        output = %output.display(),
        bytes = source.len(),
        statuses = collector.count(Category::Status),
        algorithms = collector.count(Category::Algorithm),
        key_types = collector.count(Category::KeyType),
        "wrote generated source"
    );

    Ok(GenerationReport {
        output: output.to_path_buf(),
        counts,
        bytes_written: source.len(),
    })
}

/// Runs a configured generation from `start`, locating the tree root first
///
/// # Errors
///
/// Returns an error if the header cannot be read or the output cannot be written
pub fn run(config: &GeneratorConfig, start: &Path) -> Result<GenerationReport, GenerateError> {
    let root = locate_root(start, &config.marker_dir);
    tracing::debug!(root = %root.display(), "resolved source tree root");
    generate_psa_constants(&config.header_path(&root), &config.output_path(&root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomically_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.c");
        fs::write(&path, "old").unwrap();

        write_atomically(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary file should not remain");
    }

    #[test]
    fn test_write_atomically_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.c");
        let error = write_atomically(&path, "text").unwrap_err();
        assert!(matches!(error, GenerateError::WriteOutput { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_header() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.c");
        let error = generate_psa_constants(&dir.path().join("absent.h"), &output).unwrap_err();
        assert!(matches!(error, GenerateError::ReadHeader { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_collect_header_without_constants() {
        let dir = TempDir::new().unwrap();
        let header = dir.path().join("empty.h");
        fs::write(&header, "#ifndef EMPTY_H\n#define EMPTY_H\n#define PSA_SUCCESS_FLAG 1\n#endif\n").unwrap();

        let collector = collect_header(&header).unwrap();

        assert!(collector.is_empty());
    }

    #[test]
    fn test_report_counts() {
        let dir = TempDir::new().unwrap();
        let header = dir.path().join("crypto.h");
        fs::write(
            &header,
            "#define PSA_SUCCESS ((psa_status_t)0)\n#define PSA_ALG_SHA_1 ((psa_algorithm_t)0x01000005)\n",
        )
        .unwrap();
        let output = dir.path().join("out.c");

        let report = generate_psa_constants(&header, &output).unwrap();

        assert_eq!(report.count(Category::Status), 1);
        assert_eq!(report.count(Category::Algorithm), 1);
        assert_eq!(report.count(Category::HashAlgorithm), 1);
        assert_eq!(report.count(Category::KeyUsage), 0);
        assert_eq!(report.counts.len(), Category::ALL.len());
        assert_eq!(report.bytes_written, fs::read(&output).unwrap().len());
    }
}
