//! Collection of PSA constant names from a C header
//!
//! The collector streams header lines through the macro parser and the
//! classification rules, keeping one bucket per category. Buckets are
//! unordered; every accessor returns a view sorted by macro name so that
//! rendering is reproducible.

pub mod classify;

pub use classify::{
    Category, Classification, DUPLICATE_ALGORITHM_BASES, RANDOMIZED_TESTER_ALGORITHMS,
    SUCCESS_STATUS, classify, is_helper_name,
};

use pcn_macro::parse_line;
use rustc_hash::{FxHashMap, FxHashSet};
use std::io::{self, BufRead};

/// A parameterized macro paired with the tester that recognizes its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedMacro<'a> {
    /// Name of the parameterized macro, printed before the decoded parameter
    pub builder: &'a str,
    /// Name of the predicate macro
    pub tester: &'a str,
}

/// Classified macro names read from a header
#[derive(Debug, Clone, Default)]
pub struct MacroCollector {
    statuses: FxHashSet<String>,
    key_types: FxHashSet<String>,
    key_types_from_curve: FxHashMap<String, String>,
    ecc_curves: FxHashSet<String>,
    algorithms: FxHashSet<String>,
    hash_algorithms: FxHashSet<String>,
    block_cipher_padding_modes: FxHashSet<String>,
    algorithms_from_hash: FxHashMap<String, String>,
    key_usages: FxHashSet<String>,
}

impl MacroCollector {
    /// Creates an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one header line.
    ///
    /// Returns the category the line was recorded under, or `None` if the
    /// line is not a macro definition or the macro is not of interest.
    pub fn read_line(&mut self, line: &str) -> Option<Category> {
        let definition = parse_line(line)?;
        let Some(classification) = classify(&definition) else {
            tracing::trace!(%definition, "discarded macro");
            return None;
        };
        let category = classification.category();
        tracing::trace!(name = definition.name, %category, "classified macro");
        self.record(definition.name, classification);
        Some(category)
    }

    /// Reads a sequence of lines, returning how many were recorded
    pub fn read_lines<I, S>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter(|line| self.read_line(line.as_ref()).is_some())
            .count()
    }

    /// Reads a whole header, returning how many lines were recorded.
    ///
    /// Lines that are not valid UTF-8 are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from `reader` fails
    pub fn read_header<R: BufRead>(&mut self, reader: R) -> io::Result<usize> {
        let mut recorded = 0;
        for (index, bytes) in reader.split(b'\n').enumerate() {
            let Ok(line) = String::from_utf8(bytes?) else {
                tracing::debug!(line = index + 1, "skipping line that is not valid UTF-8");
                continue;
            };
            if self.read_line(&line).is_some() {
                recorded += 1;
            }
        }
        Ok(recorded)
    }

    /// Records a classified name in its bucket
    pub fn record(&mut self, name: &str, classification: Classification) {
        let name = name.to_string();
        match classification {
            Classification::Status => {
                self.statuses.insert(name);
            }
            Classification::KeyType => {
                self.key_types.insert(name);
            }
            Classification::KeyTypeFromCurve { tester } => {
                self.key_types_from_curve.insert(name, tester);
            }
            Classification::EccCurve => {
                self.ecc_curves.insert(name);
            }
            Classification::PaddingMode => {
                self.block_cipher_padding_modes.insert(name);
            }
            Classification::Algorithm { hash } => {
                if hash {
                    self.hash_algorithms.insert(name.clone());
                }
                self.algorithms.insert(name);
            }
            Classification::AlgorithmFromHash { tester } => {
                self.algorithms_from_hash.insert(name, tester);
            }
            Classification::KeyUsage => {
                self.key_usages.insert(name);
            }
        }
    }

    /// Whether `name` was recorded under `category`
    pub fn contains(&self, category: Category, name: &str) -> bool {
        match category {
            Category::KeyTypeFromCurve => self.key_types_from_curve.contains_key(name),
            Category::AlgorithmFromHash => self.algorithms_from_hash.contains_key(name),
            _ => self.names(category).is_some_and(|names| names.contains(name)),
        }
    }

    /// Number of names recorded under `category`
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::KeyTypeFromCurve => self.key_types_from_curve.len(),
            Category::AlgorithmFromHash => self.algorithms_from_hash.len(),
            _ => self.names(category).map_or(0, |names| names.len()),
        }
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|&category| self.count(category) == 0)
    }

    /// Sorted names of a simple category.
    ///
    /// Derived categories yield their builder names.
    pub fn sorted(&self, category: Category) -> Vec<&str> {
        match category {
            Category::KeyTypeFromCurve => sorted_keys(&self.key_types_from_curve),
            Category::AlgorithmFromHash => sorted_keys(&self.algorithms_from_hash),
            _ => self.names(category).map(sorted_names).unwrap_or_default(),
        }
    }

    /// Status names, sorted
    pub fn statuses(&self) -> Vec<&str> {
        sorted_names(&self.statuses)
    }

    /// Simple key type names, sorted
    pub fn key_types(&self) -> Vec<&str> {
        sorted_names(&self.key_types)
    }

    /// Curve-parameterized key types, sorted by builder name
    pub fn key_types_from_curve(&self) -> Vec<DerivedMacro<'_>> {
        sorted_derived(&self.key_types_from_curve)
    }

    /// Elliptic curve names, sorted
    pub fn ecc_curves(&self) -> Vec<&str> {
        sorted_names(&self.ecc_curves)
    }

    /// Simple algorithm names, sorted
    pub fn algorithms(&self) -> Vec<&str> {
        sorted_names(&self.algorithms)
    }

    /// Hash algorithm names, sorted
    pub fn hash_algorithms(&self) -> Vec<&str> {
        sorted_names(&self.hash_algorithms)
    }

    /// Block cipher padding mode names, sorted
    pub fn block_cipher_padding_modes(&self) -> Vec<&str> {
        sorted_names(&self.block_cipher_padding_modes)
    }

    /// Hash-parameterized algorithms, sorted by builder name
    pub fn algorithms_from_hash(&self) -> Vec<DerivedMacro<'_>> {
        sorted_derived(&self.algorithms_from_hash)
    }

    /// Key usage flag names, sorted
    pub fn key_usages(&self) -> Vec<&str> {
        sorted_names(&self.key_usages)
    }

    fn names(&self, category: Category) -> Option<&FxHashSet<String>> {
        match category {
            Category::Status => Some(&self.statuses),
            Category::KeyType => Some(&self.key_types),
            Category::EccCurve => Some(&self.ecc_curves),
            Category::Algorithm => Some(&self.algorithms),
            Category::HashAlgorithm => Some(&self.hash_algorithms),
            Category::PaddingMode => Some(&self.block_cipher_padding_modes),
            Category::KeyUsage => Some(&self.key_usages),
            Category::KeyTypeFromCurve | Category::AlgorithmFromHash => None,
        }
    }
}

fn sorted_names(names: &FxHashSet<String>) -> Vec<&str> {
    let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted
}

fn sorted_keys(derived: &FxHashMap<String, String>) -> Vec<&str> {
    let mut sorted: Vec<&str> = derived.keys().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted
}

fn sorted_derived(derived: &FxHashMap<String, String>) -> Vec<DerivedMacro<'_>> {
    let mut sorted: Vec<DerivedMacro<'_>> = derived
        .iter()
        .map(|(builder, tester)| DerivedMacro {
            builder,
            tester,
        })
        .collect();
    sorted.sort_unstable_by_key(|derived| derived.builder);
    sorted
}
