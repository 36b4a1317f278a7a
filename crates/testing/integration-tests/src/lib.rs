//! Test infrastructure for end-to-end generation tests.
//!
//! [`SourceTree`] lays out a scratch source tree the way the generator expects
//! to find it, and [`GeneratedSource`] picks the generated C apart so tests can
//! check which names each function handles and in what order.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::TempDir;

static RETURN_CASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"case (\w+): return "(\w+)";"#).expect("valid pattern"));

static APPEND_CASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"case (\w+): append\("#).expect("valid pattern"));

static TESTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"if \((\w+)\((?:type|alg_without_padding)\)\)").expect("valid pattern"));

static BIT_TEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"if \(usage & (\w+)\)").expect("valid pattern"));

static CONSTANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*define\s+(\w+)\s+\(\(\w+\)\s*(-?(?:0x[0-9A-Fa-f]+|\d+))\)").expect("valid pattern")
});

/// A scratch source tree with `include/psa/` and `programs/psa/`
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    /// Creates the directory layout and writes `header` as `include/psa/crypto.h`
    pub fn with_header(header: &str) -> Result<Self> {
        let dir = TempDir::new().context("Failed to create temporary directory")?;
        fs::create_dir_all(dir.path().join("include/psa")).context("Failed to create include/psa")?;
        fs::create_dir_all(dir.path().join("programs/psa")).context("Failed to create programs/psa")?;
        fs::create_dir_all(dir.path().join("scripts")).context("Failed to create scripts")?;
        fs::write(dir.path().join("include/psa/crypto.h"), header).context("Failed to write header")?;
        Ok(Self { dir })
    }

    /// Root of the tree
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `scripts/`, a sibling of `programs/`
    pub fn scripts_dir(&self) -> PathBuf {
        self.root().join("scripts")
    }

    /// Path of the header
    pub fn header_path(&self) -> PathBuf {
        self.root().join("include/psa/crypto.h")
    }

    /// Path the generated source lands at with the default configuration
    pub fn output_path(&self) -> PathBuf {
        self.root().join("programs/psa/psa_constant_names_generated.c")
    }

    /// Reads the generated source
    pub fn generated(&self) -> Result<GeneratedSource> {
        let text = fs::read_to_string(self.output_path()).context("Failed to read generated source")?;
        Ok(GeneratedSource::new(text))
    }

    /// Number of entries in `programs/psa/`
    pub fn output_dir_entries(&self) -> Result<usize> {
        Ok(fs::read_dir(self.root().join("programs/psa"))?.count())
    }
}

/// Generated C text with accessors for its functions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    text: String,
}

impl GeneratedSource {
    /// Wraps generated text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The whole text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Body of the function called `name`, from its signature to the closing brace
    pub fn function(&self, name: &str) -> Option<&str> {
        let signature = format!("{name}(");
        let start = self.text.find(&signature)?;
        let end = self.text[start..].find("\n}\n")? + start;
        Some(&self.text[start..end])
    }

    /// `(label, returned name)` pairs of a name-returning switch, in source order
    pub fn return_cases(&self, function: &str) -> Vec<(&str, &str)> {
        self.function(function)
            .map(|body| {
                RETURN_CASE_RE
                    .captures_iter(body)
                    .filter_map(|captures| {
                        Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Labels of the appending `case`s of a printing function, in source order
    pub fn append_cases(&self, function: &str) -> Vec<&str> {
        self.function(function)
            .map(|body| captured(&APPEND_CASE_RE, body))
            .unwrap_or_default()
    }

    /// Testers of the `if ... else` chain of a printing function, in source order
    pub fn testers(&self, function: &str) -> Vec<&str> {
        self.function(function)
            .map(|body| captured(&TESTER_RE, body))
            .unwrap_or_default()
    }

    /// Flags tested by `psa_snprint_key_usage`, in source order
    pub fn bit_tests(&self) -> Vec<&str> {
        self.function("psa_snprint_key_usage")
            .map(|body| captured(&BIT_TEST_RE, body))
            .unwrap_or_default()
    }

    /// Every macro name the generated code mentions in any `case`, tester or bit test
    pub fn mentioned_names(&self) -> Vec<&str> {
        let mut names = captured(&APPEND_CASE_RE, &self.text);
        names.extend(RETURN_CASE_RE.captures_iter(&self.text).filter_map(|captures| {
            captures.get(1).map(|label| label.as_str())
        }));
        names.extend(captured(&TESTER_RE, &self.text));
        names.extend(captured(&BIT_TEST_RE, &self.text));
        names
    }

    /// Simulates a name-returning switch for `value`.
    ///
    /// `constants` maps case labels to their numeric values. The first label
    /// with a matching value wins, as in C; `None` stands for `return NULL`.
    pub fn lookup(&self, function: &str, constants: &HashMap<String, i64>, value: i64) -> Option<&str> {
        self.return_cases(function)
            .into_iter()
            .find(|(label, _)| constants.get(*label) == Some(&value))
            .map(|(_, name)| name)
    }

    /// Simulates the bit tests of `psa_snprint_key_usage` for `usage`
    pub fn describe_usage(&self, constants: &HashMap<String, i64>, usage: i64) -> String {
        if usage == 0 {
            return "0".to_string();
        }
        let mut remaining = usage;
        let mut parts = Vec::new();
        for flag in self.bit_tests() {
            let Some(&bit) = constants.get(flag) else {
                continue;
            };
            if remaining & bit != 0 {
                parts.push(flag.to_string());
                remaining ^= bit;
            }
        }
        if remaining != 0 {
            parts.push(format!("0x{remaining:08x}"));
        }
        parts.join(" | ")
    }

    /// Simulates the tester chain of a printing function: the builder of the
    /// first tester `matches` accepts, or `None` for the hexadecimal fallback
    pub fn first_matching_builder(&self, function: &str, matches: impl Fn(&str) -> bool) -> Option<String> {
        self.testers(function)
            .into_iter()
            .find(|tester| matches(tester))
            .and_then(|tester| {
                let body = self.function(function)?;
                let start = body.find(&format!("if ({tester}("))?;
                let builder_start = body[start..].find('"')? + start + 1;
                let builder_end = body[builder_start..].find('"')? + builder_start;
                Some(body[builder_start..builder_end].to_string())
            })
    }
}

fn captured<'text>(pattern: &Regex, text: &'text str) -> Vec<&'text str> {
    pattern
        .captures_iter(text)
        .filter_map(|captures| captures.get(1).map(|name| name.as_str()))
        .collect()
}

/// Numeric values of `#define NAME ((type)VALUE)` lines
pub fn integer_constants(header: &str) -> HashMap<String, i64> {
    header
        .lines()
        .filter_map(|line| {
            let captures = CONSTANT_RE.captures(line)?;
            let name = captures.get(1)?.as_str().to_string();
            let literal = captures.get(2)?.as_str();
            let (negative, digits) = match literal.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, literal),
            };
            let magnitude = match digits.strip_prefix("0x") {
                Some(hex) => i64::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<i64>().ok()?,
            };
            Some((name, if negative { -magnitude } else { magnitude }))
        })
        .collect()
}
