//! Recognition of `#define` lines in C headers
//!
//! This is not a C preprocessor. Only object-like macros and function-like
//! macros taking exactly one parameter are recognized; any other line is
//! simply not applicable and yields `None`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// `#define`, a macro name, then either whitespace or a single parenthesized
/// parameter, then the rest of the line as the body.
#[allow(
    clippy::expect_used,
    reason = "the pattern is a literal and is covered by unit tests"
)]
static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*define\s+(\w+)(?:\s+|\((\w+)\)\s*)(.+)$")
        .expect("macro definition pattern is valid")
});

/// A `/* */` or `//` comment running to the end of the body.
///
/// A block comment may not contain `*/`, so a comment followed by more code
/// is never part of the match.
#[allow(
    clippy::expect_used,
    reason = "the pattern is a literal and is covered by unit tests"
)]
static TRAILING_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(?:/\*(?:[^*]|\*+[^*/])*\*+/|//.*)$")
        .expect("trailing comment pattern is valid")
});

/// A macro definition borrowed from one header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroDefinition<'line> {
    /// Macro name
    pub name: &'line str,
    /// Parameter name for single-parameter macros
    pub parameter: Option<&'line str>,
    /// Replacement text, without any trailing comment
    pub body: &'line str,
}

impl MacroDefinition<'_> {
    /// Whether this macro takes no parameter
    pub fn is_object_like(&self) -> bool {
        self.parameter.is_none()
    }

    /// Whether this macro takes exactly the given parameter
    pub fn has_parameter(&self, parameter: &str) -> bool {
        self.parameter == Some(parameter)
    }
}

impl fmt::Display for MacroDefinition<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parameter {
            Some(parameter) => write!(formatter, "#define {}({parameter}) {}", self.name, self.body),
            None => write!(formatter, "#define {} {}", self.name, self.body),
        }
    }
}

/// Parses one header line.
///
/// Returns `None` for blank lines, lines that are not macro definitions,
/// function-like macros with zero or several parameters, and definitions
/// with an empty body.
pub fn parse_line(line: &str) -> Option<MacroDefinition<'_>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let captures = DEFINITION_RE.captures(line)?;
    let name = captures.get(1)?.as_str();
    let parameter = captures.get(2).map(|parameter| parameter.as_str());
    let body = strip_trailing_comment(captures.get(3)?.as_str().trim_end());
    if body.is_empty() {
        return None;
    }
    Some(MacroDefinition {
        name,
        parameter,
        body,
    })
}

/// Drops a comment ending the body. A body that is nothing but a comment is
/// kept as is.
fn strip_trailing_comment(body: &str) -> &str {
    match TRAILING_COMMENT_RE.find(body) {
        Some(comment) if comment.start() > 0 => body[..comment.start()].trim_end(),
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_like_macro() {
        let definition = parse_line("#define PSA_SUCCESS ((psa_status_t)0)").unwrap();
        assert_eq!(definition.name, "PSA_SUCCESS");
        assert_eq!(definition.parameter, None);
        assert_eq!(definition.body, "((psa_status_t)0)");
        assert!(definition.is_object_like());
    }

    #[test]
    fn test_single_parameter_macro() {
        let definition =
            parse_line("#define PSA_KEY_TYPE_ECC_KEY_PAIR(curve) (PSA_KEY_TYPE_ECC_KEY_PAIR_BASE | (curve))")
                .unwrap();
        assert_eq!(definition.name, "PSA_KEY_TYPE_ECC_KEY_PAIR");
        assert_eq!(definition.parameter, Some("curve"));
        assert!(definition.has_parameter("curve"));
        assert_eq!(definition.body, "(PSA_KEY_TYPE_ECC_KEY_PAIR_BASE | (curve))");
    }

    #[test]
    fn test_parameter_without_space_before_body() {
        let definition = parse_line("#define PSA_ALG_HMAC(hash_alg)(PSA_ALG_HMAC_BASE)").unwrap();
        assert_eq!(definition.parameter, Some("hash_alg"));
        assert_eq!(definition.body, "(PSA_ALG_HMAC_BASE)");
    }

    #[test]
    fn test_leading_and_inner_whitespace() {
        let definition = parse_line("  #  define   PSA_ALG_SHA_256    ((psa_algorithm_t)0x01000009)").unwrap();
        assert_eq!(definition.name, "PSA_ALG_SHA_256");
        assert_eq!(definition.body, "((psa_algorithm_t)0x01000009)");
    }

    #[test]
    fn test_trailing_comments_are_dropped() {
        let block = parse_line("#define PSA_ERROR_BAD_STATE ((psa_status_t)-137) /**< bad state */").unwrap();
        assert_eq!(block.body, "((psa_status_t)-137)");

        let line = parse_line("#define PSA_KEY_USAGE_EXPORT ((psa_key_usage_t)0x00000001) // export").unwrap();
        assert_eq!(line.body, "((psa_key_usage_t)0x00000001)");
    }

    #[test]
    fn test_comment_only_body_is_kept() {
        let definition = parse_line("#define PSA_ALG_NONE /* nothing */").unwrap();
        assert_eq!(definition.body, "/* nothing */");
    }

    #[test]
    fn test_inner_comment_is_kept() {
        let definition = parse_line("#define PSA_ALG_SHA_1 ((psa_algorithm_t) /* SHA-1 */ 0x01000005)").unwrap();
        assert_eq!(definition.body, "((psa_algorithm_t) /* SHA-1 */ 0x01000005)");

        let both = parse_line("#define PSA_ALG_MD5 ((psa_algorithm_t) /* MD5 */ 0x01000003) /**< legacy */").unwrap();
        assert_eq!(both.body, "((psa_algorithm_t) /* MD5 */ 0x01000003)");

        let line = parse_line("#define PSA_ALG_SHA_224 ((psa_algorithm_t) /* 224 */ 0x01000008) // short").unwrap();
        assert_eq!(line.body, "((psa_algorithm_t) /* 224 */ 0x01000008)");
    }

    #[test]
    fn test_carriage_return_is_ignored() {
        let definition = parse_line("#define PSA_SUCCESS ((psa_status_t)0)\r").unwrap();
        assert_eq!(definition.body, "((psa_status_t)0)");
    }

    #[test]
    fn test_not_applicable_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("typedef int32_t psa_status_t;"), None);
        assert_eq!(parse_line("#include <stdint.h>"), None);
        assert_eq!(parse_line("#define PSA_CRYPTO_H"), None);
        assert_eq!(parse_line("#define PSA_ALG_TWO(a, b) ((a) | (b))"), None);
        assert_eq!(parse_line("#define PSA_ALG_NONE()"), None);
        assert_eq!(parse_line("// #define PSA_SUCCESS 0"), None);
    }

    #[test]
    fn test_display_round_trips_shape() {
        let definition = parse_line("#define PSA_ALG_HMAC(hash_alg) (PSA_ALG_HMAC_BASE | (hash_alg))").unwrap();
        assert_eq!(
            definition.to_string(),
            "#define PSA_ALG_HMAC(hash_alg) (PSA_ALG_HMAC_BASE | (hash_alg))"
        );
    }
}
