//! Ordered classification rules for PSA macro names
//!
//! Classification never evaluates a macro. It looks at the name, whether the
//! macro takes a parameter, and for hash algorithms the shape of the
//! hexadecimal literal in the body. Rules are tried in order and the first
//! match wins.

use pcn_macro::MacroDefinition;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Name of the success status, the only status without the error prefix
pub const SUCCESS_STATUS: &str = "PSA_SUCCESS";

/// Algorithm base values that share their numeric value with another name.
///
/// Emitting them would produce duplicate `case` labels.
pub const DUPLICATE_ALGORITHM_BASES: [&str; 3] = [
    "PSA_ALG_BLOCK_CIPHER_BASE",
    "PSA_ALG_ECDSA_BASE",
    "PSA_ALG_RSA_PKCS1V15_SIGN_BASE",
];

/// Hash-parameterized algorithms whose tester is `PSA_ALG_IS_RANDOMIZED_*`
/// rather than `PSA_ALG_IS_*`.
pub const RANDOMIZED_TESTER_ALGORITHMS: [&str; 2] = ["PSA_ALG_DSA", "PSA_ALG_ECDSA"];

const ERROR_PREFIX: &str = "PSA_ERROR_";
const KEY_TYPE_PREFIX: &str = "PSA_KEY_TYPE_";
const ECC_CURVE_PREFIX: &str = "PSA_ECC_CURVE_";
const PADDING_MODE_PREFIX: &str = "PSA_ALG_BLOCK_CIPHER_PAD_";
const ALGORITHM_PREFIX: &str = "PSA_ALG_";
const KEY_USAGE_PREFIX: &str = "PSA_KEY_USAGE_";

/// A hash algorithm encodes its one-byte identifier in the low byte of
/// `0x010000__`.
#[allow(
    clippy::expect_used,
    reason = "the pattern is a literal and is covered by unit tests"
)]
static HASH_ALGORITHM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0x010000[0-9A-Fa-f]{2}").expect("hash algorithm pattern is valid"));

/// Destination bucket of a classified macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// `psa_status_t` values
    Status,
    /// Simple `psa_key_type_t` values
    KeyType,
    /// Key types built from an elliptic curve
    KeyTypeFromCurve,
    /// `psa_ecc_curve_t` values
    EccCurve,
    /// Simple `psa_algorithm_t` values
    Algorithm,
    /// Algorithms that identify a hash
    HashAlgorithm,
    /// Block cipher padding modes
    PaddingMode,
    /// Algorithms built from a hash
    AlgorithmFromHash,
    /// `psa_key_usage_t` bit flags
    KeyUsage,
}

impl Category {
    /// All categories, in template order
    pub const ALL: [Self; 9] = [
        Self::Status,
        Self::KeyType,
        Self::KeyTypeFromCurve,
        Self::EccCurve,
        Self::Algorithm,
        Self::HashAlgorithm,
        Self::PaddingMode,
        Self::AlgorithmFromHash,
        Self::KeyUsage,
    ];

    /// Short name used in logs and reports
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::KeyType => "key type",
            Self::KeyTypeFromCurve => "key type from curve",
            Self::EccCurve => "ecc curve",
            Self::Algorithm => "algorithm",
            Self::HashAlgorithm => "hash algorithm",
            Self::PaddingMode => "padding mode",
            Self::AlgorithmFromHash => "algorithm from hash",
            Self::KeyUsage => "key usage",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Outcome of the rule chain for one macro
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Status code
    Status,
    /// Simple key type
    KeyType,
    /// Key type parameterized by `curve`
    KeyTypeFromCurve {
        /// Name of the `PSA_KEY_TYPE_IS_*` tester
        tester: String,
    },
    /// Elliptic curve
    EccCurve,
    /// Block cipher padding mode
    PaddingMode,
    /// Simple algorithm
    Algorithm {
        /// Whether the value also identifies a hash
        hash: bool,
    },
    /// Algorithm parameterized by `hash_alg`
    AlgorithmFromHash {
        /// Name of the `PSA_ALG_IS_*` tester
        tester: String,
    },
    /// Key usage flag
    KeyUsage,
}

impl Classification {
    /// Primary category, the one that decides exclusivity
    pub const fn category(&self) -> Category {
        match self {
            Self::Status => Category::Status,
            Self::KeyType => Category::KeyType,
            Self::KeyTypeFromCurve { .. } => Category::KeyTypeFromCurve,
            Self::EccCurve => Category::EccCurve,
            Self::PaddingMode => Category::PaddingMode,
            Self::Algorithm { .. } => Category::Algorithm,
            Self::AlgorithmFromHash { .. } => Category::AlgorithmFromHash,
            Self::KeyUsage => Category::KeyUsage,
        }
    }
}

/// Whether a name only exists to build other values
pub fn is_helper_name(name: &str) -> bool {
    name.ends_with("_FLAG") || name.contains("MASK")
}

/// Runs the ordered rule chain over a macro definition.
///
/// Returns `None` for helper macros, the duplicate algorithm bases and any
/// name that no rule claims.
pub fn classify(definition: &MacroDefinition<'_>) -> Option<Classification> {
    let name = definition.name;
    let object_like = definition.is_object_like();

    if is_helper_name(name) {
        return None;
    }

    if (name.starts_with(ERROR_PREFIX) || name == SUCCESS_STATUS) && object_like {
        return Some(Classification::Status);
    }

    if let Some(rest) = name.strip_prefix(KEY_TYPE_PREFIX) {
        if object_like {
            return Some(Classification::KeyType);
        }
        if definition.has_parameter("curve") {
            return Some(Classification::KeyTypeFromCurve {
                tester: format!("{KEY_TYPE_PREFIX}IS_{rest}"),
            });
        }
    }

    if name.starts_with(ECC_CURVE_PREFIX) && object_like {
        return Some(Classification::EccCurve);
    }

    if name.starts_with(PADDING_MODE_PREFIX) && object_like {
        return Some(Classification::PaddingMode);
    }

    if let Some(rest) = name.strip_prefix(ALGORITHM_PREFIX) {
        if object_like {
            if DUPLICATE_ALGORITHM_BASES.contains(&name) {
                return None;
            }
            return Some(Classification::Algorithm {
                hash: HASH_ALGORITHM_RE.is_match(definition.body),
            });
        }
        if definition.has_parameter("hash_alg") {
            let infix = if RANDOMIZED_TESTER_ALGORITHMS.contains(&name) {
                "IS_RANDOMIZED_"
            } else {
                "IS_"
            };
            return Some(Classification::AlgorithmFromHash {
                tester: format!("{ALGORITHM_PREFIX}{infix}{rest}"),
            });
        }
    }

    if name.starts_with(KEY_USAGE_PREFIX) && object_like {
        return Some(Classification::KeyUsage);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcn_macro::parse_line;

    fn classify_line(line: &str) -> Option<Classification> {
        let definition = parse_line(line).expect("line should be a macro definition");
        classify(&definition)
    }

    #[test]
    fn test_statuses() {
        assert_eq!(
            classify_line("#define PSA_SUCCESS ((psa_status_t)0)"),
            Some(Classification::Status)
        );
        assert_eq!(
            classify_line("#define PSA_ERROR_BAD_STATE ((psa_status_t)-137)"),
            Some(Classification::Status)
        );
        assert_eq!(classify_line("#define PSA_ERROR_CODE(x) ((psa_status_t)(x))"), None);
    }

    #[test]
    fn test_key_types() {
        assert_eq!(
            classify_line("#define PSA_KEY_TYPE_AES ((psa_key_type_t)0x40000001)"),
            Some(Classification::KeyType)
        );
        assert_eq!(
            classify_line("#define PSA_KEY_TYPE_ECC_KEY_PAIR(curve) (PSA_KEY_TYPE_ECC_KEY_PAIR_BASE | (curve))"),
            Some(Classification::KeyTypeFromCurve {
                tester: "PSA_KEY_TYPE_IS_ECC_KEY_PAIR".to_string()
            })
        );
        assert_eq!(classify_line("#define PSA_KEY_TYPE_IS_ECC(type) (type)"), None);
    }

    #[test]
    fn test_curves_and_usages() {
        assert_eq!(
            classify_line("#define PSA_ECC_CURVE_SECP256R1 ((psa_ecc_curve_t) 0x0017)"),
            Some(Classification::EccCurve)
        );
        assert_eq!(
            classify_line("#define PSA_KEY_USAGE_SIGN ((psa_key_usage_t)0x00000400)"),
            Some(Classification::KeyUsage)
        );
    }

    #[test]
    fn test_padding_mode_wins_over_algorithm() {
        assert_eq!(
            classify_line("#define PSA_ALG_BLOCK_CIPHER_PAD_PKCS7 ((psa_algorithm_t)0x00000001)"),
            Some(Classification::PaddingMode)
        );
    }

    #[test]
    fn test_helper_names_are_discarded() {
        assert_eq!(
            classify_line("#define PSA_ALG_BLOCK_CIPHER_PADDING_MASK ((psa_algorithm_t)0x003f0000)"),
            None
        );
        assert_eq!(classify_line("#define PSA_ALG_MASK_CATEGORY ((psa_algorithm_t)0x7f000000)"), None);
        assert_eq!(classify_line("#define PSA_KEY_TYPE_VENDOR_FLAG ((psa_key_type_t)0x80000000)"), None);
        assert_eq!(classify_line("#define PSA_ERROR_MASKED ((psa_status_t)-1)"), None);
    }

    #[test]
    fn test_duplicate_algorithm_bases_are_discarded() {
        for name in DUPLICATE_ALGORITHM_BASES {
            let line = format!("#define {name} ((psa_algorithm_t)0x10020000)");
            assert_eq!(classify_line(&line), None, "{name} should be discarded");
        }
    }

    #[test]
    fn test_hash_algorithm_detection() {
        assert_eq!(
            classify_line("#define PSA_ALG_SHA_256 ((psa_algorithm_t)0x01000055)"),
            Some(Classification::Algorithm { hash: true })
        );
        assert_eq!(
            classify_line("#define PSA_ALG_MD5 ((psa_algorithm_t)0x010000aB)"),
            Some(Classification::Algorithm { hash: true })
        );
        assert_eq!(
            classify_line("#define PSA_ALG_CBC_MAC ((psa_algorithm_t)0x02000055)"),
            Some(Classification::Algorithm { hash: false })
        );
    }

    #[test]
    fn test_hash_detection_around_comments() {
        assert_eq!(
            classify_line("#define PSA_ALG_SHA_1 ((psa_algorithm_t) /* SHA-1 */ 0x01000005)"),
            Some(Classification::Algorithm { hash: true })
        );
        assert_eq!(
            classify_line("#define PSA_ALG_SHA_512 ((psa_algorithm_t)0x0100000d) /**< SHA-512 */"),
            Some(Classification::Algorithm { hash: true })
        );
        assert_eq!(
            classify_line("#define PSA_ALG_CMAC ((psa_algorithm_t)0x03c00200) /* not 0x01000005 */"),
            Some(Classification::Algorithm { hash: false })
        );
    }

    #[test]
    fn test_algorithms_from_hash() {
        assert_eq!(
            classify_line("#define PSA_ALG_HMAC(hash_alg) (PSA_ALG_HMAC_BASE | ((hash_alg) & PSA_ALG_HASH_MASK))"),
            Some(Classification::AlgorithmFromHash {
                tester: "PSA_ALG_IS_HMAC".to_string()
            })
        );
        assert_eq!(
            classify_line("#define PSA_ALG_ECDSA(hash_alg) (PSA_ALG_ECDSA_BASE | ((hash_alg) & 0xff))"),
            Some(Classification::AlgorithmFromHash {
                tester: "PSA_ALG_IS_RANDOMIZED_ECDSA".to_string()
            })
        );
        assert_eq!(
            classify_line("#define PSA_ALG_DSA(hash_alg) (PSA_ALG_DSA_BASE | ((hash_alg) & 0xff))"),
            Some(Classification::AlgorithmFromHash {
                tester: "PSA_ALG_IS_RANDOMIZED_DSA".to_string()
            })
        );
        assert_eq!(classify_line("#define PSA_ALG_IS_HMAC(alg) (alg)"), None);
    }

    #[test]
    fn test_unknown_prefixes_are_discarded() {
        assert_eq!(classify_line("#define PSA_CRYPTO_API_VERSION_MAJOR 1"), None);
        assert_eq!(classify_line("#define MBEDTLS_ERROR_FOO -1"), None);
    }

    #[test]
    fn test_classification_category() {
        assert_eq!(Classification::Algorithm { hash: true }.category(), Category::Algorithm);
        assert_eq!(
            Classification::KeyTypeFromCurve { tester: String::new() }.category(),
            Category::KeyTypeFromCurve
        );
        assert_eq!(Category::HashAlgorithm.to_string(), "hash algorithm");
    }
}
