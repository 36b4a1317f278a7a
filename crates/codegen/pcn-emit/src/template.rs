//! The fixed C skeleton the fragments are substituted into
//!
//! Placeholders have the form `%(slot)s`. Substitution is a single left to
//! right pass, so text inserted for one slot is never scanned again.

use crate::EmitError;
use std::fmt;

const SLOT_OPEN: &str = "%(";
const SLOT_CLOSE: &str = ")s";

/// Named insertion points of [`OUTPUT_TEMPLATE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// `case` labels of `psa_strerror`
    StatusCases,
    /// `case` labels of `psa_ecc_curve_name`
    EccCurveCases,
    /// `case` labels of `psa_hash_algorithm_name`
    HashAlgorithmCases,
    /// `case` labels of `psa_snprint_key_type`
    KeyTypeCases,
    /// Tester chain in the `default` branch of `psa_snprint_key_type`
    KeyTypeCode,
    /// `case` labels of `append_padding_mode`
    PaddingModeCases,
    /// `case` labels of `psa_snprint_algorithm`
    AlgorithmCases,
    /// Tester chain in the `default` branch of `psa_snprint_algorithm`
    AlgorithmCode,
    /// Bit tests of `psa_snprint_key_usage`
    KeyUsageCode,
}

impl Slot {
    /// Every slot, in the order they appear in the template
    pub const ALL: [Self; 9] = [
        Self::StatusCases,
        Self::EccCurveCases,
        Self::HashAlgorithmCases,
        Self::KeyTypeCases,
        Self::KeyTypeCode,
        Self::PaddingModeCases,
        Self::AlgorithmCases,
        Self::AlgorithmCode,
        Self::KeyUsageCode,
    ];

    /// Placeholder name inside `%(...)s`
    pub const fn name(self) -> &'static str {
        match self {
            Self::StatusCases => "status_cases",
            Self::EccCurveCases => "ecc_curve_cases",
            Self::HashAlgorithmCases => "hash_algorithm_cases",
            Self::KeyTypeCases => "key_type_cases",
            Self::KeyTypeCode => "key_type_code",
            Self::PaddingModeCases => "padding_mode_cases",
            Self::AlgorithmCases => "algorithm_cases",
            Self::AlgorithmCode => "algorithm_code",
            Self::KeyUsageCode => "key_usage_code",
        }
    }

    /// Looks a slot up by placeholder name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.name() == name)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{SLOT_OPEN}{}{SLOT_CLOSE}", self.name())
    }
}

/// Substitutes every placeholder of `template` with the text `lookup` returns.
///
/// # Errors
///
/// Returns an error if a placeholder is not closed or `lookup` does not know
/// its name
pub fn fill<'text, F>(template: &str, lookup: F) -> Result<String, EmitError>
where
    F: Fn(&str) -> Option<&'text str>,
{
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find(SLOT_OPEN) {
        output.push_str(&rest[..start]);
        let offset = template.len() - rest.len() + start;
        let inner = &rest[start + SLOT_OPEN.len()..];
        let end = inner
            .find(SLOT_CLOSE)
            .ok_or(EmitError::UnterminatedSlot { offset })?;
        let name = &inner[..end];
        let value = lookup(name).ok_or_else(|| EmitError::UnknownSlot {
            name: name.to_string(),
        })?;
        output.push_str(value);
        rest = &inner[end + SLOT_CLOSE.len()..];
    }
    output.push_str(rest);
    Ok(output)
}

/// Skeleton of the generated C source
pub const OUTPUT_TEMPLATE: &str = r#"/* Automatically generated by psa-constgen. DO NOT EDIT. */

static const char *psa_strerror(psa_status_t status)
{
    switch (status) {
    %(status_cases)s
    default: return NULL;
    }
}

static const char *psa_ecc_curve_name(psa_ecc_curve_t curve)
{
    switch (curve) {
    %(ecc_curve_cases)s
    default: return NULL;
    }
}

static const char *psa_hash_algorithm_name(psa_algorithm_t hash_alg)
{
    switch (hash_alg) {
    %(hash_algorithm_cases)s
    default: return NULL;
    }
}

static int psa_snprint_key_type(char *buffer, size_t buffer_size,
                                psa_key_type_t type)
{
    size_t required_size = 0;
    switch (type) {
    %(key_type_cases)s
    default:
        %(key_type_code)s{
            return snprintf(buffer, buffer_size,
                            "0x%08lx", (unsigned long) type);
        }
        break;
    }
    buffer[0] = 0;
    return required_size;
}

static void append_padding_mode(char **buffer, size_t buffer_size,
                                size_t *required_size,
                                psa_algorithm_t padding_mode)
{
    size_t n;
    append(buffer, buffer_size, required_size, " | ", 3);
    switch (padding_mode) {
    %(padding_mode_cases)s
    default:
        n = snprintf(*buffer, buffer_size - *required_size,
                     "0x%08lx", (unsigned long) padding_mode);
        if (n < buffer_size - *required_size) *buffer += n;
        *required_size += n;
        break;
    }
}

static int psa_snprint_algorithm(char *buffer, size_t buffer_size,
                                 psa_algorithm_t alg)
{
    size_t required_size = 0;
    psa_algorithm_t padding_mode = -1;
    psa_algorithm_t alg_without_padding = alg;
    if (PSA_ALG_IS_CIPHER(alg) && PSA_ALG_IS_BLOCK_CIPHER(alg)) {
            padding_mode = alg & PSA_ALG_BLOCK_CIPHER_PADDING_MASK;
            alg_without_padding = alg & ~PSA_ALG_BLOCK_CIPHER_PADDING_MASK;
    }
    switch (alg_without_padding) {
    %(algorithm_cases)s
    default:
        %(algorithm_code)s{
            return snprintf(buffer, buffer_size,
                            "0x%08lx", (unsigned long) alg);
        }
        break;
    }
    if (padding_mode != (psa_algorithm_t) -1) {
        append_padding_mode(&buffer, buffer_size, &required_size, padding_mode);
    }
    buffer[0] = 0;
    return required_size;
}

static int psa_snprint_key_usage(char *buffer, size_t buffer_size,
                                 psa_key_usage_t usage)
{
    size_t required_size = 0;
    if (usage == 0) {
        if (buffer_size > 1) {
            buffer[0] = '0';
            buffer[1] = 0;
        } else if (buffer_size == 1) {
            buffer[0] = 0;
        }
        return 1;
    }
%(key_usage_code)s
    if (usage != 0) {
        if (required_size != 0) {
            append(&buffer, buffer_size, &required_size, " | ", 3);
        }
        required_size += snprintf(buffer, buffer_size - required_size,
                                  "0x%08x", usage);
    } else {
        buffer[0] = 0;
    }
    return required_size;
}

/* End of automatically generated file. */
"#;
