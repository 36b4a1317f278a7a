//! Rendering of C code fragments from classified names
//!
//! Every list is rendered in ascending name order. When two names share a
//! numeric value the first one in that order is the one the C compiler
//! reports, and regenerating from the same header gives identical text.

use crate::template::Slot;
use pcn_collect::{DerivedMacro, MacroCollector};

/// Separator between consecutive `case` labels
const CASE_SEPARATOR: &str = "\n    ";

/// Separator between consecutive tester clauses
const CLAUSE_SEPARATOR: &str = "\n        ";

/// `case NAME: return "NAME";`
pub fn return_case(name: &str) -> String {
    format!("case {name}: return \"{name}\";")
}

/// A `case` that appends the name to the output buffer of an `snprint` function
pub fn append_case(name: &str) -> String {
    format!(
        "case {name}: append(&buffer, buffer_size, &required_size, \"{name}\", {length}); break;",
        length = name.len()
    )
}

/// Like [`append_case`], for helpers that receive the buffer state by pointer
pub fn inner_append_case(name: &str) -> String {
    format!(
        "case {name}: append(buffer, buffer_size, required_size, \"{name}\", {length}); break;",
        length = name.len()
    )
}

/// One link of the key type tester chain
pub fn key_type_from_curve_clause(derived: DerivedMacro<'_>) -> String {
    format!(
        concat!(
            "if ({tester}(type)) {{\n",
            "        append_with_curve(&buffer, buffer_size, &required_size,\n",
            "                          \"{builder}\", {length},\n",
            "                          PSA_KEY_TYPE_GET_CURVE(type));\n",
            "    }} else ",
        ),
        tester = derived.tester,
        builder = derived.builder,
        length = derived.builder.len(),
    )
}

/// One link of the algorithm tester chain
pub fn algorithm_from_hash_clause(derived: DerivedMacro<'_>) -> String {
    format!(
        concat!(
            "if ({tester}(alg_without_padding)) {{\n",
            "        append_with_hash(&buffer, buffer_size, &required_size,\n",
            "                         \"{builder}\", {length},\n",
            "                         PSA_ALG_GET_HASH(alg_without_padding));\n",
            "    }} else ",
        ),
        tester = derived.tester,
        builder = derived.builder,
        length = derived.builder.len(),
    )
}

/// Appends `flag` when it is set in `var`, then clears it from `var`
pub fn bit_test(var: &str, flag: &str) -> String {
    format!(
        "    if ({var} & {flag}) {{
        if (required_size != 0) {{
            append(&buffer, buffer_size, &required_size, \" | \", 3);
        }}
        append(&buffer, buffer_size, &required_size, \"{flag}\", {length});
        {var} ^= {flag};
    }}",
        length = flag.len(),
    )
}

fn join<T>(items: impl IntoIterator<Item = T>, render: impl Fn(T) -> String, separator: &str) -> String {
    items.into_iter().map(render).collect::<Vec<_>>().join(separator)
}

/// Rendered text for every template slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    /// Status `case` labels
    pub status_cases: String,
    /// Elliptic curve `case` labels
    pub ecc_curve_cases: String,
    /// Hash algorithm `case` labels
    pub hash_algorithm_cases: String,
    /// Key type `case` labels
    pub key_type_cases: String,
    /// Curve-parameterized key type tester chain
    pub key_type_code: String,
    /// Padding mode `case` labels
    pub padding_mode_cases: String,
    /// Algorithm `case` labels
    pub algorithm_cases: String,
    /// Hash-parameterized algorithm tester chain
    pub algorithm_code: String,
    /// Key usage bit tests
    pub key_usage_code: String,
}

impl Fragments {
    /// Renders every fragment from a populated collector
    pub fn new(collector: &MacroCollector) -> Self {
        Self {
            status_cases: join(collector.statuses(), return_case, CASE_SEPARATOR),
            ecc_curve_cases: join(collector.ecc_curves(), return_case, CASE_SEPARATOR),
            hash_algorithm_cases: join(collector.hash_algorithms(), return_case, CASE_SEPARATOR),
            key_type_cases: join(collector.key_types(), append_case, CASE_SEPARATOR),
            key_type_code: join(
                collector.key_types_from_curve(),
                key_type_from_curve_clause,
                CLAUSE_SEPARATOR,
            ),
            padding_mode_cases: join(
                collector.block_cipher_padding_modes(),
                inner_append_case,
                CASE_SEPARATOR,
            ),
            algorithm_cases: join(collector.algorithms(), append_case, CASE_SEPARATOR),
            algorithm_code: join(
                collector.algorithms_from_hash(),
                algorithm_from_hash_clause,
                CLAUSE_SEPARATOR,
            ),
            key_usage_code: join(collector.key_usages(), |flag| bit_test("usage", flag), "\n"),
        }
    }

    /// Rendered text for one template slot
    pub fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::StatusCases => &self.status_cases,
            Slot::EccCurveCases => &self.ecc_curve_cases,
            Slot::HashAlgorithmCases => &self.hash_algorithm_cases,
            Slot::KeyTypeCases => &self.key_type_cases,
            Slot::KeyTypeCode => &self.key_type_code,
            Slot::PaddingModeCases => &self.padding_mode_cases,
            Slot::AlgorithmCases => &self.algorithm_cases,
            Slot::AlgorithmCode => &self.algorithm_code,
            Slot::KeyUsageCode => &self.key_usage_code,
        }
    }
}
