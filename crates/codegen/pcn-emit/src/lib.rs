//! C source generation for PSA constant names
//!
//! Turns a populated [`MacroCollector`] into the text of
//! `psa_constant_names_generated.c`: one lookup or printing function per
//! category, with a hexadecimal fallback for values no name matches.

pub mod error;
pub mod fragments;
pub mod template;

pub use error::EmitError;
pub use fragments::Fragments;
pub use template::{OUTPUT_TEMPLATE, Slot};

use pcn_collect::MacroCollector;

/// Substitutes already rendered fragments into [`OUTPUT_TEMPLATE`].
///
/// # Errors
///
/// Returns an error if the template contains a malformed or unknown placeholder
pub fn assemble(fragments: &Fragments) -> Result<String, EmitError> {
    template::fill(OUTPUT_TEMPLATE, |name| {
        Slot::from_name(name).map(|slot| fragments.get(slot))
    })
}

/// Renders the complete generated source for `collector`.
///
/// # Errors
///
/// Returns an error if the template contains a malformed or unknown placeholder
pub fn render(collector: &MacroCollector) -> Result<String, EmitError> {
    assemble(&Fragments::new(collector))
}
