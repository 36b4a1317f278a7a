//! Errors raised while assembling the generated source

use thiserror::Error;

/// Template assembly failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// A placeholder names a slot no fragment is rendered for
    #[error("template refers to unknown slot `{name}`")]
    UnknownSlot {
        /// Placeholder name
        name: String,
    },

    /// A placeholder opener without its closing `)s`
    #[error("unterminated slot placeholder at byte {offset}")]
    UnterminatedSlot {
        /// Byte offset of the opener in the template
        offset: usize,
    },
}
