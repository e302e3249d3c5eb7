//! Errors raised while resolving tool configuration.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others, so `#[expect]` cannot be used here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while reading tool settings from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConfigError {
    /// A flag variable is not a valid shell word list.
    #[error("{variable} is not a valid list of shell words: {value}")]
    #[diagnostic(
        code(mkgen::config::invalid_flags),
        help("check the variable for unbalanced quotes")
    )]
    InvalidFlags {
        /// Environment variable name.
        variable: String,
        /// Offending value.
        value: String,
    },
}
