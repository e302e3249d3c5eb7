//! Error types raised while assembling a Makefile.
//!
//! Every variant is fatal to the generation run that produced it: callers
//! report the diagnostic and must not commit any partially generated output.

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

/// Errors raised while building or serialising a Makefile.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum MakeError {
    /// A pattern template did not contain exactly one wildcard marker.
    #[error("pattern '{template}' must contain exactly one '%' wildcard, found {found}")]
    #[diagnostic(code(mkgen::make::invalid_pattern))]
    InvalidPattern {
        /// Template as supplied by the caller.
        template: String,
        /// Number of unescaped wildcard markers found.
        found: usize,
    },

    /// A variable was declared twice within the same scope.
    #[error("variable '{name}' already exists{}", scope_suffix(.scope.as_deref()))]
    #[diagnostic(
        code(mkgen::make::duplicate_variable),
        help("use the declare-once helpers for variables shared between rules")
    )]
    DuplicateVariable {
        /// Sanitised variable name.
        name: String,
        /// Pattern scope, when the variable is pattern-specific.
        scope: Option<String>,
    },

    /// A rule target is already claimed by an earlier rule.
    #[error("rule for '{target}' already exists")]
    #[diagnostic(code(mkgen::make::duplicate_target))]
    DuplicateTarget {
        /// Target as rendered in the Makefile.
        target: String,
    },

    /// A rule was declared without any target.
    #[error("a rule must have at least one target")]
    #[diagnostic(code(mkgen::make::empty_targets))]
    EmptyTargets,

    /// A multi-line macro was requested with a pattern scope.
    #[error("macro '{name}' cannot be scoped to a pattern")]
    #[diagnostic(code(mkgen::make::scoped_define))]
    ScopedDefine {
        /// Sanitised macro name.
        name: String,
    },

    /// A render request named a syntactic context that does not exist.
    #[error("unknown syntax '{syntax}'")]
    #[diagnostic(code(mkgen::make::unsupported_syntax))]
    UnsupportedSyntax {
        /// Requested context name.
        syntax: String,
    },

    /// A shared library cannot be translated into a short link flag.
    #[error("'{name}' is not a valid library name")]
    #[diagnostic(code(mkgen::make::invalid_library_name))]
    InvalidLibraryName {
        /// File name of the offending library.
        name: String,
    },

    /// The requested operation is not available for the linker's mode.
    #[error("{operation} is not supported for {mode} linking")]
    #[diagnostic(code(mkgen::make::unsupported_mode))]
    UnsupportedMode {
        /// Operation that was attempted.
        operation: String,
        /// Linker mode that rejected it.
        mode: String,
    },

    /// No rule generator is registered for an edge kind.
    #[error("no rule generator registered for '{kind}' edges")]
    #[diagnostic(code(mkgen::make::unknown_edge_type))]
    UnknownEdgeType {
        /// Name of the edge kind.
        kind: String,
    },

    /// The toolchain has no compiler or linker for a language.
    #[error("no {tool} available for language '{lang}'")]
    #[diagnostic(code(mkgen::make::unknown_language))]
    UnknownLanguage {
        /// Kind of tool requested (`compiler` or `linker`).
        tool: String,
        /// Language requested by the edge.
        lang: String,
    },
}

fn scope_suffix(scope: Option<&str>) -> String {
    scope.map_or_else(String::new, |s| format!(" for pattern '{s}'"))
}
