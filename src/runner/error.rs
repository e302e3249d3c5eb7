//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint suppressions
//! narrowly. The `unused_assignments` lint fires in some Rust versions due to
//! thiserror/miette derive macro expansion.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others. Since `#[expect]` fails when the lint doesn't
// fire, and `unfulfilled_lint_expectations` cannot be expected, we must use
// `#[allow]` here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised during command execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The build description does not exist.
    #[error("build description {path} not found")]
    #[diagnostic(
        code(mkgen::runner::description_not_found),
        help("pass the path of a JSON build graph")
    )]
    DescriptionNotFound {
        /// The path that was attempted.
        path: Utf8PathBuf,
    },

    /// A path could not be represented as UTF-8.
    #[error("path {} is not valid UTF-8", path.display())]
    #[diagnostic(code(mkgen::runner::non_utf8_path))]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// The build directory has no persisted environment.
    #[error("{builddir} was not generated by mkgen")]
    #[diagnostic(
        code(mkgen::runner::not_a_build_directory),
        help("run `mkgen generate` first")
    )]
    NotABuildDirectory {
        /// Directory passed to `regenerate`.
        builddir: Utf8PathBuf,
    },
}
