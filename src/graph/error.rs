//! Errors raised while loading a build description.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others, so `#[expect]` cannot be used here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use semver::Version;
use thiserror::Error;

use super::SUPPORTED_MAJOR;

/// Errors raised while reading or parsing a build graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The description file could not be read.
    #[error("failed to read build description {path}")]
    #[diagnostic(code(mkgen::graph::read))]
    Read {
        /// Path that was attempted.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The description is not valid JSON or does not match the schema.
    #[error("invalid build description: {source}")]
    #[diagnostic(code(mkgen::graph::parse))]
    Parse {
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The description was written for an incompatible format version.
    #[error(
        "build description version {found} is not supported (expected {major}.x)",
        major = SUPPORTED_MAJOR
    )]
    #[diagnostic(
        code(mkgen::graph::unsupported_version),
        help("regenerate the description with a compatible front end")
    )]
    UnsupportedVersion {
        /// Version declared by the document.
        found: Version,
    },
}
