//! Tool names and default flags resolved from the environment.
//!
//! The conventional make variables (`CC`, `CFLAGS`, `LDFLAGS`, ...) select
//! the commands and global flags baked into the generated Makefile. Flag
//! variables are split with shell rules, so `CFLAGS="-DNAME='a b'"` yields a
//! single argument.

use std::env;

use serde::{Deserialize, Serialize};

use crate::toolchain::ToolchainKind;

mod error;

pub use error::ConfigError;

/// Commands and default flags for one toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// C compiler (`CC`).
    pub cc: String,
    /// C++ compiler (`CXX`).
    pub cxx: String,
    /// Static archiver (`AR`).
    pub ar: String,
    /// MSVC linker.
    pub link: String,
    /// MSVC librarian.
    pub lib: String,
    /// C compiler flags (`CFLAGS`).
    pub cflags: Vec<String>,
    /// C++ compiler flags (`CXXFLAGS`).
    pub cxxflags: Vec<String>,
    /// Preprocessor flags shared by both compilers (`CPPFLAGS`).
    pub cppflags: Vec<String>,
    /// Linker flags (`LDFLAGS`).
    pub ldflags: Vec<String>,
    /// Libraries appended to every link (`LDLIBS`).
    pub ldlibs: Vec<String>,
    /// Archiver flags (`ARFLAGS`).
    pub arflags: Vec<String>,
    /// Librarian flags (`LIBFLAGS`).
    pub libflags: Vec<String>,
}

/// Resolve tool settings for `kind` from the process environment.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidFlags`] when a flag variable cannot be split
/// into shell words.
pub fn resolve(kind: ToolchainKind) -> Result<ToolConfig, ConfigError> {
    resolve_with(kind, |key| env::var(key).ok())
}

/// Testable variant that accepts an environment lookup function.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidFlags`] when a flag variable cannot be split
/// into shell words.
///
/// # Examples
///
/// ```
/// use mkgen::config::resolve_with;
/// use mkgen::toolchain::ToolchainKind;
///
/// let tools = resolve_with(ToolchainKind::Cc, |key| match key {
///     "CC" => Some(String::from("clang")),
///     "CFLAGS" => Some(String::from("-O2 -g")),
///     _ => None,
/// })
/// .expect("valid flags");
/// assert_eq!(tools.cc, "clang");
/// assert_eq!(tools.cflags, vec!["-O2", "-g"]);
/// assert_eq!(tools.arflags, vec!["cru"]);
/// ```
pub fn resolve_with<F>(kind: ToolchainKind, read_env: F) -> Result<ToolConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (cc, cxx) = match kind {
        ToolchainKind::Cc => ("cc", "c++"),
        ToolchainKind::Msvc => ("cl", "cl"),
    };
    let tool = |key: &str, default: &str| read_env(key).unwrap_or_else(|| default.to_owned());
    let flags = |key: &str| split_flags(key, read_env(key).as_deref().unwrap_or_default());
    let arflags = match read_env("ARFLAGS") {
        Some(value) => split_flags("ARFLAGS", &value)?,
        None => vec!["cru".to_owned()],
    };
    Ok(ToolConfig {
        cc: tool("CC", cc),
        cxx: tool("CXX", cxx),
        ar: tool("AR", "ar"),
        link: "link".to_owned(),
        lib: "lib".to_owned(),
        cflags: flags("CFLAGS")?,
        cxxflags: flags("CXXFLAGS")?,
        cppflags: flags("CPPFLAGS")?,
        ldflags: flags("LDFLAGS")?,
        ldlibs: flags("LDLIBS")?,
        arflags,
        libflags: flags("LIBFLAGS")?,
    })
}

fn split_flags(variable: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    shlex::split(value).ok_or_else(|| ConfigError::InvalidFlags {
        variable: variable.to_owned(),
        value: value.to_owned(),
    })
}
