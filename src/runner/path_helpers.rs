//! Path resolution helpers for the runner module.
//!
//! Centralises description and directory path logic so the main runner
//! module stays focused on command dispatch.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::path::PathBuf;

use super::RunnerError;

/// Convert a standard path into a UTF-8 path.
///
/// # Errors
/// Returns [`RunnerError::NonUtf8Path`] when `path` is not valid UTF-8.
pub(super) fn utf8(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| RunnerError::NonUtf8Path { path }.into())
}

/// Make `path` absolute against the current directory without touching the
/// filesystem.
///
/// # Errors
/// Returns an error when the current directory cannot be read.
pub(super) fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let resolved = std::path::absolute(path.as_std_path())
        .with_context(|| format!("resolve absolute path of {path}"))?;
    utf8(resolved)
}

/// Resolve the description path, failing when the file is missing.
///
/// # Errors
/// Returns [`RunnerError::DescriptionNotFound`] when the description does not
/// exist.
pub(super) fn resolve_description(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let resolved = absolute(path)?;
    if resolved.is_file() {
        Ok(resolved)
    } else {
        Err(RunnerError::DescriptionNotFound { path: resolved }.into())
    }
}

/// Source directory: `explicit` when given, otherwise the directory holding
/// the description.
///
/// # Errors
/// Returns an error when `explicit` cannot be made absolute.
pub(super) fn resolve_srcdir(
    explicit: Option<&Utf8Path>,
    description: &Utf8Path,
) -> Result<Utf8PathBuf> {
    match explicit {
        Some(dir) => absolute(dir),
        None => Ok(description
            .parent()
            .map_or_else(|| Utf8PathBuf::from("/"), Utf8Path::to_path_buf)),
    }
}
