//! Writing generated files.
//!
//! Files are written to a temporary sibling first and renamed into place,
//! so a failed run never leaves a truncated Makefile behind.

use anyhow::{Context, Result as AnyResult};
use camino::Utf8Path;
use std::io;
use std::io::Write;
use tempfile::Builder;
use tracing::info;

/// Replace `path` with `contents` atomically.
///
/// # Errors
/// Returns an error when the temporary file cannot be created, written or
/// renamed over `path`.
pub(super) fn write_file(path: &Utf8Path, contents: &str) -> AnyResult<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let mut tmp = Builder::new()
        .prefix(".mkgen.")
        .suffix(".tmp")
        .tempfile_in(dir)
        .with_context(|| format!("create temporary file in {dir}"))?;
    {
        let handle = tmp.as_file_mut();
        handle
            .write_all(contents.as_bytes())
            .with_context(|| format!("write temporary file for {path}"))?;
        handle
            .flush()
            .with_context(|| format!("flush temporary file for {path}"))?;
    }
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("replace {path}"))?;
    info!("Generated {path}");
    Ok(())
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn ignoring_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if is_broken_pipe(&err) => Ok(()),
        other => other,
    }
}

/// Write `contents` to stdout. A closed pipe is not an error.
///
/// # Errors
/// Returns an error when stdout cannot be written.
pub(super) fn write_stdout(contents: &str) -> AnyResult<()> {
    let mut stdout = io::stdout().lock();
    ignoring_broken_pipe(stdout.write_all(contents.as_bytes())).context("write to stdout")?;
    ignoring_broken_pipe(stdout.flush()).context("flush stdout")?;
    Ok(())
}
