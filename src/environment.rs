//! The resolved generation environment.
//!
//! An [`Environment`] captures every input of a generation run besides the
//! build graph: directories, the target platform and toolchain, tool
//! settings and the path of the generator itself. It is persisted in the
//! build directory so `mkgen regenerate` reproduces the original run.

use std::fs;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ToolConfig;
use crate::make::fragment::{Fragment, PathRef, Root};
use crate::toolchain::{Platform, Toolchain, ToolchainKind};

/// File name of the persisted environment inside the build directory.
pub const ENVIRONMENT_FILE: &str = ".mkgen-environment.json";

/// Default installation prefix.
pub const DEFAULT_PREFIX: &str = "/usr/local";

/// Installation directories. Unset entries default to the GNU layout
/// relative to `$(prefix)` and `$(exec_prefix)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallDirs {
    /// `prefix`.
    pub prefix: Utf8PathBuf,
    /// `exec_prefix`.
    #[serde(default)]
    pub exec_prefix: Option<Utf8PathBuf>,
    /// `bindir`.
    #[serde(default)]
    pub bindir: Option<Utf8PathBuf>,
    /// `libdir`.
    #[serde(default)]
    pub libdir: Option<Utf8PathBuf>,
    /// `includedir`.
    #[serde(default)]
    pub includedir: Option<Utf8PathBuf>,
    /// `datadir`.
    #[serde(default)]
    pub datadir: Option<Utf8PathBuf>,
}

impl Default for InstallDirs {
    fn default() -> Self {
        Self {
            prefix: Utf8PathBuf::from(DEFAULT_PREFIX),
            exec_prefix: None,
            bindir: None,
            libdir: None,
            includedir: None,
            datadir: None,
        }
    }
}

impl InstallDirs {
    /// Value assigned to the variable of install `root`, or `None` for roots
    /// that are not installation directories.
    ///
    /// ```rust
    /// use mkgen::environment::InstallDirs;
    /// use mkgen::make::fragment::Root;
    /// use mkgen::make::syntax::SyntaxContext;
    ///
    /// let dirs = InstallDirs::default();
    /// let bindir = dirs.value(Root::Bindir).expect("install root");
    /// assert_eq!(bindir.render(SyntaxContext::ShellLine), "$(exec_prefix)/bin");
    /// ```
    #[must_use]
    pub fn value(&self, root: Root) -> Option<Fragment> {
        let (explicit, default) = match root {
            Root::Prefix => return Some(Fragment::literal(self.prefix.as_str())),
            Root::ExecPrefix => (&self.exec_prefix, "$(prefix)"),
            Root::Bindir => (&self.bindir, "$(exec_prefix)/bin"),
            Root::Libdir => (&self.libdir, "$(exec_prefix)/lib"),
            Root::Includedir => (&self.includedir, "$(prefix)/include"),
            Root::Datadir => (&self.datadir, "$(prefix)/share"),
            Root::Build | Root::Source | Root::Absolute => return None,
        };
        Some(explicit.as_ref().map_or_else(
            || Fragment::escaped(default),
            |dir| Fragment::literal(dir.as_str()),
        ))
    }
}

/// Inputs of a generation run other than the build graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Absolute source directory.
    pub srcdir: Utf8PathBuf,
    /// Absolute build directory the Makefile is written to.
    pub builddir: Utf8PathBuf,
    /// Absolute path of the build description.
    pub description: Utf8PathBuf,
    /// Generator invoked by the regeneration rule.
    pub generator: Utf8PathBuf,
    /// Target platform.
    pub platform: Platform,
    /// Toolchain family.
    pub toolchain: ToolchainKind,
    /// Installation directories.
    #[serde(default)]
    pub install_dirs: InstallDirs,
    /// Commands and default flags.
    pub tools: ToolConfig,
}

impl Environment {
    /// The toolchain described by this environment.
    #[must_use]
    pub fn toolchain(&self) -> Toolchain {
        Toolchain::new(self.toolchain, self.platform, self.tools.clone())
    }

    /// The description file, anchored on `$(srcdir)` when it lives there.
    #[must_use]
    pub fn description_ref(&self) -> PathRef {
        self.description.strip_prefix(&self.srcdir).map_or_else(
            |_| PathRef::new(Root::Absolute, self.description.clone()),
            |rel| PathRef::new(Root::Source, rel),
        )
    }

    /// Path of the persisted environment for `builddir`.
    #[must_use]
    pub fn file_path(builddir: &Utf8Path) -> Utf8PathBuf {
        builddir.join(ENVIRONMENT_FILE)
    }

    /// Write the environment into its build directory.
    ///
    /// # Errors
    ///
    /// Returns an error when serialisation or the write fails.
    pub fn save(&self) -> Result<()> {
        let path = Self::file_path(&self.builddir);
        let json = serde_json::to_string_pretty(self).context("serialise environment")?;
        fs::write(&path, json).with_context(|| format!("write environment to {path}"))?;
        info!("Saved environment at {path}");
        Ok(())
    }

    /// Load the environment persisted in `builddir`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing or malformed.
    pub fn load(builddir: &Utf8Path) -> Result<Self> {
        let path = Self::file_path(builddir);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("read environment from {path}"))?;
        serde_json::from_str(&text).with_context(|| format!("parse environment in {path}"))
    }
}
