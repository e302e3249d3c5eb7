//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::environment::InstallDirs;
use crate::toolchain::{Platform, ToolchainKind};

/// Build directory used when `--builddir` is omitted.
pub const DEFAULT_BUILDDIR: &str = "build";

/// Generate Makefiles from serialized build graphs.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose diagnostic logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by `generate` and `print`.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct GenerateArgs {
    /// Build description to translate.
    #[arg(value_name = "DESCRIPTION")]
    pub description: Utf8PathBuf,

    /// Directory receiving the Makefile.
    #[arg(short = 'B', long, value_name = "DIR", default_value = DEFAULT_BUILDDIR)]
    pub builddir: Utf8PathBuf,

    /// Source directory; defaults to the directory holding the description.
    #[arg(long, value_name = "DIR")]
    pub srcdir: Option<Utf8PathBuf>,

    /// Toolchain family used to compile and link.
    #[arg(long, value_enum)]
    pub toolchain: Option<ToolchainKind>,

    /// Platform the build targets; defaults to the host.
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    /// Installation directories.
    #[command(flatten)]
    pub install: InstallArgs,
}

/// Installation directory overrides.
#[derive(Debug, Args, PartialEq, Eq, Clone, Default)]
pub struct InstallArgs {
    /// Installation prefix.
    #[arg(long, value_name = "DIR")]
    pub prefix: Option<Utf8PathBuf>,

    /// Prefix for architecture-dependent files.
    #[arg(long, value_name = "DIR")]
    pub exec_prefix: Option<Utf8PathBuf>,

    /// Directory for executables.
    #[arg(long, value_name = "DIR")]
    pub bindir: Option<Utf8PathBuf>,

    /// Directory for libraries.
    #[arg(long, value_name = "DIR")]
    pub libdir: Option<Utf8PathBuf>,

    /// Directory for headers.
    #[arg(long, value_name = "DIR")]
    pub includedir: Option<Utf8PathBuf>,

    /// Directory for read-only data.
    #[arg(long, value_name = "DIR")]
    pub datadir: Option<Utf8PathBuf>,
}

impl InstallArgs {
    /// Installation directories with these overrides applied.
    #[must_use]
    pub fn install_dirs(&self) -> InstallDirs {
        let defaults = InstallDirs::default();
        InstallDirs {
            prefix: self.prefix.clone().unwrap_or(defaults.prefix),
            exec_prefix: self.exec_prefix.clone(),
            bindir: self.bindir.clone(),
            libdir: self.libdir.clone(),
            includedir: self.includedir.clone(),
            datadir: self.datadir.clone(),
        }
    }
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Write the Makefile for a build description into the build directory.
    Generate(GenerateArgs),

    /// Rewrite the Makefile of an existing build directory.
    Regenerate {
        /// Build directory holding a previously generated Makefile.
        #[arg(value_name = "BUILDDIR", default_value = ".")]
        builddir: Utf8PathBuf,
    },

    /// Write the Makefile to stdout instead of the build directory.
    Print(GenerateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_defaults_build_directory() {
        let cli = Cli::try_parse_from(["mkgen", "generate", "build.json"]).expect("parse");
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.builddir, Utf8PathBuf::from(DEFAULT_BUILDDIR));
        assert_eq!(args.toolchain, None);
        assert_eq!(args.install.install_dirs(), InstallDirs::default());
    }

    #[rstest]
    #[case(&["mkgen", "regenerate"], ".")]
    #[case(&["mkgen", "-v", "regenerate", "out"], "out")]
    fn regenerate_takes_optional_directory(#[case] argv: &[&str], #[case] expected: &str) {
        let cli = Cli::try_parse_from(argv).expect("parse");
        assert_eq!(
            cli.command,
            Commands::Regenerate {
                builddir: expected.into()
            }
        );
    }

    #[test]
    fn print_accepts_toolchain_and_install_options() {
        let cli = Cli::try_parse_from([
            "mkgen",
            "print",
            "build.json",
            "--toolchain",
            "msvc",
            "--platform",
            "windows",
            "--prefix",
            "/opt/app",
            "--libdir",
            "/opt/app/lib64",
            "--verbose",
        ])
        .expect("parse");
        assert!(cli.verbose);
        let Commands::Print(args) = cli.command else {
            panic!("expected print");
        };
        assert_eq!(args.toolchain, Some(ToolchainKind::Msvc));
        assert_eq!(args.platform, Some(Platform::Windows));
        let dirs = args.install.install_dirs();
        assert_eq!(dirs.prefix, Utf8PathBuf::from("/opt/app"));
        assert_eq!(dirs.libdir, Some(Utf8PathBuf::from("/opt/app/lib64")));
    }
}
