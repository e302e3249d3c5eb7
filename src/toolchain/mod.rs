//! Compiler and linker policy consumed by the rule generators.
//!
//! A [`Compiler`] or [`Linker`] knows the command-line shape of one tool:
//! where flags, inputs and outputs go, how header dependencies are reported,
//! and how libraries, library directories and runtime paths are spelled. The
//! generators only ask these questions; they never hard-code a flag.

use std::hash::Hash;

use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::ToolConfig;
use crate::graph::{IncludeDir, Library};
use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, PathRef};

pub mod cc;
pub mod msvc;

/// Target operating system of the generated build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// GNU/Linux and other ELF systems.
    Linux,
    /// macOS.
    Darwin,
    /// Native Windows.
    Windows,
    /// Cygwin.
    Cygwin,
}

impl Platform {
    /// The platform this binary was built for.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(target_os = "macos") {
            Self::Darwin
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Lower-case platform name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
            Self::Cygwin => "cygwin",
        }
    }

    /// Suffix of executables.
    #[must_use]
    pub const fn executable_ext(self) -> &'static str {
        match self {
            Self::Linux | Self::Darwin => "",
            Self::Windows | Self::Cygwin => ".exe",
        }
    }

    /// Suffix of shared libraries.
    #[must_use]
    pub const fn shared_library_ext(self) -> &'static str {
        match self {
            Self::Linux => ".so",
            Self::Darwin => ".dylib",
            Self::Windows | Self::Cygwin => ".dll",
        }
    }

    /// Whether shared libraries come with a separate import library.
    #[must_use]
    pub const fn has_import_library(self) -> bool {
        matches!(self, Self::Windows | Self::Cygwin)
    }

    /// Whether the dynamic loader honours `$ORIGIN`-relative run paths.
    #[must_use]
    pub const fn has_rpath(self) -> bool {
        matches!(self, Self::Linux)
    }
}

/// Family of tools used for compiling and linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    /// GCC-compatible drivers plus `ar`.
    #[default]
    Cc,
    /// Microsoft `cl`, `link` and `lib`.
    Msvc,
}

/// How a compiler reports header dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepsFlavor {
    /// No dependency information.
    None,
    /// A make-syntax dependency file written next to the object.
    Gcc,
    /// Included headers listed on standard output.
    Msvc,
}

/// Dependency output requested from a compile command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deps {
    /// Do not report dependencies.
    None,
    /// Write a dependency file at the given path.
    File(Fragment),
    /// Report dependencies inline on the compiler's output.
    Inline,
}

/// Kind of binary a link produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// A program.
    Executable,
    /// A shared library.
    SharedLibrary,
    /// A static archive.
    StaticLibrary,
}

impl LinkMode {
    /// Snake-case mode name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Executable => "executable",
            Self::SharedLibrary => "shared_library",
            Self::StaticLibrary => "static_library",
        }
    }
}

/// Operands of a compile command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    /// The compiler executable.
    pub cmd: Fragment,
    /// Source file.
    pub input: Fragment,
    /// Object file.
    pub output: Fragment,
    /// Dependency output.
    pub deps: Deps,
    /// Flags placed before the inputs.
    pub args: Vec<Fragment>,
}

/// Operands of a link command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCommand {
    /// The linker executable.
    pub cmd: Fragment,
    /// Object files and archives.
    pub inputs: Fragment,
    /// Produced binary.
    pub output: Fragment,
    /// Libraries placed after the inputs.
    pub libs: Option<Fragment>,
    /// Flags placed before the inputs.
    pub args: Vec<Fragment>,
}

/// Compile-time policy of one compiler.
pub trait Compiler {
    /// Identity of the shared compile recipe, such as `cc`.
    fn rule_name(&self) -> &str;
    /// Base name of the variable holding the command, such as `cc`.
    fn command_var(&self) -> &str;
    /// Command to run.
    fn command_name(&self) -> &str;
    /// Base name of the flags variable, such as `cflags`.
    fn flags_var(&self) -> &str;
    /// Flags applied to every compilation.
    fn global_args(&self) -> Vec<String>;
    /// How header dependencies are reported.
    fn deps_flavor(&self) -> DepsFlavor;
    /// Flags for objects linked into a shared library.
    fn library_args(&self) -> Vec<Fragment>;
    /// Flags adding `dir` to the header search path.
    fn include_dir(&self, dir: &IncludeDir) -> Vec<Fragment>;
    /// Full compile command line.
    fn command(&self, command: CompileCommand) -> Vec<Fragment>;
}

/// Link-time policy of one linker in one mode.
pub trait Linker {
    /// Identity of the shared link recipe, such as `link_cc`.
    fn rule_name(&self) -> &str;
    /// Base name of the variable holding the command.
    fn command_var(&self) -> &str;
    /// Command to run.
    fn command_name(&self) -> &str;
    /// Base name of the flags variable, such as `ldflags`.
    fn flags_var(&self) -> &str;
    /// Mode the linker was created for.
    fn mode(&self) -> LinkMode;
    /// Flags applied to every link.
    fn global_args(&self) -> Vec<String>;
    /// Flags selecting the link mode.
    fn mode_args(&self) -> Vec<Fragment>;
    /// Full link command line.
    fn command(&self, command: LinkCommand) -> Vec<Fragment>;

    /// Base name of the libraries variable, when the mode links libraries.
    fn libs_var(&self) -> Option<&str> {
        None
    }

    /// Libraries appended to every link.
    fn global_libs(&self) -> Vec<String> {
        Vec::new()
    }

    /// Library search directory flags for `libs`.
    fn lib_dirs(&self, _libs: &[Library]) -> Vec<Fragment> {
        Vec::new()
    }

    /// Run-path flags letting `output` find the shared libraries in `libs`.
    fn rpath(&self, _libs: &[Library], _output: &PathRef) -> Vec<Fragment> {
        Vec::new()
    }

    /// Arguments linking `lib`.
    ///
    /// # Errors
    ///
    /// Returns [`MakeError::InvalidLibraryName`] when a shared library name
    /// cannot be shortened, or [`MakeError::UnsupportedMode`] when the mode
    /// does not link libraries.
    fn link_lib(&self, _lib: &Library) -> Result<Vec<Fragment>, MakeError> {
        Err(unsupported("library linking", self.mode()))
    }

    /// Arguments producing the import library `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MakeError::UnsupportedMode`] unless the linker builds shared
    /// libraries.
    fn import_lib(&self, _path: &PathRef) -> Result<Vec<Fragment>, MakeError> {
        Err(unsupported("import library", self.mode()))
    }
}

pub(crate) fn unsupported(operation: &str, mode: LinkMode) -> MakeError {
    MakeError::UnsupportedMode {
        operation: operation.to_owned(),
        mode: mode.name().to_owned(),
    }
}

/// Resolves compilers and linkers for a language.
#[derive(Debug, Clone)]
pub struct Toolchain {
    kind: ToolchainKind,
    platform: Platform,
    tools: ToolConfig,
}

impl Toolchain {
    /// Create a toolchain of `kind` targeting `platform`.
    #[must_use]
    pub const fn new(kind: ToolchainKind, platform: Platform, tools: ToolConfig) -> Self {
        Self {
            kind,
            platform,
            tools,
        }
    }

    /// Target platform.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Compiler for `lang`.
    ///
    /// # Errors
    ///
    /// Returns [`MakeError::UnknownLanguage`] for languages other than `c`
    /// and `c++`.
    pub fn compiler(&self, lang: &str) -> Result<Box<dyn Compiler>, MakeError> {
        let language = Language::parse(lang, "compiler")?;
        Ok(match self.kind {
            ToolchainKind::Cc => Box::new(cc::CcCompiler::new(language, &self.tools)),
            ToolchainKind::Msvc => Box::new(msvc::MsvcCompiler::new(&self.tools)),
        })
    }

    /// Linker producing `mode` binaries from `lang` objects.
    ///
    /// # Errors
    ///
    /// Returns [`MakeError::UnknownLanguage`] for languages other than `c`
    /// and `c++`.
    pub fn linker(&self, lang: &str, mode: LinkMode) -> Result<Box<dyn Linker>, MakeError> {
        let language = Language::parse(lang, "linker")?;
        Ok(match (self.kind, mode) {
            (ToolchainKind::Cc, LinkMode::StaticLibrary) => Box::new(cc::ArLinker::new(&self.tools)),
            (ToolchainKind::Cc, _) => {
                Box::new(cc::CcLinker::new(language, mode, self.platform, &self.tools))
            }
            (ToolchainKind::Msvc, LinkMode::StaticLibrary) => {
                Box::new(msvc::MsvcStaticLinker::new(&self.tools))
            }
            (ToolchainKind::Msvc, _) => Box::new(msvc::MsvcLinker::new(mode, &self.tools)),
        })
    }
}

/// Source languages with a registered compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// C.
    C,
    /// C++.
    Cxx,
}

impl Language {
    fn parse(lang: &str, tool: &str) -> Result<Self, MakeError> {
        match lang {
            "c" => Ok(Self::C),
            "c++" => Ok(Self::Cxx),
            other => Err(MakeError::UnknownLanguage {
                tool: tool.to_owned(),
                lang: other.to_owned(),
            }),
        }
    }
}

/// Unique items of `items`, keeping first occurrences in order.
pub(crate) fn uniques<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    items.into_iter().unique().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_with;
    use rstest::rstest;

    fn toolchain(kind: ToolchainKind) -> Toolchain {
        let tools = resolve_with(kind, |_| None).expect("default tools");
        Toolchain::new(kind, Platform::Linux, tools)
    }

    #[rstest]
    #[case::cc_c(ToolchainKind::Cc, "c", "cc", "cflags")]
    #[case::cc_cxx(ToolchainKind::Cc, "c++", "cxx", "cxxflags")]
    #[case::msvc(ToolchainKind::Msvc, "c", "cxx", "cxxflags")]
    fn compilers_resolve_by_language(
        #[case] kind: ToolchainKind,
        #[case] lang: &str,
        #[case] rule: &str,
        #[case] flags: &str,
    ) {
        let compiler = toolchain(kind).compiler(lang).expect("compiler");
        assert_eq!(compiler.rule_name(), rule);
        assert_eq!(compiler.flags_var(), flags);
    }

    #[rstest]
    #[case::cc_exe(ToolchainKind::Cc, LinkMode::Executable, "link_cc", "ldflags")]
    #[case::cc_static(ToolchainKind::Cc, LinkMode::StaticLibrary, "ar", "arflags")]
    #[case::msvc_dll(ToolchainKind::Msvc, LinkMode::SharedLibrary, "link", "ldflags")]
    #[case::msvc_lib(ToolchainKind::Msvc, LinkMode::StaticLibrary, "lib", "libflags")]
    fn linkers_resolve_by_mode(
        #[case] kind: ToolchainKind,
        #[case] mode: LinkMode,
        #[case] rule: &str,
        #[case] flags: &str,
    ) {
        let linker = toolchain(kind).linker("c", mode).expect("linker");
        assert_eq!(linker.rule_name(), rule);
        assert_eq!(linker.flags_var(), flags);
        assert_eq!(linker.mode(), mode);
    }

    #[test]
    fn unknown_language_is_rejected() {
        let Err(err) = toolchain(ToolchainKind::Cc).compiler("fortran") else {
            panic!("fortran has no compiler");
        };
        assert_eq!(
            err,
            MakeError::UnknownLanguage {
                tool: "compiler".into(),
                lang: "fortran".into()
            }
        );
    }

    #[test]
    fn static_linkers_reject_import_libraries() {
        let linker = toolchain(ToolchainKind::Cc)
            .linker("c", LinkMode::StaticLibrary)
            .expect("linker");
        let err = linker
            .import_lib(&PathRef::build("libfoo.a"))
            .expect_err("static mode");
        assert_eq!(
            err,
            MakeError::UnsupportedMode {
                operation: "import library".into(),
                mode: "static_library".into()
            }
        );
    }

    #[test]
    fn uniques_keeps_first_occurrence() {
        assert_eq!(uniques([3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
