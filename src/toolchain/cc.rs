//! GCC-compatible compilers and linkers, plus `ar` for static archives.

use itertools::Itertools;

use crate::config::ToolConfig;
use crate::graph::{IncludeDir, Library, LibraryKind};
use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, PathRef, concat};

use super::{
    CompileCommand, Compiler, Deps, DepsFlavor, Language, LinkCommand, LinkMode, Linker, Platform,
    unsupported, uniques,
};

fn words(items: &[&str]) -> Vec<Fragment> {
    items.iter().map(|item| Fragment::literal(*item)).collect()
}

fn prefixed(flag: &str, path: &PathRef) -> Fragment {
    concat([Fragment::literal(flag), Fragment::from(path)])
}

/// `cc` or `c++` in compile mode.
#[derive(Debug, Clone)]
pub struct CcCompiler {
    lang: Language,
    command: String,
    global_args: Vec<String>,
}

impl CcCompiler {
    /// Create the compiler for `lang`.
    #[must_use]
    pub fn new(lang: Language, tools: &ToolConfig) -> Self {
        let (command, flags) = match lang {
            Language::C => (&tools.cc, &tools.cflags),
            Language::Cxx => (&tools.cxx, &tools.cxxflags),
        };
        Self {
            lang,
            command: command.clone(),
            global_args: flags.iter().chain(&tools.cppflags).cloned().collect(),
        }
    }
}

impl Compiler for CcCompiler {
    fn rule_name(&self) -> &str {
        self.command_var()
    }

    fn command_var(&self) -> &str {
        match self.lang {
            Language::C => "cc",
            Language::Cxx => "cxx",
        }
    }

    fn command_name(&self) -> &str {
        &self.command
    }

    fn flags_var(&self) -> &str {
        match self.lang {
            Language::C => "cflags",
            Language::Cxx => "cxxflags",
        }
    }

    fn global_args(&self) -> Vec<String> {
        self.global_args.clone()
    }

    fn deps_flavor(&self) -> DepsFlavor {
        DepsFlavor::Gcc
    }

    fn library_args(&self) -> Vec<Fragment> {
        words(&["-fPIC"])
    }

    fn include_dir(&self, dir: &IncludeDir) -> Vec<Fragment> {
        let flag = if dir.system { "-isystem" } else { "-I" };
        vec![prefixed(flag, &dir.path)]
    }

    fn command(&self, command: CompileCommand) -> Vec<Fragment> {
        let mut out = vec![command.cmd];
        out.extend(command.args);
        out.push(Fragment::literal("-c"));
        out.push(command.input);
        if let Deps::File(deps) = command.deps {
            out.extend(words(&["-MMD", "-MF"]));
            out.push(deps);
        }
        out.push(Fragment::literal("-o"));
        out.push(command.output);
        out
    }
}

/// `cc` or `c++` driving the link of programs and shared libraries.
#[derive(Debug, Clone)]
pub struct CcLinker {
    lang: Language,
    mode: LinkMode,
    platform: Platform,
    command: String,
    global_args: Vec<String>,
    global_libs: Vec<String>,
}

impl CcLinker {
    /// Create the linker for `lang` objects in `mode`.
    #[must_use]
    pub fn new(lang: Language, mode: LinkMode, platform: Platform, tools: &ToolConfig) -> Self {
        let command = match lang {
            Language::C => &tools.cc,
            Language::Cxx => &tools.cxx,
        };
        Self {
            lang,
            mode,
            platform,
            command: command.clone(),
            global_args: tools.ldflags.clone(),
            global_libs: tools.ldlibs.clone(),
        }
    }

    /// Short `-l` name of a shared library file: `libNAME.a`, or
    /// `libNAME<ext>` where the platform links shared libraries directly.
    fn short_name<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let stem = file_name.strip_prefix("lib")?;
        let name = stem.strip_suffix(".a").or_else(|| {
            if self.platform.has_import_library() {
                None
            } else {
                stem.strip_suffix(self.platform.shared_library_ext())
            }
        })?;
        (!name.is_empty()).then_some(name)
    }
}

impl Linker for CcLinker {
    fn rule_name(&self) -> &str {
        match self.lang {
            Language::C => "link_cc",
            Language::Cxx => "link_cxx",
        }
    }

    fn command_var(&self) -> &str {
        match self.lang {
            Language::C => "cc",
            Language::Cxx => "cxx",
        }
    }

    fn command_name(&self) -> &str {
        &self.command
    }

    fn flags_var(&self) -> &str {
        "ldflags"
    }

    fn mode(&self) -> LinkMode {
        self.mode
    }

    fn global_args(&self) -> Vec<String> {
        self.global_args.clone()
    }

    fn mode_args(&self) -> Vec<Fragment> {
        if self.mode == LinkMode::SharedLibrary {
            words(&["-shared", "-fPIC"])
        } else {
            Vec::new()
        }
    }

    fn command(&self, command: LinkCommand) -> Vec<Fragment> {
        let mut out = vec![command.cmd];
        out.extend(command.args);
        out.push(command.inputs);
        out.extend(command.libs);
        out.push(Fragment::literal("-o"));
        out.push(command.output);
        out
    }

    fn libs_var(&self) -> Option<&str> {
        Some("ldlibs")
    }

    fn global_libs(&self) -> Vec<String> {
        self.global_libs.clone()
    }

    fn lib_dirs(&self, libs: &[Library]) -> Vec<Fragment> {
        let dirs = uniques(
            libs.iter()
                .filter(|lib| lib.kind == LibraryKind::Shared)
                .map(|lib| lib.path.parent()),
        );
        dirs.iter().map(|dir| prefixed("-L", dir)).collect()
    }

    fn rpath(&self, libs: &[Library], output: &PathRef) -> Vec<Fragment> {
        if !self.platform.has_rpath() {
            return Vec::new();
        }
        let start = output.parent();
        let paths = uniques(
            libs.iter()
                .filter(|lib| lib.kind == LibraryKind::Shared)
                .filter_map(|lib| lib.path.parent().relative_to(&start)),
        );
        if paths.is_empty() {
            return Vec::new();
        }
        let entries = paths
            .iter()
            .map(|rel| {
                if rel.as_str() == "." {
                    "$ORIGIN".to_owned()
                } else {
                    format!("$ORIGIN/{rel}")
                }
            })
            .join(":");
        vec![Fragment::literal(format!("-Wl,-rpath={entries}"))]
    }

    fn link_lib(&self, lib: &Library) -> Result<Vec<Fragment>, MakeError> {
        match lib.kind {
            LibraryKind::WholeArchive if self.platform == Platform::Darwin => Ok(vec![
                Fragment::literal("-Wl,-force_load"),
                Fragment::from(&lib.path),
            ]),
            LibraryKind::WholeArchive => Ok(vec![
                Fragment::literal("-Wl,--whole-archive"),
                Fragment::from(&lib.path),
                Fragment::literal("-Wl,--no-whole-archive"),
            ]),
            LibraryKind::Static => Ok(vec![Fragment::from(&lib.path)]),
            LibraryKind::Shared => {
                let file_name = lib.path.file_name().unwrap_or_default();
                let name = self
                    .short_name(file_name)
                    .ok_or_else(|| MakeError::InvalidLibraryName {
                        name: file_name.to_owned(),
                    })?;
                Ok(vec![Fragment::literal(format!("-l{name}"))])
            }
        }
    }

    fn import_lib(&self, path: &PathRef) -> Result<Vec<Fragment>, MakeError> {
        if self.mode != LinkMode::SharedLibrary {
            return Err(unsupported("import library", self.mode));
        }
        if !self.platform.has_import_library() {
            return Ok(Vec::new());
        }
        Ok(vec![prefixed("-Wl,--out-implib=", path)])
    }
}

/// `ar` building static archives.
#[derive(Debug, Clone)]
pub struct ArLinker {
    command: String,
    global_args: Vec<String>,
}

impl ArLinker {
    /// Create the archiver.
    #[must_use]
    pub fn new(tools: &ToolConfig) -> Self {
        Self {
            command: tools.ar.clone(),
            global_args: tools.arflags.clone(),
        }
    }
}

impl Linker for ArLinker {
    fn rule_name(&self) -> &str {
        "ar"
    }

    fn command_var(&self) -> &str {
        "ar"
    }

    fn command_name(&self) -> &str {
        &self.command
    }

    fn flags_var(&self) -> &str {
        "arflags"
    }

    fn mode(&self) -> LinkMode {
        LinkMode::StaticLibrary
    }

    fn global_args(&self) -> Vec<String> {
        self.global_args.clone()
    }

    fn mode_args(&self) -> Vec<Fragment> {
        Vec::new()
    }

    fn command(&self, command: LinkCommand) -> Vec<Fragment> {
        let mut out = vec![command.cmd];
        out.extend(command.args);
        out.push(command.output);
        out.push(command.inputs);
        out
    }
}
