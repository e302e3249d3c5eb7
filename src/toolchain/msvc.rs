//! Microsoft Visual C++ tools: `cl`, `link` and `lib`.

use crate::config::ToolConfig;
use crate::graph::{IncludeDir, Library, LibraryKind};
use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, PathRef, concat};

use super::{
    CompileCommand, Compiler, Deps, DepsFlavor, LinkCommand, LinkMode, Linker, unsupported,
    uniques,
};

fn prefixed(flag: &str, path: impl Into<Fragment>) -> Fragment {
    concat([Fragment::literal(flag), path.into()])
}

/// `cl`, compiling both C and C++.
#[derive(Debug, Clone)]
pub struct MsvcCompiler {
    command: String,
    global_args: Vec<String>,
}

impl MsvcCompiler {
    /// Create the compiler.
    #[must_use]
    pub fn new(tools: &ToolConfig) -> Self {
        Self {
            command: tools.cxx.clone(),
            global_args: tools.cxxflags.iter().chain(&tools.cppflags).cloned().collect(),
        }
    }
}

impl Compiler for MsvcCompiler {
    fn rule_name(&self) -> &str {
        "cxx"
    }

    fn command_var(&self) -> &str {
        "cxx"
    }

    fn command_name(&self) -> &str {
        &self.command
    }

    fn flags_var(&self) -> &str {
        "cxxflags"
    }

    fn global_args(&self) -> Vec<String> {
        self.global_args.clone()
    }

    fn deps_flavor(&self) -> DepsFlavor {
        DepsFlavor::Msvc
    }

    fn library_args(&self) -> Vec<Fragment> {
        Vec::new()
    }

    fn include_dir(&self, dir: &IncludeDir) -> Vec<Fragment> {
        vec![prefixed("/I", &dir.path)]
    }

    fn command(&self, command: CompileCommand) -> Vec<Fragment> {
        let mut out = vec![command.cmd];
        out.extend(command.args);
        if command.deps != Deps::None {
            out.push(Fragment::literal("/showIncludes"));
        }
        out.push(Fragment::literal("/c"));
        out.push(command.input);
        out.push(prefixed("/Fo", command.output));
        out
    }
}

/// `link`, producing programs and DLLs.
#[derive(Debug, Clone)]
pub struct MsvcLinker {
    mode: LinkMode,
    command: String,
    global_args: Vec<String>,
    global_libs: Vec<String>,
}

impl MsvcLinker {
    /// Create the linker for `mode`.
    #[must_use]
    pub fn new(mode: LinkMode, tools: &ToolConfig) -> Self {
        Self {
            mode,
            command: tools.link.clone(),
            global_args: tools.ldflags.clone(),
            global_libs: tools.ldlibs.clone(),
        }
    }
}

impl Linker for MsvcLinker {
    fn rule_name(&self) -> &str {
        "link"
    }

    fn command_var(&self) -> &str {
        "link"
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
            vec![Fragment::literal("/DLL")]
        } else {
            Vec::new()
        }
    }

    fn command(&self, command: LinkCommand) -> Vec<Fragment> {
        let mut out = vec![command.cmd];
        out.extend(command.args);
        out.push(command.inputs);
        out.extend(command.libs);
        out.push(prefixed("/OUT:", command.output));
        out
    }

    fn libs_var(&self) -> Option<&str> {
        Some("ldlibs")
    }

    fn global_libs(&self) -> Vec<String> {
        self.global_libs.clone()
    }

    fn lib_dirs(&self, libs: &[Library]) -> Vec<Fragment> {
        uniques(libs.iter().map(|lib| lib.path.parent()))
            .iter()
            .map(|dir| prefixed("/LIBPATH:", dir))
            .collect()
    }

    fn link_lib(&self, lib: &Library) -> Result<Vec<Fragment>, MakeError> {
        let name = lib
            .path
            .file_name()
            .ok_or_else(|| MakeError::InvalidLibraryName {
                name: lib.path.path.to_string(),
            })?;
        Ok(vec![match lib.kind {
            LibraryKind::WholeArchive => Fragment::literal(format!("/WHOLEARCHIVE:{name}")),
            LibraryKind::Static | LibraryKind::Shared => Fragment::literal(name),
        }])
    }

    fn import_lib(&self, path: &PathRef) -> Result<Vec<Fragment>, MakeError> {
        if self.mode != LinkMode::SharedLibrary {
            return Err(unsupported("import library", self.mode));
        }
        Ok(vec![prefixed("/IMPLIB:", path)])
    }
}

/// `lib`, producing static libraries.
#[derive(Debug, Clone)]
pub struct MsvcStaticLinker {
    command: String,
    global_args: Vec<String>,
}

impl MsvcStaticLinker {
    /// Create the librarian.
    #[must_use]
    pub fn new(tools: &ToolConfig) -> Self {
        Self {
            command: tools.lib.clone(),
            global_args: tools.libflags.clone(),
        }
    }
}

impl Linker for MsvcStaticLinker {
    fn rule_name(&self) -> &str {
        "lib"
    }

    fn command_var(&self) -> &str {
        "lib"
    }

    fn command_name(&self) -> &str {
        &self.command
    }

    fn flags_var(&self) -> &str {
        "libflags"
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
        out.push(command.inputs);
        out.push(prefixed("/OUT:", command.output));
        out
    }
}
