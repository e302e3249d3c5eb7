//! Serialized build graph consumed by the Makefile generator.
//!
//! A build description is a JSON document listing typed edges (compile,
//! link, alias, command) together with install and test descriptors. The
//! graph is produced by a separate front end; this module only defines the
//! wire format and loads it. Object maps keep document order so generated
//! output follows the description.
//!
//! ```rust
//! use mkgen::graph::{BuildGraph, Edge};
//!
//! let graph = BuildGraph::parse(r#"{
//!     "mkgen_version": "1.0.0",
//!     "edges": [
//!         {"type": "compile", "output": "foo.o", "source": {"root": "srcdir", "path": "foo.c"}, "lang": "c"}
//!     ]
//! }"#).expect("valid graph");
//! assert!(matches!(graph.edges.first(), Some(Edge::Compile(_))));
//! ```

mod error;

pub use error::GraphError;

use std::fmt;
use std::fs;

use camino::Utf8Path;
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::make::fragment::{PathRef, Root};
use crate::toolchain::LinkMode;

/// Major format version this generator reads.
pub const SUPPORTED_MAJOR: u64 = 1;

/// The whole build description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildGraph {
    /// Format version of the document.
    pub mkgen_version: Version,
    /// Targets built by `all`.
    #[serde(default)]
    pub defaults: Vec<PathRef>,
    /// Extra compile options per language.
    #[serde(default)]
    pub global_options: IndexMap<String, Vec<String>>,
    /// Extra options for every non-static link.
    #[serde(default)]
    pub global_link_options: Vec<String>,
    /// Build edges in generation order.
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Files and directories copied by `make install`.
    #[serde(default)]
    pub install: Install,
    /// Test commands run by `make test`.
    #[serde(default)]
    pub tests: Tests,
    /// Directories scanned while discovering sources.
    #[serde(default)]
    pub find_dirs: Vec<PathRef>,
}

impl BuildGraph {
    /// Parse a build description from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Parse`] for malformed documents and
    /// [`GraphError::UnsupportedVersion`] when the major version differs from
    /// [`SUPPORTED_MAJOR`].
    pub fn parse(text: &str) -> Result<Self, GraphError> {
        let graph: Self = serde_json::from_str(text).map_err(|source| GraphError::Parse { source })?;
        if graph.mkgen_version.major != SUPPORTED_MAJOR {
            return Err(GraphError::UnsupportedVersion {
                found: graph.mkgen_version,
            });
        }
        Ok(graph)
    }

    /// Read and parse the description at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Read`] when the file cannot be read, otherwise
    /// the errors of [`BuildGraph::parse`].
    pub fn from_path(path: &Utf8Path) -> Result<Self, GraphError> {
        let text = fs::read_to_string(path).map_err(|source| GraphError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

/// One build edge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Edge {
    /// Compile one source file into an object file.
    Compile(CompileEdge),
    /// Link object files and libraries into a binary.
    Link(LinkEdge),
    /// A phony target grouping other targets.
    Alias(AliasEdge),
    /// A phony target running arbitrary commands.
    Command(CommandEdge),
}

impl Edge {
    /// Kind used to look up the edge's rule generator.
    #[must_use]
    pub const fn kind(&self) -> EdgeKind {
        match self {
            Self::Compile(_) => EdgeKind::Compile,
            Self::Link(_) => EdgeKind::Link,
            Self::Alias(_) => EdgeKind::Alias,
            Self::Command(_) => EdgeKind::Command,
        }
    }
}

/// Discriminant of [`Edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// [`Edge::Compile`].
    Compile,
    /// [`Edge::Link`].
    Link,
    /// [`Edge::Alias`].
    Alias,
    /// [`Edge::Command`].
    Command,
}

impl EdgeKind {
    /// Name used in the `type` field of serialized edges.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Link => "link",
            Self::Alias => "alias",
            Self::Command => "command",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source to object compilation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompileEdge {
    /// Object file produced.
    pub output: PathRef,
    /// Source file compiled.
    pub source: PathRef,
    /// Source language, such as `c` or `c++`.
    pub lang: String,
    /// Header search directories.
    #[serde(default)]
    pub include: Vec<IncludeDir>,
    /// Extra compiler options for this file only.
    #[serde(default)]
    pub options: Vec<String>,
    /// Additional prerequisites.
    #[serde(default)]
    pub extra_deps: Vec<PathRef>,
    /// Whether the object ends up in a shared library.
    #[serde(default)]
    pub in_shared_library: bool,
}

/// A header search directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeDir {
    /// Directory searched.
    pub path: PathRef,
    /// Whether the directory holds system headers.
    #[serde(default)]
    pub system: bool,
}

/// Object files to binary linking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinkEdge {
    /// Primary artifact.
    pub output: PathRef,
    /// Import library produced alongside a shared library.
    #[serde(default)]
    pub import_library: Option<PathRef>,
    /// Kind of binary produced.
    pub mode: LinkMode,
    /// Language whose linker driver is used.
    pub lang: String,
    /// Object files linked.
    pub files: Vec<PathRef>,
    /// Libraries linked against.
    #[serde(default)]
    pub libs: Vec<Library>,
    /// Extra linker options for this binary only.
    #[serde(default)]
    pub options: Vec<String>,
    /// Additional prerequisites.
    #[serde(default)]
    pub extra_deps: Vec<PathRef>,
}

impl LinkEdge {
    /// Every file the link step produces, primary artifact first.
    #[must_use]
    pub fn outputs(&self) -> Vec<&PathRef> {
        std::iter::once(&self.output)
            .chain(self.import_library.as_ref())
            .collect()
    }
}

/// A library named on a link line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Library {
    /// How the library is linked.
    pub kind: LibraryKind,
    /// Library file.
    pub path: PathRef,
    /// Whether another edge in the graph builds the library.
    #[serde(default)]
    pub generated: bool,
}

/// How a library takes part in a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryKind {
    /// A static archive linked by path.
    Static,
    /// A shared library linked by short name.
    Shared,
    /// A static archive whose every member is linked.
    WholeArchive,
}

/// A phony grouping target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AliasEdge {
    /// Alias name.
    pub target: PathRef,
    /// Targets the alias stands for.
    #[serde(default)]
    pub deps: Vec<PathRef>,
}

/// A phony target with its own commands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommandEdge {
    /// Target name.
    pub target: PathRef,
    /// Prerequisites.
    #[serde(default)]
    pub deps: Vec<PathRef>,
    /// Commands run in order.
    pub commands: Vec<CommandLine>,
}

/// A command given either as one shell line or as separate arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandLine {
    /// Passed to the shell as written.
    Line(String),
    /// Each argument quoted separately.
    Words(Vec<String>),
}

/// Files and directories to install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Install {
    /// Individual files.
    #[serde(default)]
    pub files: Vec<InstallFile>,
    /// Whole directories copied recursively.
    #[serde(default)]
    pub directories: Vec<InstallDirectory>,
}

impl Install {
    /// Whether nothing is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}

/// An installed file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InstallFile {
    /// File to install.
    pub path: PathRef,
    /// Permission class.
    pub kind: InstallKind,
    /// Installation directory the file is placed under.
    pub root: Root,
}

/// Permission class of an installed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallKind {
    /// Executable, installed with `$(INSTALL_PROGRAM)`.
    Program,
    /// Non-executable, installed with `$(INSTALL_DATA)`.
    Data,
}

/// An installed directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InstallDirectory {
    /// Directory whose contents are copied.
    pub path: PathRef,
    /// Installation directory it is copied under.
    pub root: Root,
}

/// Test descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Tests {
    /// Everything that must be built before any test runs.
    #[serde(default)]
    pub targets: Vec<PathRef>,
    /// Prerequisites of `test` that are not built by `tests`.
    #[serde(default)]
    pub extra_deps: Vec<PathRef>,
    /// Test commands in run order.
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

impl Tests {
    /// Whether no test is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// A test, or a driver running a group of tests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestCase {
    /// A single test command.
    Test(TestCommand),
    /// A driver receiving its sub-tests as arguments.
    Driver(TestDriver),
}

/// A single test command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TestCommand {
    /// Program run.
    pub target: PathRef,
    /// Arguments passed to the program.
    #[serde(default)]
    pub options: Vec<String>,
    /// Environment assignments prepended to the command.
    #[serde(default)]
    pub env: IndexMap<String, String>,
}

/// A test driver and the tests it runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TestDriver {
    /// Driver program.
    pub target: PathRef,
    /// Arguments passed to the driver before its sub-tests.
    #[serde(default)]
    pub options: Vec<String>,
    /// Environment assignments prepended to the command.
    #[serde(default)]
    pub env: IndexMap<String, String>,
    /// Whether the driver is built by the graph.
    #[serde(default)]
    pub generated: bool,
    /// Sub-tests passed to the driver.
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn edges_keep_document_order() {
        let graph = BuildGraph::parse(
            r#"{
                "mkgen_version": "1.2.0",
                "edges": [
                    {"type": "alias", "target": "b"},
                    {"type": "command", "target": "a", "commands": ["echo hi", ["touch", "x y"]]}
                ]
            }"#,
        )
        .expect("graph");
        let kinds: Vec<_> = graph.edges.iter().map(Edge::kind).collect();
        assert_eq!(kinds, vec![EdgeKind::Alias, EdgeKind::Command]);
        let Some(Edge::Command(cmd)) = graph.edges.get(1) else {
            panic!("expected command edge");
        };
        assert_eq!(
            cmd.commands,
            vec![
                CommandLine::Line("echo hi".into()),
                CommandLine::Words(vec!["touch".into(), "x y".into()]),
            ]
        );
    }

    #[rstest]
    #[case("0.9.0")]
    #[case("2.0.0")]
    fn rejects_other_major_versions(#[case] version: &str) {
        let text = format!(r#"{{"mkgen_version": "{version}"}}"#);
        let err = BuildGraph::parse(&text).expect_err("unsupported");
        assert!(matches!(err, GraphError::UnsupportedVersion { .. }));
    }

    #[test]
    fn unknown_edge_types_fail_to_parse() {
        let err = BuildGraph::parse(
            r#"{"mkgen_version": "1.0.0", "edges": [{"type": "copy", "target": "x"}]}"#,
        )
        .expect_err("unknown edge");
        assert!(matches!(err, GraphError::Parse { .. }));
    }

    #[test]
    fn link_outputs_include_import_library() {
        let graph = BuildGraph::parse(
            r#"{
                "mkgen_version": "1.0.0",
                "edges": [{
                    "type": "link", "mode": "shared_library", "lang": "c",
                    "output": "foo.dll", "import_library": "libfoo.dll.a",
                    "files": ["foo.o"],
                    "libs": [{"kind": "whole_archive", "path": "libbar.a", "generated": true}]
                }]
            }"#,
        )
        .expect("graph");
        let Some(Edge::Link(link)) = graph.edges.first() else {
            panic!("expected link edge");
        };
        assert_eq!(
            link.outputs(),
            vec![&PathRef::build("foo.dll"), &PathRef::build("libfoo.dll.a")]
        );
        assert_eq!(link.mode, LinkMode::SharedLibrary);
        assert!(link.libs.iter().all(|lib| lib.generated));
    }

    #[test]
    fn nested_test_drivers_parse() {
        let graph = BuildGraph::parse(
            r#"{
                "mkgen_version": "1.0.0",
                "tests": {
                    "targets": ["t1"],
                    "cases": [
                        {"type": "driver", "target": "runner", "tests": [
                            {"type": "test", "target": "t1", "env": {"A": "1"}}
                        ]}
                    ]
                }
            }"#,
        )
        .expect("graph");
        assert!(!graph.tests.is_empty());
        assert!(graph.install.is_empty());
    }
}
