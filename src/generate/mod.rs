//! Makefile generation.
//!
//! [`generate`] walks a [`BuildGraph`] in a fixed order and returns the
//! rendered Makefile:
//!
//! 1. path variables for `$(srcdir)` and the installation directories,
//! 2. the `all` aggregate of the default targets,
//! 3. `install`,
//! 4. `tests` and `test`,
//! 5. one rule per edge, through a handler table keyed by edge kind,
//! 6. the directory-sentinel pattern rule,
//! 7. the self-regeneration rule.
//!
//! The same inputs always produce byte-identical output.

use std::sync::OnceLock;

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use tracing::debug;

use crate::environment::Environment;
use crate::graph::{BuildGraph, Edge, EdgeKind};
use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, Root};
use crate::make::makefile::{Flavor, Makefile, Rule, Shell};
use crate::toolchain::Toolchain;

mod aliases;
mod compile;
pub mod directory;
mod flags;
mod install;
pub mod link;
pub mod regenerate;
pub mod testing;

/// Target building every default output.
pub const ALL_TARGET: &str = "all";

/// State shared by the edge handlers of one run.
#[derive(Debug)]
pub struct Generation<'a> {
    /// The run's environment.
    pub env: &'a Environment,
    /// The graph being translated.
    pub graph: &'a BuildGraph,
    /// Compilers and linkers for the environment.
    pub toolchain: Toolchain,
}

/// Emits the rules for one edge.
pub type EdgeHandler = fn(&Edge, &Generation<'_>, &mut Makefile) -> Result<(), MakeError>;

/// A file written next to the Makefile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryFile {
    /// Name relative to the build directory.
    pub name: Utf8PathBuf,
    /// File contents.
    pub contents: String,
}

/// Output of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Text of the Makefile.
    pub makefile: String,
    /// Files the Makefile includes.
    pub auxiliary: Vec<AuxiliaryFile>,
}

fn compile_edge(
    edge: &Edge,
    generation: &Generation<'_>,
    makefile: &mut Makefile,
) -> Result<(), MakeError> {
    match edge {
        Edge::Compile(compile) => compile::emit(compile, generation, makefile),
        other => Err(mismatched(other)),
    }
}

fn link_edge(
    edge: &Edge,
    generation: &Generation<'_>,
    makefile: &mut Makefile,
) -> Result<(), MakeError> {
    match edge {
        Edge::Link(link) => link::emit(link, generation, makefile),
        other => Err(mismatched(other)),
    }
}

fn alias_edge(
    edge: &Edge,
    _: &Generation<'_>,
    makefile: &mut Makefile,
) -> Result<(), MakeError> {
    match edge {
        Edge::Alias(alias) => aliases::emit_alias(alias, makefile),
        other => Err(mismatched(other)),
    }
}

fn command_edge(
    edge: &Edge,
    _: &Generation<'_>,
    makefile: &mut Makefile,
) -> Result<(), MakeError> {
    match edge {
        Edge::Command(command) => aliases::emit_command(command, makefile),
        other => Err(mismatched(other)),
    }
}

fn mismatched(edge: &Edge) -> MakeError {
    MakeError::UnknownEdgeType {
        kind: edge.kind().name().to_owned(),
    }
}

/// The handler for every edge kind the generator understands.
#[must_use]
pub fn default_handlers() -> &'static IndexMap<EdgeKind, EdgeHandler> {
    static HANDLERS: OnceLock<IndexMap<EdgeKind, EdgeHandler>> = OnceLock::new();
    HANDLERS.get_or_init(|| {
        let mut handlers: IndexMap<EdgeKind, EdgeHandler> = IndexMap::new();
        handlers.insert(EdgeKind::Compile, compile_edge);
        handlers.insert(EdgeKind::Link, link_edge);
        handlers.insert(EdgeKind::Alias, alias_edge);
        handlers.insert(EdgeKind::Command, command_edge);
        handlers
    })
}

/// Generate the Makefile for `graph` in `env`.
///
/// # Errors
///
/// Returns a [`MakeError`] when the graph cannot be expressed, for example
/// when two edges produce the same target or a language has no toolchain.
pub fn generate(env: &Environment, graph: &BuildGraph) -> Result<Generated, MakeError> {
    generate_with(env, graph, default_handlers())
}

/// Generate using a custom handler table.
///
/// # Errors
///
/// As [`generate`], plus [`MakeError::UnknownEdgeType`] for an edge whose
/// kind has no handler.
pub fn generate_with(
    env: &Environment,
    graph: &BuildGraph,
    handlers: &IndexMap<EdgeKind, EdgeHandler>,
) -> Result<Generated, MakeError> {
    let generation = Generation {
        env,
        graph,
        toolchain: env.toolchain(),
    };
    let mut makefile = Makefile::new();

    declare_roots(env, &mut makefile)?;
    makefile.rule(
        Rule::new([Fragment::literal(ALL_TARGET)])
            .deps(&graph.defaults)
            .phony(),
    )?;
    install::emit(&graph.install, &mut makefile)?;
    testing::emit(&graph.tests, &mut makefile)?;

    for edge in &graph.edges {
        let kind = edge.kind();
        let handler = handlers.get(&kind).ok_or_else(|| MakeError::UnknownEdgeType {
            kind: kind.name().to_owned(),
        })?;
        debug!(%kind, "emitting edge");
        handler(edge, &generation, &mut makefile)?;
    }

    directory::emit(&mut makefile)?;
    let auxiliary = regenerate::emit(&generation, &mut makefile)?;

    Ok(Generated {
        makefile: makefile.render(),
        auxiliary: auxiliary.into_iter().collect(),
    })
}

fn declare_roots(env: &Environment, makefile: &mut Makefile) -> Result<(), MakeError> {
    for root in Root::ANCHORED {
        let Some(name) = root.variable_name() else {
            continue;
        };
        let value = match root {
            Root::Source => Some(Fragment::literal(env.srcdir.as_str())),
            other => env.install_dirs.value(other),
        };
        if let Some(value) = value {
            makefile.variable(name, Shell::Line(value), Flavor::Simple, None)?;
        }
    }
    Ok(())
}
