//! Compile edges: one object-file rule per source file.
//!
//! The compiler invocation lives in a shared `RULE_<COMPILER>` macro, so the
//! number of recipe bodies grows with the number of compilers rather than
//! the number of sources. Per-file flags go into a target-specific override
//! of the pattern-scoped flags variable.

use tracing::debug;

use crate::graph::CompileEdge;
use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, ToFragment, concat};
use crate::make::makefile::{Makefile, Rule, Shell};
use crate::make::symbols::Variable;
use crate::toolchain::{CompileCommand, Compiler, Deps, DepsFlavor};

use super::Generation;
use super::directory::sentinel;
use super::flags::{cmd_var, flags_vars, literal_words};

/// Name of the shared recipe macro for a tool.
pub(super) fn recipe_variable(rule_name: &str) -> Variable {
    Variable::new(&format!("RULE_{}", rule_name.to_uppercase()))
}

pub(super) fn emit(
    edge: &CompileEdge,
    generation: &Generation<'_>,
    makefile: &mut Makefile,
) -> Result<(), MakeError> {
    let compiler = generation.toolchain.compiler(&edge.lang)?;
    let recipe = recipe_variable(compiler.rule_name());

    let mut global_args = compiler.global_args();
    if let Some(options) = generation.graph.global_options.get(&edge.lang) {
        global_args.extend(options.iter().cloned());
    }
    let (global_flags, flags) =
        flags_vars(makefile, compiler.flags_var(), literal_words(global_args))?;

    let mut extra = Vec::new();
    if edge.in_shared_library {
        extra.extend(compiler.library_args());
    }
    for dir in &edge.include {
        extra.extend(compiler.include_dir(dir));
    }
    extra.extend(literal_words(&edge.options));

    if !makefile.has_variable(&recipe, None) {
        define_recipe(compiler.as_ref(), &recipe, &flags, makefile)?;
    }

    let mut rule = Rule::new([edge.output.clone()])
        .deps(std::iter::once(&edge.source).chain(&edge.extra_deps))
        .shared_recipe(&recipe);
    if !extra.is_empty() {
        let value = std::iter::once(global_flags.to_fragment()).chain(extra).collect();
        rule = rule.variable(flags, Shell::Words(value));
    }
    let dir = edge.output.parent();
    if !dir.is_root() {
        rule = rule.order_only([sentinel(&dir)]);
    }
    makefile.rule(rule)?;

    if compiler.deps_flavor() == DepsFlavor::Gcc {
        makefile.include(edge.output.add_ext(".d"), true);
    }
    Ok(())
}

fn define_recipe(
    compiler: &dyn Compiler,
    recipe: &Variable,
    flags: &Variable,
    makefile: &mut Makefile,
) -> Result<(), MakeError> {
    debug!(recipe = %recipe, "defining compile recipe");
    let cmd = cmd_var(makefile, compiler.command_var(), compiler.command_name())?;
    let target = Variable::new("@").to_fragment();
    let (deps, filter) = match compiler.deps_flavor() {
        DepsFlavor::Gcc => {
            let depfile = concat([target.clone(), Fragment::literal(".d")]);
            (Deps::File(depfile.clone()), depfile_filter(&depfile))
        }
        DepsFlavor::Msvc => (Deps::Inline, Vec::new()),
        DepsFlavor::None => (Deps::None, Vec::new()),
    };
    let command = compiler.command(CompileCommand {
        cmd: cmd.to_fragment(),
        input: Variable::new("<").to_fragment(),
        output: target,
        deps,
        args: vec![flags.to_fragment()],
    });
    let mut lines = vec![Shell::Words(command)];
    lines.extend(filter);
    makefile.define(recipe.clone(), lines)?;
    Ok(())
}

/// Append every header named in `depfile` as a target with no
/// prerequisites, so deleting a header does not break the next build.
fn depfile_filter(depfile: &Fragment) -> Vec<Shell> {
    vec![
        Shell::Line(concat([
            Fragment::literal(r"@sed -e 's/.*://' -e 's/\\$//' < "),
            depfile.clone(),
            Fragment::literal(r" | fmt -1 | \"),
        ])),
        Shell::Line(concat([
            Fragment::literal("  sed -e 's/^ *//' -e 's/$/:/' >> "),
            depfile.clone(),
        ])),
    ]
}
