//! Link edges: executables, shared libraries and static archives.
//!
//! Linking goes through a one-line `RULE_<LINKER>` macro taking the inputs
//! as `$1` and the output as `$2`. A link producing both a DLL and its
//! import library runs once through a stamp file: the real outputs depend
//! on `<output>.stamp`, and only the stamp rule carries the recipe.

use tracing::debug;

use crate::graph::LinkEdge;
use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, PathRef, ToFragment};
use crate::make::makefile::{Makefile, Rule, Shell};
use crate::make::symbols::{Call, Variable};
use crate::toolchain::{LinkCommand, LinkMode, Linker, uniques};

use super::Generation;
use super::compile::recipe_variable;
use super::directory::sentinel;
use super::flags::{cmd_var, flags_vars, literal_words};

/// Extension of the stamp file standing in for a multi-output link.
pub const STAMP_EXT: &str = ".stamp";

pub(super) fn emit(
    edge: &LinkEdge,
    generation: &Generation<'_>,
    makefile: &mut Makefile,
) -> Result<(), MakeError> {
    let linker = generation.toolchain.linker(&edge.lang, edge.mode)?;
    let recipe = recipe_variable(linker.rule_name());

    let mut global_args = linker.global_args();
    if edge.mode != LinkMode::StaticLibrary {
        global_args.extend(generation.graph.global_link_options.iter().cloned());
    }
    let (global_flags, flags) =
        flags_vars(makefile, linker.flags_var(), literal_words(global_args))?;

    let mut overrides: Vec<(Variable, Vec<Fragment>)> = Vec::new();
    let mut flag_values = linker.mode_args();
    let mut libs_var = None;
    if edge.mode != LinkMode::StaticLibrary {
        flag_values.extend(literal_words(&edge.options));
        flag_values.extend(linker.lib_dirs(&edge.libs));
        flag_values.extend(linker.rpath(&edge.libs, &edge.output));
    }
    if let Some(import_library) = &edge.import_library {
        flag_values.extend(linker.import_lib(import_library)?);
    }
    if let Some(name) = linker.libs_var() {
        let (global_libs, libs) =
            flags_vars(makefile, name, literal_words(linker.global_libs()))?;
        if !edge.libs.is_empty() {
            let mut value = vec![global_libs.to_fragment()];
            for lib in &edge.libs {
                value.extend(linker.link_lib(lib)?);
            }
            overrides.push((libs.clone(), value));
        }
        libs_var = Some(libs);
    }
    if !flag_values.is_empty() {
        let value = std::iter::once(global_flags.to_fragment()).chain(flag_values).collect();
        overrides.insert(0, (flags.clone(), value));
    }

    if !makefile.has_variable(&recipe, None) {
        define_recipe(linker.as_ref(), &recipe, &flags, libs_var.as_ref(), makefile)?;
    }
    let call = Call::new(&recipe)
        .arg(edge.files.iter().map(Fragment::from))
        .arg([Fragment::from(&edge.output)]);

    let outputs = edge.outputs();
    let mut rule = if outputs.len() > 1 {
        let stamp = edge.output.add_ext(STAMP_EXT);
        debug!(stamp = %stamp.path, "collapsing link outputs behind stamp");
        makefile.rule(Rule::new(outputs.iter().copied()).deps([&stamp]))?;
        Rule::new([stamp]).recipe(vec![
            Shell::Line(call.to_fragment()),
            Shell::Words(vec![
                Fragment::escaped("@touch"),
                Variable::new("@").to_fragment(),
            ]),
        ])
    } else {
        Rule::new([edge.output.clone()]).shared_recipe(&call)
    };

    let generated_libs = edge.libs.iter().filter(|lib| lib.generated).map(|lib| &lib.path);
    rule = rule.deps(edge.files.iter().chain(generated_libs).chain(&edge.extra_deps));
    let dirs: Vec<PathRef> = uniques(outputs.iter().map(|output| output.parent()))
        .into_iter()
        .filter(|dir| !dir.is_root())
        .map(|dir| sentinel(&dir))
        .collect();
    rule = rule.order_only(dirs);
    for (var, value) in overrides {
        rule = rule.variable(var, Shell::Words(value));
    }
    makefile.rule(rule)
}

fn define_recipe(
    linker: &dyn Linker,
    recipe: &Variable,
    flags: &Variable,
    libs: Option<&Variable>,
    makefile: &mut Makefile,
) -> Result<(), MakeError> {
    debug!(recipe = %recipe, "defining link recipe");
    let cmd = cmd_var(makefile, linker.command_var(), linker.command_name())?;
    let command = linker.command(LinkCommand {
        cmd: cmd.to_fragment(),
        inputs: Variable::new("1").to_fragment(),
        output: Variable::new("2").to_fragment(),
        libs: libs.map(|var| var.to_fragment()),
        args: vec![flags.to_fragment()],
    });
    makefile.define(recipe.clone(), vec![Shell::Words(command)])?;
    Ok(())
}
