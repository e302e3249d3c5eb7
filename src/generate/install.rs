//! The `install` target.

use crate::graph::{Install, InstallKind};
use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, ToFragment, concat};
use crate::make::makefile::{Flavor, Makefile, Rule, Shell};
use crate::make::symbols::Variable;
use crate::make::syntax::SyntaxContext;

fn install_command(makefile: &mut Makefile, kind: InstallKind) -> Result<Variable, MakeError> {
    let install = makefile.variable_or_existing(
        "INSTALL",
        Shell::Line(Fragment::literal("install")),
        Flavor::Simple,
        None,
    )?;
    let (name, mode) = match kind {
        InstallKind::Program => ("INSTALL_PROGRAM", "755"),
        InstallKind::Data => ("INSTALL_DATA", "644"),
    };
    makefile.variable_or_existing(
        name,
        Shell::Line(concat([
            install.to_fragment(),
            Fragment::literal(format!(" -m {mode}")),
        ])),
        Flavor::Simple,
        None,
    )
}

pub(super) fn emit(install: &Install, makefile: &mut Makefile) -> Result<(), MakeError> {
    if install.is_empty() {
        return Ok(());
    }
    let mut recipe = Vec::with_capacity(install.files.len() + install.directories.len());
    for file in &install.files {
        let command = install_command(makefile, file.kind)?;
        recipe.push(Shell::Words(vec![
            command.to_fragment(),
            Fragment::literal("-D"),
            Fragment::from(&file.path),
            Fragment::from(file.path.reroot(file.root)),
        ]));
    }
    for dir in &install.directories {
        let src = Fragment::from(&dir.path).render(SyntaxContext::ShellWord);
        let dst = Fragment::from(dir.path.reroot(dir.root)).render(SyntaxContext::ShellWord);
        recipe.push(Shell::Line(Fragment::escaped(format!(
            "mkdir -p {dst} && cp -r {src}/* {dst}"
        ))));
    }
    makefile.rule(
        Rule::new([Fragment::literal("install")])
            .deps([Fragment::literal("all")])
            .recipe(recipe)
            .phony(),
    )
}
