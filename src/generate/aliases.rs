//! Alias and command edges, both emitted as phony rules.

use crate::graph::{AliasEdge, CommandEdge, CommandLine};
use crate::make::error::MakeError;
use crate::make::fragment::Fragment;
use crate::make::makefile::{Makefile, Rule, Shell};

use super::flags::literal_words;

pub(super) fn emit_alias(edge: &AliasEdge, makefile: &mut Makefile) -> Result<(), MakeError> {
    makefile.rule(Rule::new([&edge.target]).deps(&edge.deps).phony())
}

pub(super) fn emit_command(edge: &CommandEdge, makefile: &mut Makefile) -> Result<(), MakeError> {
    let recipe = edge.commands.iter().map(shell_command).collect();
    makefile.rule(
        Rule::new([&edge.target])
            .deps(&edge.deps)
            .recipe(recipe)
            .phony(),
    )
}

/// A command line from the graph: strings pass through as shell syntax,
/// word lists are quoted word by word.
pub(super) fn shell_command(line: &CommandLine) -> Shell {
    match line {
        CommandLine::Line(text) => Shell::Line(Fragment::literal(text.as_str())),
        CommandLine::Words(words) => Shell::Words(literal_words(words)),
    }
}
