//! Shared command and flag variables.
//!
//! Every tool gets one command variable (`CC := cc`) and a two-level flag
//! layout: `GLOBAL_CFLAGS` holds the defaults, and a `%`-scoped `CFLAGS`
//! refers to it. Rules needing extra flags override `CFLAGS` for their own
//! target only. Both levels are created by the first generator asking for
//! them and reused afterwards.

use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, ToFragment};
use crate::make::makefile::{Flavor, Makefile, Shell};
use crate::make::symbols::{Pattern, Variable};

/// Shell words for plain string arguments.
pub(super) fn literal_words<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Vec<Fragment> {
    items
        .into_iter()
        .map(|item| Fragment::literal(item.as_ref()))
        .collect()
}

/// The command variable `NAME := command`, declared once.
pub(super) fn cmd_var(
    makefile: &mut Makefile,
    command_var: &str,
    command_name: &str,
) -> Result<Variable, MakeError> {
    makefile.variable_or_existing(
        command_var.to_uppercase().as_str(),
        Shell::Line(Fragment::literal(command_name)),
        Flavor::Simple,
        None,
    )
}

/// The `GLOBAL_NAME` variable and the `%`-scoped `NAME` referring to it.
pub(super) fn flags_vars(
    makefile: &mut Makefile,
    name: &str,
    value: Vec<Fragment>,
) -> Result<(Variable, Variable), MakeError> {
    let upper = name.to_uppercase();
    let global = makefile.variable_or_existing(
        format!("GLOBAL_{upper}").as_str(),
        Shell::Words(value),
        Flavor::Simple,
        None,
    )?;
    let scoped = makefile.variable_or_existing(
        upper.as_str(),
        Shell::Words(vec![global.to_fragment()]),
        Flavor::Simple,
        Some(&Pattern::any()),
    )?;
    Ok((global, scoped))
}
