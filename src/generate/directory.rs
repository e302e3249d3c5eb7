//! Directory sentinels.
//!
//! Rules writing into a subdirectory take `<dir>/.dir` as an order-only
//! prerequisite. A single pattern rule creates any such directory and
//! touches the sentinel, so newly created siblings never trigger rebuilds.

use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, PathRef, ToFragment};
use crate::make::makefile::{Makefile, Rule, Shell};
use crate::make::symbols::{Function, Pattern, Variable};

/// File name of the sentinel marking a created directory.
pub const DIR_SENTINEL: &str = ".dir";

/// The sentinel of `dir`.
#[must_use]
pub fn sentinel(dir: &PathRef) -> PathRef {
    dir.join(DIR_SENTINEL)
}

pub(super) fn emit(makefile: &mut Makefile) -> Result<(), MakeError> {
    let pattern = Pattern::new(&format!("%/{DIR_SENTINEL}"))?;
    let dir = Function::new("patsubst")
        .arg([pattern.to_fragment()])
        .arg([Fragment::escaped("%")])
        .arg([Variable::new("@").to_fragment()]);
    makefile.rule(Rule::new([pattern.to_fragment()]).recipe(vec![
        Shell::Words(vec![
            Fragment::escaped("@mkdir"),
            Fragment::literal("-p"),
            dir.to_fragment(),
        ]),
        Shell::Words(vec![
            Fragment::escaped("@touch"),
            Variable::new("@").to_fragment(),
        ]),
    ]))
}
