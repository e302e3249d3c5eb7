//! Self-regeneration of the Makefile.
//!
//! The Makefile depends on the build description, so editing it reruns
//! the generator before anything else is built. Directories scanned while
//! evaluating the description are listed in an auxiliary makefile: adding
//! or removing a file changes a directory's mtime and triggers the same
//! regeneration, and each directory also gets an empty rule so deleting it
//! does not stop make.

use tracing::debug;

use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, PathRef};
use crate::make::makefile::{Makefile, Rule, Shell};
use crate::make::syntax::SyntaxContext;
use crate::make::writer::MakeWriter;

use super::{AuxiliaryFile, Generation};

/// Name of the generated Makefile.
pub const MAKEFILE: &str = "Makefile";

/// Auxiliary makefile listing the scanned source directories.
pub const FIND_DEPS_FILE: &str = ".mkgen-find-deps";

pub(super) fn emit(
    generation: &Generation<'_>,
    makefile: &mut Makefile,
) -> Result<Option<AuxiliaryFile>, MakeError> {
    let auxiliary = find_deps(&generation.graph.find_dirs);
    if auxiliary.is_some() {
        makefile.include(PathRef::build(FIND_DEPS_FILE), false);
    }
    let env = generation.env;
    makefile.rule(
        Rule::new([Fragment::literal(MAKEFILE)])
            .deps([env.description_ref()])
            .recipe(vec![Shell::Words(vec![
                Fragment::literal(env.generator.as_str()),
                Fragment::literal("regenerate"),
                Fragment::literal("."),
            ])]),
    )?;
    Ok(auxiliary)
}

fn find_deps(dirs: &[PathRef]) -> Option<AuxiliaryFile> {
    if dirs.is_empty() {
        return None;
    }
    debug!(count = dirs.len(), "listing scanned directories");
    let mut out = MakeWriter::new();
    out.write_literal(MAKEFILE);
    out.write_literal(":");
    out.write_each(dirs, SyntaxContext::Dependency, " ", " ", "");
    out.write_literal("\n\n");
    for dir in dirs {
        out.write(dir, SyntaxContext::Target);
        out.write_literal(":\n");
    }
    Some(AuxiliaryFile {
        name: FIND_DEPS_FILE.into(),
        contents: out.into_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make::fragment::Root;

    #[test]
    fn scanned_directories_are_listed() {
        let dirs = vec![
            PathRef::new(Root::Source, "src"),
            PathRef::new(Root::Source, "my dir"),
        ];
        let aux = find_deps(&dirs).expect("auxiliary file");
        assert_eq!(aux.name.as_str(), FIND_DEPS_FILE);
        assert_eq!(
            aux.contents,
            "Makefile: $(srcdir)/src $(srcdir)/my\\ dir\n\n$(srcdir)/src:\n$(srcdir)/my\\ dir:\n"
        );
    }

    #[test]
    fn no_scanned_directories_means_no_file() {
        assert!(find_deps(&[]).is_none());
    }
}
