//! Context-aware Makefile text writer.
//!
//! [`MakeWriter`] accumulates output and renders every fragment for the
//! syntactic context it is written into. Structural punctuation (`:`, `|`,
//! tabs and newlines) goes through [`MakeWriter::write_literal`] untouched.

use super::fragment::ToFragment;
use super::makefile::Shell;
use super::syntax::SyntaxContext;

/// Accumulates Makefile text.
#[derive(Debug, Default)]
pub struct MakeWriter {
    out: String,
}

impl MakeWriter {
    /// Create an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { out: String::new() }
    }

    /// Render `thing` for `context` and append it.
    pub fn write<T: ToFragment + ?Sized>(&mut self, thing: &T, context: SyntaxContext) {
        thing.to_fragment().render_into(context, &mut self.out);
    }

    /// Append `text` verbatim.
    pub fn write_literal(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Write each item separated by `delim`.
    ///
    /// `prefix` and `suffix` are only emitted when there is at least one
    /// item, so an empty prerequisite list leaves no stray separator behind.
    pub fn write_each<'a, T, I>(
        &mut self,
        things: I,
        context: SyntaxContext,
        delim: &str,
        prefix: &str,
        suffix: &str,
    ) where
        T: ToFragment + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut any = false;
        for thing in things {
            self.write_literal(if any { delim } else { prefix });
            any = true;
            self.write(thing, context);
        }
        if any {
            self.write_literal(suffix);
        }
    }

    /// Write a shell command: a whole line verbatim, or a word list with each
    /// word quoted.
    pub fn write_shell(&mut self, shell: &Shell) {
        match shell {
            Shell::Line(line) => self.write(line, SyntaxContext::ShellLine),
            Shell::Words(words) => self.write_each(words, SyntaxContext::ShellWord, " ", "", ""),
        }
    }

    /// Consume the writer, returning the accumulated text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.out
    }
}
