//! Syntactic contexts and the escaping rules attached to them.
//!
//! Make reads the same text differently depending on where it appears: a
//! `#` starts a comment in a target list, a `|` separates order-only
//! prerequisites, and recipe lines are handed to the shell after variable
//! expansion. [`escape`] turns a literal value into text that make (and,
//! for recipe contexts, the shell) reads back as the original value.

use std::fmt;
use std::str::FromStr;

use super::error::MakeError;
use super::shell;

/// Position in the Makefile a fragment is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxContext {
    /// A rule target or the left-hand side of a target-specific variable.
    Target,
    /// A prerequisite (normal or order-only).
    Dependency,
    /// A single shell argument inside a recipe or variable value.
    ShellWord,
    /// A complete shell command line, emitted without quoting.
    ShellLine,
    /// One argument of a make function call such as `$(patsubst ...)`.
    FunctionArgument,
}

impl SyntaxContext {
    /// Name used when parsing contexts from text.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::Dependency => "dependency",
            Self::ShellWord => "shell-word",
            Self::ShellLine => "shell-line",
            Self::FunctionArgument => "function-argument",
        }
    }
}

impl fmt::Display for SyntaxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SyntaxContext {
    type Err = MakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "target" => Ok(Self::Target),
            "dependency" => Ok(Self::Dependency),
            "shell-word" => Ok(Self::ShellWord),
            "shell-line" => Ok(Self::ShellLine),
            "function-argument" => Ok(Self::FunctionArgument),
            other => Err(MakeError::UnsupportedSyntax {
                syntax: other.to_owned(),
            }),
        }
    }
}

/// Escape literal `text` for `context`.
///
/// `$` is always doubled. Target and dependency contexts then backslash
/// escape make's special characters, doubling any backslashes that precede
/// them; shell contexts quote the result as a shell word.
///
/// `%` is only special on the target side: explicit prerequisites take it
/// literally and keep any backslash written before it.
///
/// # Examples
/// ```rust
/// use mkgen::make::syntax::{SyntaxContext, escape};
///
/// assert_eq!(escape("a b", SyntaxContext::Target), r"a\ b");
/// assert_eq!(escape("a|b", SyntaxContext::Dependency), r"a\|b");
/// assert_eq!(escape("$HOME", SyntaxContext::ShellLine), "$$HOME");
/// ```
#[must_use]
pub fn escape(text: &str, context: SyntaxContext) -> String {
    let doubled = text.replace('$', "$$");
    match context {
        SyntaxContext::Target => escape_specials(&doubled, is_target_special),
        SyntaxContext::Dependency => escape_specials(&doubled, is_dependency_special),
        SyntaxContext::ShellLine => doubled,
        SyntaxContext::ShellWord => shell::quote(&doubled),
        SyntaxContext::FunctionArgument => shell::quote(&doubled.replace(',', "$,")),
    }
}

fn is_word_special(ch: char) -> bool {
    matches!(ch, '#' | '?' | '*' | '[' | ']' | '~') || ch.is_whitespace()
}

fn is_target_special(ch: char) -> bool {
    ch == '%' || is_word_special(ch)
}

fn is_dependency_special(ch: char) -> bool {
    ch == '|' || is_word_special(ch)
}

/// Prefix each special character with a backslash. A run of backslashes
/// directly before a special character is doubled so it stays literal.
fn escape_specials(text: &str, special: fn(char) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut backslashes = 0usize;
    for ch in text.chars() {
        if ch == '\\' {
            backslashes += 1;
            continue;
        }
        let run = if special(ch) {
            backslashes * 2 + 1
        } else {
            backslashes
        };
        out.extend(std::iter::repeat_n('\\', run));
        out.push(ch);
        backslashes = 0;
    }
    out.extend(std::iter::repeat_n('\\', backslashes));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain.o", "plain.o")]
    #[case("has space", r"has\ space")]
    #[case("tab\there", "tab\\\there")]
    #[case("hash#mark", r"hash\#mark")]
    #[case("per%cent", r"per\%cent")]
    #[case("glob*?[]~", r"glob\*\?\[\]\~")]
    #[case("dollar$sign", "dollar$$sign")]
    #[case(r"back\#slash", r"back\\\#slash")]
    #[case(r"trailing\", r"trailing\")]
    #[case("pipe|kept", "pipe|kept")]
    fn escapes_targets(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape(input, SyntaxContext::Target), expected);
    }

    #[rstest]
    #[case("pipe|escaped", r"pipe\|escaped")]
    #[case(r"a\\|b", r"a\\\\\|b")]
    #[case("x y", r"x\ y")]
    #[case("pct%name", "pct%name")]
    #[case(r"a\%b", r"a\%b")]
    #[case("glob*?[]~", r"glob\*\?\[\]\~")]
    fn escapes_dependencies(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape(input, SyntaxContext::Dependency), expected);
    }

    #[test]
    fn shell_line_only_doubles_dollars() {
        let line = "echo '$x' # not a comment";
        assert_eq!(
            escape(line, SyntaxContext::ShellLine),
            "echo '$$x' # not a comment"
        );
    }

    #[test]
    fn function_arguments_escape_commas() {
        assert_eq!(escape("a,b", SyntaxContext::FunctionArgument).matches("$,").count(), 1);
    }

    #[rstest]
    #[case("target", SyntaxContext::Target)]
    #[case("dependency", SyntaxContext::Dependency)]
    #[case("shell-word", SyntaxContext::ShellWord)]
    #[case("shell-line", SyntaxContext::ShellLine)]
    #[case("function-argument", SyntaxContext::FunctionArgument)]
    fn parses_context_names(#[case] name: &str, #[case] expected: SyntaxContext) {
        assert_eq!(name.parse::<SyntaxContext>(), Ok(expected));
        assert_eq!(expected.to_string(), name);
    }

    #[test]
    fn rejects_unknown_context() {
        let err = "recipe".parse::<SyntaxContext>().expect_err("unknown context");
        assert_eq!(
            err,
            MakeError::UnsupportedSyntax {
                syntax: "recipe".into()
            }
        );
    }
}
