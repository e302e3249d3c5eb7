//! Named Makefile symbols: variables, target patterns and function calls.
//!
//! Each symbol converts into a [`Fragment`] through [`ToFragment`], which is
//! how rule generators "use" a symbol inside paths, flags and recipes.

use std::fmt;

use super::error::MakeError;
use super::fragment::{Fragment, ToFragment, concat, variable_reference};
use super::syntax::SyntaxContext;

/// A Makefile variable, identified by its sanitised name.
///
/// Whitespace, `:`, `#` and `=` cannot appear in a variable name and are
/// replaced with `_`.
///
/// ```rust
/// use mkgen::make::symbols::Variable;
/// use mkgen::make::fragment::ToFragment;
/// use mkgen::make::syntax::SyntaxContext;
///
/// let var = Variable::new("link flags");
/// assert_eq!(var.name(), "link_flags");
/// assert_eq!(var.to_fragment().render(SyntaxContext::ShellLine), "$(link_flags)");
/// assert_eq!(Variable::new("@").to_fragment().render(SyntaxContext::ShellLine), "$@");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
}

impl Variable {
    /// Create a variable handle, sanitising `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let sanitised = name
            .chars()
            .map(|ch| {
                if ch.is_whitespace() || matches!(ch, ':' | '#' | '=') {
                    '_'
                } else {
                    ch
                }
            })
            .collect();
        Self { name: sanitised }
    }

    /// The sanitised name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&Variable> for Variable {
    fn from(var: &Variable) -> Self {
        var.clone()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl ToFragment for Variable {
    fn to_fragment(&self) -> Fragment {
        Fragment::Escaped(variable_reference(&self.name))
    }
}

/// A target template with exactly one `%` wildcard.
///
/// `\%` denotes a literal percent sign, following make's own rules: a run of
/// backslashes before a `%` quotes it when the run is odd, and each pair of
/// backslashes in the run stands for one literal backslash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    template: String,
    prefix: String,
    suffix: String,
}

impl Pattern {
    /// Parse `template`.
    ///
    /// # Errors
    ///
    /// Returns [`MakeError::InvalidPattern`] unless the template holds exactly
    /// one unescaped wildcard.
    ///
    /// ```rust
    /// use mkgen::make::symbols::Pattern;
    ///
    /// assert!(Pattern::new("%.o").is_ok());
    /// assert!(Pattern::new("abc").is_err());
    /// assert!(Pattern::new("a%b%c").is_err());
    /// ```
    pub fn new(template: &str) -> Result<Self, MakeError> {
        let mut halves = vec![String::new()];
        let mut backslashes = 0usize;
        for ch in template.chars() {
            if ch == '\\' {
                backslashes += 1;
                continue;
            }
            let current = halves.last_mut().ok_or_else(|| MakeError::InvalidPattern {
                template: template.to_owned(),
                found: 0,
            })?;
            if ch == '%' {
                current.extend(std::iter::repeat_n('\\', backslashes >> 1));
                if backslashes & 1 == 1 {
                    current.push('%');
                } else {
                    halves.push(String::new());
                }
            } else {
                current.extend(std::iter::repeat_n('\\', backslashes));
                current.push(ch);
            }
            backslashes = 0;
        }
        if let Some(current) = halves.last_mut() {
            current.extend(std::iter::repeat_n('\\', backslashes));
        }
        let found = halves.len() - 1;
        let mut parts = halves.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => Ok(Self {
                template: template.to_owned(),
                prefix,
                suffix,
            }),
            _ => Err(MakeError::InvalidPattern {
                template: template.to_owned(),
                found,
            }),
        }
    }

    /// The `%` pattern matching every target.
    #[must_use]
    pub fn any() -> Self {
        Self {
            template: "%".to_owned(),
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    /// Template as supplied.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl ToFragment for Pattern {
    /// Literal halves around an unescaped wildcard, so a `%` inside either
    /// half is escaped like any other literal.
    fn to_fragment(&self) -> Fragment {
        let mut parts = Vec::with_capacity(4);
        // A backslash run ending the prefix must be doubled or it would
        // quote the wildcard.
        let body = self.prefix.trim_end_matches('\\');
        let trailing = self.prefix.len() - body.len();
        if !body.is_empty() {
            parts.push(Fragment::literal(body));
        }
        if trailing > 0 {
            parts.push(Fragment::escaped("\\".repeat(trailing << 1)));
        }
        parts.push(Fragment::escaped("%"));
        if !self.suffix.is_empty() {
            parts.push(Fragment::literal(self.suffix.as_str()));
        }
        concat(parts)
    }
}

/// A call to a built-in make function such as `$(patsubst ...)`.
///
/// Each argument is a list of fragments joined by spaces and rendered in the
/// function-argument context.
///
/// ```rust
/// use mkgen::make::fragment::{Fragment, ToFragment};
/// use mkgen::make::symbols::Function;
/// use mkgen::make::syntax::SyntaxContext;
///
/// let call = Function::new("dir").arg([Fragment::escaped("$@")]);
/// assert_eq!(call.to_fragment().render(SyntaxContext::ShellLine), "$(dir $@)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    name: String,
    args: Vec<Vec<Fragment>>,
}

impl Function {
    /// Start a call to `name` with no arguments.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            args: Vec::new(),
        }
    }

    /// Append one argument made of space-separated `words`.
    #[must_use]
    pub fn arg(mut self, words: impl IntoIterator<Item = Fragment>) -> Self {
        self.args.push(words.into_iter().collect());
        self
    }
}

impl ToFragment for Function {
    fn to_fragment(&self) -> Fragment {
        let mut out = format!("$({} ", self.name);
        for (idx, words) in self.args.iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            for (pos, word) in words.iter().enumerate() {
                if pos > 0 {
                    out.push(' ');
                }
                word.render_into(SyntaxContext::FunctionArgument, &mut out);
            }
        }
        out.push(')');
        Fragment::Escaped(out)
    }
}

/// An indirect invocation of a macro variable, `$(call NAME,args...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    function: Function,
}

impl Call {
    /// Invoke the macro held in `var`.
    #[must_use]
    pub fn new(var: &Variable) -> Self {
        Self {
            function: Function::new("call").arg([Fragment::literal(var.name())]),
        }
    }

    /// Append one argument made of space-separated `words`; inside the macro
    /// it is available as `$1`, `$2`, and so on.
    #[must_use]
    pub fn arg(mut self, words: impl IntoIterator<Item = Fragment>) -> Self {
        self.function = self.function.arg(words);
        self
    }
}

impl ToFragment for Call {
    fn to_fragment(&self) -> Fragment {
        self.function.to_fragment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make::fragment::PathRef;
    use rstest::rstest;

    #[rstest]
    #[case("CFLAGS", "CFLAGS")]
    #[case("a b:c#d=e", "a_b_c_d_e")]
    #[case("tab\tname", "tab_name")]
    fn sanitises_names(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(Variable::new(raw).name(), expected);
    }

    #[rstest]
    #[case("abc", 0)]
    #[case("a%b%c", 2)]
    #[case(r"a\%c", 0)]
    fn rejects_patterns_without_exactly_one_wildcard(#[case] template: &str, #[case] found: usize) {
        let err = Pattern::new(template).expect_err("invalid pattern");
        assert_eq!(
            err,
            MakeError::InvalidPattern {
                template: template.to_owned(),
                found
            }
        );
    }

    #[test]
    fn pattern_use_interleaves_literals_and_wildcard() {
        let pattern = Pattern::new("a%c").expect("pattern");
        assert_eq!(
            pattern.to_fragment(),
            Fragment::Concat(vec![
                Fragment::literal("a"),
                Fragment::escaped("%"),
                Fragment::literal("c"),
            ])
        );
        assert_eq!(pattern.to_fragment().render(SyntaxContext::Target), "a%c");
    }

    #[test]
    fn escaped_percent_stays_literal() {
        let pattern = Pattern::new(r"50\%/%.txt").expect("pattern");
        assert_eq!(
            pattern.to_fragment().render(SyntaxContext::Target),
            r"50\%/%.txt"
        );
    }

    #[test]
    fn backslashes_before_the_wildcard_stay_literal() {
        let pattern = Pattern::new(r"a\\%b").expect("pattern");
        assert_eq!(
            pattern.to_fragment().render(SyntaxContext::Target),
            r"a\\%b"
        );
        let trailing = Pattern::new(r"dir\\\\%").expect("pattern");
        assert_eq!(
            trailing.to_fragment().render(SyntaxContext::Target),
            r"dir\\\\%"
        );
    }

    #[test]
    fn patterns_compare_by_template() {
        let a = Pattern::new("%.o").expect("pattern");
        let b = Pattern::new("%.o").expect("pattern");
        assert_eq!(a, b);
        assert_ne!(a, Pattern::new("%.obj").expect("pattern"));
        assert_eq!(Pattern::any(), Pattern::new("%").expect("pattern"));
    }

    #[test]
    fn function_arguments_are_quoted_and_separated() {
        let pattern = Pattern::new("%/.dir").expect("pattern");
        let call = Function::new("patsubst")
            .arg([pattern.to_fragment()])
            .arg([Pattern::any().to_fragment()])
            .arg([Variable::new("@").to_fragment()]);
        assert_eq!(
            call.to_fragment().render(SyntaxContext::ShellLine),
            "$(patsubst %/.dir,%,$@)"
        );
    }

    #[test]
    fn call_invokes_macro_with_word_lists() {
        let call = Call::new(&Variable::new("RULE_LINK_CC"))
            .arg([
                Fragment::from(PathRef::build("a.o")),
                Fragment::from(PathRef::build("b.o")),
            ])
            .arg([Fragment::from(PathRef::build("prog"))]);
        assert_eq!(
            call.to_fragment().render(SyntaxContext::ShellLine),
            "$(call RULE_LINK_CC,a.o b.o,prog)"
        );
    }
}
