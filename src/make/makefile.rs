//! The Makefile object model.
//!
//! A [`Makefile`] owns global variables, pattern-scoped variables, macro
//! definitions, an ordered list of [`Rule`]s and include directives. All
//! naming and uniqueness invariants are checked when something is added, so a
//! model that was built without error always serialises to a valid file.
//! Serialisation order is fixed and otherwise follows insertion order.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use super::error::MakeError;
use super::fragment::{Fragment, ToFragment};
use super::symbols::{Pattern, Variable};
use super::syntax::SyntaxContext;
use super::writer::MakeWriter;

/// A shell command or variable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shell {
    /// A complete command line emitted without quoting.
    Line(Fragment),
    /// Separate arguments, each quoted as one shell word.
    Words(Vec<Fragment>),
}

impl From<Fragment> for Shell {
    fn from(line: Fragment) -> Self {
        Self::Line(line)
    }
}

impl From<Vec<Fragment>> for Shell {
    fn from(words: Vec<Fragment>) -> Self {
        Self::Words(words)
    }
}

impl From<&str> for Shell {
    fn from(line: &str) -> Self {
        Self::Line(Fragment::literal(line))
    }
}

/// How a variable is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flavor {
    /// Expanded once at definition, written with `:=`.
    #[default]
    Simple,
    /// Expanded at every use, written with `=`.
    Recursive,
    /// A `define ... endef` macro block.
    Define,
}

impl Flavor {
    const fn assignment(self) -> Option<Assignment> {
        match self {
            Self::Simple => Some(Assignment::Simple),
            Self::Recursive => Some(Assignment::Recursive),
            Self::Define => None,
        }
    }
}

/// Assignment operator of a stored variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assignment {
    Simple,
    Recursive,
}

impl Assignment {
    const fn operator(self) -> &'static str {
        match self {
            Self::Simple => " := ",
            Self::Recursive => " = ",
        }
    }
}

/// Commands run to bring a rule's targets up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipe {
    /// Command lines written under the rule, one per tab-indented line.
    Inline(Vec<Shell>),
    /// A reference to a shared macro, written on the rule line after `;`.
    Shared(Fragment),
}

/// A rule under construction.
///
/// ```rust
/// use mkgen::make::fragment::PathRef;
/// use mkgen::make::makefile::{Makefile, Rule};
///
/// let mut makefile = Makefile::new();
/// makefile
///     .rule(Rule::new([PathRef::build("all")]).deps([PathRef::build("prog")]).phony())
///     .expect("fresh target");
/// assert!(makefile.render().contains(".PHONY: all\nall: prog\n"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    targets: Vec<Fragment>,
    deps: Vec<Fragment>,
    order_only: Vec<Fragment>,
    recipe: Option<Recipe>,
    variables: IndexMap<Variable, Shell>,
    phony: bool,
}

impl Rule {
    /// Start a rule producing `targets`.
    pub fn new<T: Into<Fragment>>(targets: impl IntoIterator<Item = T>) -> Self {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            deps: Vec::new(),
            order_only: Vec::new(),
            recipe: None,
            variables: IndexMap::new(),
            phony: false,
        }
    }

    /// Append normal prerequisites.
    #[must_use]
    pub fn deps<T: Into<Fragment>>(mut self, deps: impl IntoIterator<Item = T>) -> Self {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Append order-only prerequisites.
    #[must_use]
    pub fn order_only<T: Into<Fragment>>(mut self, deps: impl IntoIterator<Item = T>) -> Self {
        self.order_only.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Use `commands` as an inline recipe.
    #[must_use]
    pub fn recipe(mut self, commands: Vec<Shell>) -> Self {
        self.recipe = Some(Recipe::Inline(commands));
        self
    }

    /// Use a shared macro (or macro call) as the recipe.
    #[must_use]
    pub fn shared_recipe(mut self, recipe: &impl ToFragment) -> Self {
        self.recipe = Some(Recipe::Shared(recipe.to_fragment()));
        self
    }

    /// Override `var` for this rule's targets only.
    #[must_use]
    pub fn variable(mut self, var: Variable, value: impl Into<Shell>) -> Self {
        self.variables.insert(var, value.into());
        self
    }

    /// Mark the targets as phony.
    #[must_use]
    pub const fn phony(mut self) -> Self {
        self.phony = true;
        self
    }

    /// Targets produced by the rule.
    #[must_use]
    pub fn targets(&self) -> &[Fragment] {
        &self.targets
    }

    /// Normal prerequisites.
    #[must_use]
    pub fn dependencies(&self) -> &[Fragment] {
        &self.deps
    }

    /// Order-only prerequisites.
    #[must_use]
    pub fn order_only_dependencies(&self) -> &[Fragment] {
        &self.order_only
    }

    /// The recipe, if any.
    #[must_use]
    pub const fn recipe_body(&self) -> Option<&Recipe> {
        self.recipe.as_ref()
    }

    /// Whether the targets are phony.
    #[must_use]
    pub const fn is_phony(&self) -> bool {
        self.phony
    }
}

/// An `include` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// File to include.
    pub name: Fragment,
    /// Whether a missing file is tolerated (`-include`).
    pub optional: bool,
}

type VariableTable = IndexMap<Variable, (Shell, Assignment)>;

/// The Makefile being generated.
#[derive(Debug, Clone)]
pub struct Makefile {
    globals: VariableTable,
    scoped: IndexMap<Pattern, VariableTable>,
    defines: IndexMap<Variable, Vec<Shell>>,
    rules: Vec<Rule>,
    targets: HashSet<String>,
    includes: Vec<Include>,
}

impl Default for Makefile {
    fn default() -> Self {
        Self::new()
    }
}

impl Makefile {
    /// Create a Makefile with the `%` scope and the `,` helper variable
    /// that function arguments use to escape commas.
    #[must_use]
    pub fn new() -> Self {
        let mut globals = VariableTable::new();
        globals.insert(Variable::new(","), (Shell::from(","), Assignment::Simple));
        let mut scoped = IndexMap::new();
        scoped.insert(Pattern::any(), VariableTable::new());
        Self {
            globals,
            scoped,
            defines: IndexMap::new(),
            rules: Vec::new(),
            targets: HashSet::new(),
            includes: Vec::new(),
        }
    }

    /// Declare a variable, globally or scoped to targets matching `scope`.
    ///
    /// A [`Flavor::Define`] variable becomes a one-line macro.
    ///
    /// # Errors
    ///
    /// Returns [`MakeError::DuplicateVariable`] when the name is taken in that
    /// scope, and [`MakeError::ScopedDefine`] for a scoped macro.
    pub fn variable(
        &mut self,
        name: impl Into<Variable>,
        value: impl Into<Shell>,
        flavor: Flavor,
        scope: Option<&Pattern>,
    ) -> Result<Variable, MakeError> {
        let var = name.into();
        self.ensure_free(&var, scope)?;
        let shell = value.into();
        match (flavor.assignment(), scope) {
            (None, Some(_)) => {
                return Err(MakeError::ScopedDefine {
                    name: var.name().to_owned(),
                });
            }
            (None, None) => {
                self.defines.insert(var.clone(), vec![shell]);
            }
            (Some(assignment), Some(pattern)) => {
                self.scoped
                    .entry(pattern.clone())
                    .or_default()
                    .insert(var.clone(), (shell, assignment));
            }
            (Some(assignment), None) => {
                self.globals.insert(var.clone(), (shell, assignment));
            }
        }
        Ok(var)
    }

    /// Declare a variable unless one with that name already exists in
    /// `scope`, returning the handle either way.
    ///
    /// # Errors
    ///
    /// Returns [`MakeError::ScopedDefine`] for a scoped macro.
    pub fn variable_or_existing(
        &mut self,
        name: impl Into<Variable>,
        value: impl Into<Shell>,
        flavor: Flavor,
        scope: Option<&Pattern>,
    ) -> Result<Variable, MakeError> {
        let var = name.into();
        if self.has_variable(&var, scope) {
            return Ok(var);
        }
        debug!(variable = %var, "declaring shared variable");
        self.variable(var, value, flavor, scope)
    }

    /// Declare a multi-line macro.
    ///
    /// # Errors
    ///
    /// Returns [`MakeError::DuplicateVariable`] when the name is taken.
    pub fn define(
        &mut self,
        name: impl Into<Variable>,
        lines: Vec<Shell>,
    ) -> Result<Variable, MakeError> {
        let var = name.into();
        self.ensure_free(&var, None)?;
        self.defines.insert(var.clone(), lines);
        Ok(var)
    }

    /// Whether `name` is declared in `scope`. Global variables and macros
    /// share one namespace.
    #[must_use]
    pub fn has_variable(&self, name: &Variable, scope: Option<&Pattern>) -> bool {
        match scope {
            Some(pattern) => self
                .scoped
                .get(pattern)
                .is_some_and(|table| table.contains_key(name)),
            None => self.globals.contains_key(name) || self.defines.contains_key(name),
        }
    }

    fn ensure_free(&self, var: &Variable, scope: Option<&Pattern>) -> Result<(), MakeError> {
        if self.has_variable(var, scope) {
            return Err(MakeError::DuplicateVariable {
                name: var.name().to_owned(),
                scope: scope.map(|p| p.template().to_owned()),
            });
        }
        Ok(())
    }

    /// Add `rule`.
    ///
    /// All targets are checked before any is claimed, so a rejected rule
    /// leaves the model untouched.
    ///
    /// # Errors
    ///
    /// Returns [`MakeError::EmptyTargets`] for a rule without targets and
    /// [`MakeError::DuplicateTarget`] when any target is already claimed or
    /// listed twice.
    pub fn rule(&mut self, rule: Rule) -> Result<(), MakeError> {
        if rule.targets.is_empty() {
            return Err(MakeError::EmptyTargets);
        }
        let mut claimed = HashSet::with_capacity(rule.targets.len());
        for target in &rule.targets {
            let key = target.render(SyntaxContext::Target);
            if self.targets.contains(&key) || claimed.contains(&key) {
                return Err(MakeError::DuplicateTarget { target: key });
            }
            claimed.insert(key);
        }
        self.targets.extend(claimed);
        self.rules.push(rule);
        Ok(())
    }

    /// Whether a rule already produces `target`.
    #[must_use]
    pub fn has_rule(&self, target: &impl ToFragment) -> bool {
        self.targets
            .contains(&target.to_fragment().render(SyntaxContext::Target))
    }

    /// Record an include directive.
    pub fn include(&mut self, name: impl Into<Fragment>, optional: bool) {
        self.includes.push(Include {
            name: name.into(),
            optional,
        });
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Include directives in declaration order.
    #[must_use]
    pub fn includes(&self) -> &[Include] {
        &self.includes
    }

    /// Serialise the model.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = MakeWriter::new();
        out.write_literal(".SUFFIXES:\n\n");

        for (name, (value, assignment)) in &self.globals {
            write_variable(&mut out, None, name, value, *assignment);
        }
        if !self.globals.is_empty() {
            out.write_literal("\n");
        }

        let mut any_scoped = false;
        for (pattern, table) in &self.scoped {
            for (name, (value, assignment)) in table {
                any_scoped = true;
                write_variable(&mut out, Some(&pattern.to_fragment()), name, value, *assignment);
            }
        }
        if any_scoped {
            out.write_literal("\n");
        }

        for (name, lines) in &self.defines {
            out.write_literal("define ");
            out.write_literal(name.name());
            out.write_literal("\n");
            for line in lines {
                out.write_shell(line);
                out.write_literal("\n");
            }
            out.write_literal("endef\n\n");
        }

        for rule in &self.rules {
            write_rule(&mut out, rule);
        }

        for include in &self.includes {
            out.write_literal(if include.optional { "-include " } else { "include " });
            out.write(&include.name, SyntaxContext::Target);
            out.write_literal("\n");
        }
        out.into_string()
    }
}

fn write_variable(
    out: &mut MakeWriter,
    target: Option<&Fragment>,
    name: &Variable,
    value: &Shell,
    assignment: Assignment,
) {
    if let Some(target) = target {
        out.write(target, SyntaxContext::Target);
        out.write_literal(": ");
    }
    out.write_literal(name.name());
    out.write_literal(assignment.operator());
    out.write_shell(value);
    out.write_literal("\n");
}

fn write_rule(out: &mut MakeWriter, rule: &Rule) {
    for target in &rule.targets {
        for (name, value) in &rule.variables {
            write_variable(out, Some(target), name, value, Assignment::Simple);
        }
    }

    if rule.phony {
        out.write_literal(".PHONY: ");
        out.write_each(&rule.targets, SyntaxContext::Dependency, " ", "", "");
        out.write_literal("\n");
    }

    out.write_each(&rule.targets, SyntaxContext::Target, " ", "", "");
    out.write_literal(":");
    out.write_each(&rule.deps, SyntaxContext::Dependency, " ", " ", "");
    out.write_each(&rule.order_only, SyntaxContext::Dependency, " ", " | ", "");

    match &rule.recipe {
        Some(Recipe::Shared(recipe)) => {
            out.write_literal(" ; ");
            out.write(recipe, SyntaxContext::ShellLine);
        }
        Some(Recipe::Inline(commands)) => {
            for command in commands {
                out.write_literal("\n\t");
                out.write_shell(command);
            }
        }
        None => {}
    }
    out.write_literal("\n\n");
}
