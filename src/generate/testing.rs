//! The `tests` and `test` targets.
//!
//! `tests` builds every test program; `test` runs them. A driver receives
//! its sub-tests as arguments, each collapsed into a single shell word.

use indexmap::IndexMap;

use crate::graph::{TestCase, Tests};
use crate::make::error::MakeError;
use crate::make::fragment::{Fragment, PathRef, Root, concat};
use crate::make::makefile::{Makefile, Rule, Shell};
use crate::make::shell::quote;
use crate::make::syntax::SyntaxContext;
use crate::make::writer::MakeWriter;

use super::flags::literal_words;

/// Aggregate target building all test programs.
pub const TESTS_TARGET: &str = "tests";

/// Target running the test suite.
pub const TEST_TARGET: &str = "test";

pub(super) fn emit(tests: &Tests, makefile: &mut Makefile) -> Result<(), MakeError> {
    if tests.is_empty() {
        return Ok(());
    }
    let mut deps: Vec<Fragment> = Vec::new();
    if !tests.targets.is_empty() {
        makefile.rule(
            Rule::new([Fragment::literal(TESTS_TARGET)])
                .deps(&tests.targets)
                .phony(),
        )?;
        deps.push(Fragment::literal(TESTS_TARGET));
    }
    deps.extend(tests.extra_deps.iter().map(Fragment::from));

    let mut recipe = Vec::with_capacity(tests.cases.len());
    for case in &tests.cases {
        recipe.push(Shell::Words(command(case, &mut deps)));
    }
    makefile.rule(
        Rule::new([Fragment::literal(TEST_TARGET)])
            .deps(deps)
            .recipe(recipe)
            .phony(),
    )
}

/// Words running `case`. Generated drivers are added to `deps`.
fn command(case: &TestCase, deps: &mut Vec<Fragment>) -> Vec<Fragment> {
    match case {
        TestCase::Test(test) => invocation(&test.env, &test.target, &test.options),
        TestCase::Driver(driver) => {
            if driver.generated {
                deps.push(Fragment::from(&driver.target));
            }
            let mut words = invocation(&driver.env, &driver.target, &driver.options);
            for sub in &driver.tests {
                words.push(collapse(&command(sub, deps)));
            }
            words
        }
    }
}

fn invocation(
    env: &IndexMap<String, String>,
    target: &PathRef,
    options: &[String],
) -> Vec<Fragment> {
    let mut words: Vec<Fragment> = env
        .iter()
        .map(|(key, value)| {
            concat([
                Fragment::literal(key.as_str()),
                Fragment::escaped("="),
                Fragment::literal(value.as_str()),
            ])
        })
        .collect();
    words.push(program(target));
    words.extend(literal_words(options));
    words
}

/// A program path the shell will not look up in `PATH`.
fn program(target: &PathRef) -> Fragment {
    if target.root == Root::Build && !target.path.as_str().contains('/') {
        concat([Fragment::escaped("./"), Fragment::from(target)])
    } else {
        Fragment::from(target)
    }
}

/// Render `words` as one shell word.
fn collapse(words: &[Fragment]) -> Fragment {
    let mut out = MakeWriter::new();
    out.write_each(words, SyntaxContext::ShellWord, " ", "", "");
    let line = out.into_string();
    if words.len() > 1 {
        Fragment::escaped(quote(&line))
    } else {
        Fragment::escaped(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{TestCommand, TestDriver};

    fn test(target: &str) -> TestCase {
        TestCase::Test(TestCommand {
            target: PathRef::build(target),
            options: Vec::new(),
            env: IndexMap::new(),
        })
    }

    #[test]
    fn no_tests_emit_no_rules() {
        let mut makefile = Makefile::new();
        emit(&Tests::default(), &mut makefile).expect("tests");
        assert!(makefile.rules().is_empty());
    }

    #[test]
    fn test_runs_after_building_tests() {
        let mut makefile = Makefile::new();
        let mut env = IndexMap::new();
        env.insert("MODE".to_owned(), "fast".to_owned());
        let tests = Tests {
            targets: vec![PathRef::build("t1"), PathRef::build("sub/t2")],
            extra_deps: vec![PathRef::build("data")],
            cases: vec![
                test("t1"),
                TestCase::Test(TestCommand {
                    target: PathRef::build("sub/t2"),
                    options: vec!["-q".to_owned()],
                    env,
                }),
            ],
        };
        emit(&tests, &mut makefile).expect("tests");
        let text = makefile.render();
        assert!(text.contains(".PHONY: tests\ntests: t1 sub/t2\n\n"));
        assert!(text.contains(
            ".PHONY: test\ntest: tests data\n\t./t1\n\tMODE=fast sub/t2 -q\n\n"
        ));
    }

    #[test]
    fn generated_drivers_are_prerequisites() {
        let mut makefile = Makefile::new();
        let tests = Tests {
            targets: Vec::new(),
            extra_deps: Vec::new(),
            cases: vec![TestCase::Driver(TestDriver {
                target: PathRef::build("driver"),
                options: Vec::new(),
                env: IndexMap::new(),
                generated: true,
                tests: vec![test("t1")],
            })],
        };
        emit(&tests, &mut makefile).expect("tests");
        let text = makefile.render();
        assert!(!text.contains("tests:"));
        assert!(text.contains(".PHONY: test\ntest: driver\n\t./driver ./t1\n\n"));
    }

    #[test]
    fn multi_word_sub_commands_become_one_argument() {
        let sub = TestCase::Test(TestCommand {
            target: PathRef::build("t1"),
            options: vec!["--flag".to_owned()],
            env: IndexMap::new(),
        });
        let mut deps = Vec::new();
        let word = collapse(&command(&sub, &mut deps))
            .render(SyntaxContext::ShellLine);
        let parsed = shlex::split(&word).expect("shell word");
        assert_eq!(parsed, vec!["./t1 --flag".to_owned()]);
    }
}
