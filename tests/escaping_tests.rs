//! Escaping of awkward file names.
//!
//! Escaped target text is checked against a small reader that applies make's
//! own backslash rules, and, when GNU make is installed, a generated
//! Makefile is run to confirm that make creates files with the exact names.

use std::process::{Command, Output};

use camino::Utf8PathBuf;
use mkgen::make::{Fragment, Makefile, Rule, Shell, SyntaxContext, escape};
use rstest::rstest;

/// Read escaped target text the way make does.
///
/// A run of backslashes before a special character is halved, and an odd
/// run quotes the character. Backslashes elsewhere are kept, and `$$`
/// stands for one `$`.
fn unescape_target(text: &str) -> String {
    let mut out = String::new();
    let mut backslashes = 0usize;
    for ch in text.chars() {
        if ch == '\\' {
            backslashes += 1;
            continue;
        }
        let special = matches!(ch, '#' | '?' | '*' | '[' | ']' | '~' | '%') || ch.is_whitespace();
        let kept = if special { backslashes >> 1 } else { backslashes };
        out.extend(std::iter::repeat_n('\\', kept));
        out.push(ch);
        backslashes = 0;
    }
    out.extend(std::iter::repeat_n('\\', backslashes));
    out.replace("$$", "$")
}

#[rstest]
#[case("plain.o")]
#[case("with space.o")]
#[case("hash#name")]
#[case("percent%name")]
#[case("dollar$name")]
#[case(r"back\slash")]
#[case(r"trailing\")]
#[case(r"slash\ before space")]
#[case(r"two\\#slashes")]
#[case("glob*[x]?~")]
fn escaped_targets_read_back_unchanged(#[case] name: &str) {
    let escaped = escape(name, SyntaxContext::Target);
    assert_eq!(unescape_target(&escaped), name, "escaped as {escaped:?}");
}

#[rstest]
#[case("a|b", r"a\|b")]
#[case("a b|c", r"a\ b\|c")]
fn dependencies_also_escape_pipes(#[case] name: &str, #[case] expected: &str) {
    assert_eq!(escape(name, SyntaxContext::Dependency), expected);
    assert_eq!(escape(name, SyntaxContext::Target), expected.replace(r"\|", "|"));
}

fn make_available() -> bool {
    Command::new("make")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// A Makefile whose phony `all` needs one file per name, each created by
/// its own rule.
fn touch_each(names: &[&str]) -> Makefile {
    let mut makefile = Makefile::new();
    makefile
        .rule(
            Rule::new([Fragment::literal("all")])
                .deps(names.iter().map(|name| Fragment::literal(*name)))
                .phony(),
        )
        .expect("all rule");
    for name in names {
        makefile
            .rule(Rule::new([Fragment::literal(*name)]).recipe(vec![Shell::Words(vec![
                Fragment::literal("touch"),
                Fragment::literal(*name),
            ])]))
            .expect("file rule");
    }
    makefile
}

fn run_make(makefile: &Makefile) -> (tempfile::TempDir, Utf8PathBuf, Output) {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    std::fs::write(root.join("Makefile"), makefile.render()).expect("write Makefile");
    let output = Command::new("make")
        .arg("-s")
        .current_dir(&root)
        .output()
        .expect("run make");
    (dir, root, output)
}

#[test]
fn gnu_make_creates_files_with_exact_names() {
    if !make_available() {
        return;
    }
    let names = [
        "with space",
        "hash#name",
        "dollar$name",
        "plain",
        "pct%name",
        "q?x",
        "star*x",
        "br[a]x",
        "til~x",
        "pipe|x",
    ];
    let (_dir, root, output) = run_make(&touch_each(&names));
    assert!(
        output.status.success(),
        "make failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    for name in names {
        assert!(root.join(name).is_file(), "missing {name:?}");
    }
}

/// GNU make reads an escaped tab back in a prerequisite but never in a rule
/// target, so no rule can build a file whose name holds a tab.
#[test]
fn gnu_make_cannot_name_targets_with_tabs() {
    if !make_available() {
        return;
    }
    let (_dir, _root, output) = run_make(&touch_each(&["tab\tx"]));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tab\tx"), "unexpected make error: {stderr}");
}
