//! Generation scenarios over whole build graphs.
//!
//! Each test builds a graph, generates the Makefile with a fixed
//! environment and checks the rules a reader of the Makefile relies on.

use camino::Utf8Path;
use mkgen::config::resolve_with;
use mkgen::environment::{Environment, InstallDirs};
use mkgen::generate::{Generated, generate};
use mkgen::graph::{BuildGraph, GraphError};
use mkgen::make::MakeError;
use mkgen::toolchain::{Platform, ToolchainKind};
use rstest::rstest;

fn environment(platform: Platform, toolchain: ToolchainKind) -> Environment {
    Environment {
        srcdir: "/src".into(),
        builddir: "/src/build".into(),
        description: "/src/build.json".into(),
        generator: "/usr/bin/mkgen".into(),
        platform,
        toolchain,
        install_dirs: InstallDirs::default(),
        tools: resolve_with(toolchain, |_| None).expect("tool configuration"),
    }
}

fn linux() -> Environment {
    environment(Platform::Linux, ToolchainKind::Cc)
}

fn generate_json(env: &Environment, json: &str) -> Result<Generated, MakeError> {
    let graph = BuildGraph::parse(json).expect("valid graph");
    generate(env, &graph)
}

fn fixture(name: &str) -> BuildGraph {
    let path = Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name);
    BuildGraph::from_path(&path).expect("load fixture")
}

#[test]
fn objects_in_one_directory_share_a_sentinel() {
    let generated = generate_json(
        &linux(),
        r#"{
            "mkgen_version": "1.0.0",
            "edges": [
                { "type": "compile", "output": "build/sub/a.o", "source": "a.c", "lang": "c" },
                { "type": "compile", "output": "build/sub/b.o", "source": "b.c", "lang": "c" },
                { "type": "compile", "output": "build/sub/c.o", "source": "c.c", "lang": "c" }
            ]
        }"#,
    )
    .expect("generate");
    let text = generated.makefile;
    assert_eq!(text.matches("| build/sub/.dir ; $(RULE_CC)").count(), 3);
    assert_eq!(text.matches("%/.dir:").count(), 1);
    assert!(!text.contains("build/sub/.dir:"));
}

#[test]
fn dll_and_import_library_link_once() {
    let env = environment(Platform::Windows, ToolchainKind::Cc);
    let generated = generate_json(
        &env,
        r#"{
            "mkgen_version": "1.0.0",
            "edges": [
                {
                    "type": "link",
                    "output": "bin/foo.dll",
                    "import_library": "lib/foo.dll.a",
                    "mode": "shared_library",
                    "lang": "c",
                    "files": ["foo.o"]
                }
            ]
        }"#,
    )
    .expect("generate");
    let text = generated.makefile;
    assert_eq!(text.matches("$(call RULE_LINK_CC").count(), 1);
    assert!(text.contains("bin/foo.dll lib/foo.dll.a: bin/foo.dll.stamp\n\n"));
    assert!(text.contains(
        "bin/foo.dll.stamp: foo.o | bin/.dir lib/.dir\n\
         \t$(call RULE_LINK_CC,foo.o,bin/foo.dll)\n\
         \t@touch $@\n\n"
    ));
    assert!(text.contains("out-implib"));
}

#[test]
fn flags_layer_from_global_to_target() {
    let generated = generate_json(
        &linux(),
        r#"{
            "mkgen_version": "1.0.0",
            "global_options": { "c": ["-O2"] },
            "edges": [
                {
                    "type": "compile",
                    "output": "build/foo.o",
                    "source": "foo.c",
                    "lang": "c",
                    "options": ["-Wall"]
                },
                { "type": "compile", "output": "build/bar.o", "source": "bar.c", "lang": "c" }
            ]
        }"#,
    )
    .expect("generate");
    let text = generated.makefile;
    assert!(text.contains("GLOBAL_CFLAGS := -O2\n"));
    assert!(text.contains("%: CFLAGS := $(GLOBAL_CFLAGS)\n"));
    assert!(text.contains("build/foo.o: CFLAGS := $(GLOBAL_CFLAGS) -Wall\n"));
    assert!(!text.contains("build/bar.o: CFLAGS"));
}

#[test]
fn generation_is_deterministic() {
    let graph = fixture("project.json");
    let first = generate(&linux(), &graph).expect("first run");
    let second = generate(&linux(), &graph).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn shared_libraries_link_by_short_name_with_rpath() {
    let generated = generate(&linux(), &fixture("project.json")).expect("generate");
    let text = generated.makefile;
    assert!(text.contains("libcore.so: LDFLAGS := $(GLOBAL_LDFLAGS) -shared -fPIC\n"));
    assert!(text.contains("core/core.o: CXXFLAGS := $(GLOBAL_CXXFLAGS) -fPIC -I$(srcdir)/include\n"));
    assert!(text.contains("myapp: LDLIBS := $(GLOBAL_LDLIBS) -lcore\n"));
    assert!(text.contains(
        "myapp: app/main.o libcore.so ; $(call RULE_LINK_CXX,app/main.o,myapp)\n\n"
    ));
    assert!(text.contains("$$ORIGIN"));
}

#[test]
fn install_test_and_alias_targets_are_phony() {
    let generated = generate(&linux(), &fixture("project.json")).expect("generate");
    let text = generated.makefile;
    assert!(text.contains(".PHONY: all\nall: myapp libcore.so\n\n"));
    assert!(text.contains(".PHONY: install\ninstall: all\n\t$(INSTALL_PROGRAM) -D myapp $(bindir)/myapp\n"));
    assert!(text.contains(".PHONY: tests\ntests: myapp\n\n"));
    assert!(text.contains(".PHONY: test\ntest: tests\n\t./myapp --self-test\n\n"));
    assert!(text.contains(".PHONY: everything\neverything: myapp libcore.so\n\n"));
}

#[test]
fn phases_appear_in_fixed_order() {
    let generated = generate(&linux(), &fixture("project.json")).expect("generate");
    let text = generated.makefile;
    let position = |needle: &str| text.find(needle).unwrap_or_else(|| panic!("missing {needle}"));
    let order = [
        ".PHONY: all",
        ".PHONY: install",
        ".PHONY: tests",
        ".PHONY: test\n",
        "core/core.o: $(srcdir)/core/core.cpp",
        "%/.dir:",
        "Makefile: $(srcdir)/build.json",
        "include .mkgen-find-deps",
    ];
    for pair in order.windows(2) {
        if let [before, after] = pair {
            assert!(position(before) < position(after), "{before:?} should precede {after:?}");
        }
    }
}

#[test]
fn scanned_directories_feed_regeneration() {
    let generated = generate(&linux(), &fixture("project.json")).expect("generate");
    let [aux] = generated.auxiliary.as_slice() else {
        panic!("expected one auxiliary file");
    };
    assert_eq!(aux.name.as_str(), ".mkgen-find-deps");
    assert_eq!(aux.contents, "Makefile: $(srcdir)/core\n\n$(srcdir)/core:\n");
    assert!(generated.makefile.ends_with("\ninclude .mkgen-find-deps\n"));
}

#[test]
fn duplicate_outputs_fail() {
    let err = generate(&linux(), &fixture("duplicate_output.json")).expect_err("duplicate");
    assert_eq!(
        err,
        MakeError::DuplicateTarget {
            target: "a.o".to_owned()
        }
    );
}

#[test]
fn future_format_versions_are_rejected() {
    let path = Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/future_version.json");
    let err = BuildGraph::from_path(&path).expect_err("unsupported version");
    assert!(matches!(err, GraphError::UnsupportedVersion { .. }));
}

#[rstest]
#[case("fortran", "compiler")]
#[case("rust", "compiler")]
fn unknown_languages_are_reported(#[case] lang: &str, #[case] tool: &str) {
    let json = format!(
        r#"{{
            "mkgen_version": "1.0.0",
            "edges": [{{ "type": "compile", "output": "a.o", "source": "a.src", "lang": "{lang}" }}]
        }}"#
    );
    let err = generate_json(&linux(), &json).expect_err("unknown language");
    assert_eq!(
        err,
        MakeError::UnknownLanguage {
            tool: tool.to_owned(),
            lang: lang.to_owned()
        }
    );
}

#[test]
fn static_archives_reject_import_libraries() {
    let err = generate_json(
        &linux(),
        r#"{
            "mkgen_version": "1.0.0",
            "edges": [
                {
                    "type": "link",
                    "output": "libfoo.a",
                    "import_library": "foo.lib",
                    "mode": "static_library",
                    "lang": "c",
                    "files": ["foo.o"]
                }
            ]
        }"#,
    )
    .expect_err("static import library");
    assert_eq!(
        err,
        MakeError::UnsupportedMode {
            operation: "import library".to_owned(),
            mode: "static_library".to_owned()
        }
    );
}

#[test]
fn msvc_compiles_without_depfile_includes() {
    let env = environment(Platform::Windows, ToolchainKind::Msvc);
    let generated = generate_json(
        &env,
        r#"{
            "mkgen_version": "1.0.0",
            "edges": [
                { "type": "compile", "output": "obj/a.obj", "source": "a.cpp", "lang": "c++" },
                {
                    "type": "link",
                    "output": "a.exe",
                    "mode": "executable",
                    "lang": "c++",
                    "files": ["obj/a.obj"]
                }
            ]
        }"#,
    )
    .expect("generate");
    let text = generated.makefile;
    assert!(text.contains("define RULE_CXX\n$(CXX) $(CXXFLAGS) /showIncludes /c $< /Fo$@\nendef\n"));
    assert!(text.contains("define RULE_LINK\n$(LINK) $(LDFLAGS) $1 $(LDLIBS) "));
    assert!(!text.contains("-include"));
}
