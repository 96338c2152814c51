//! End-to-end scenarios driven through the built `kati-rs` binary against
//! a temp-directory makefile, the way `paiml-bashrs`'s installation tests
//! (`tests/installation_tests.rs`) shell out to a compiled binary and
//! assert on its stdout rather than poking at internals.

use std::fs;
use std::process::Command;

fn run_makefile(contents: &str) -> (String, String, bool) {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("Makefile"), contents).expect("write makefile");

    let output = Command::new(env!("CARGO_BIN_EXE_kati-rs"))
        .current_dir(dir.path())
        .output()
        .expect("run kati-rs");

    (
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
        output.status.success(),
    )
}

#[test]
fn recursive_variable_reexpands_at_use() {
    let (stdout, stderr, ok) = run_makefile(
        "A := foo\nB = $(A) bar\nA := baz\nall:\n\t@echo $(B)\n",
    );
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout, "baz bar");
}

#[test]
fn patsubst_renames_object_files() {
    let (stdout, stderr, ok) = run_makefile(
        "SRCS := a.c b.c c.c\nOBJS := $(patsubst %.c,%.o,$(SRCS))\nall:\n\t@echo $(OBJS)\n",
    );
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout, "a.o b.o c.o");
}

#[test]
fn call_with_define_binds_positional_args() {
    let (stdout, stderr, ok) = run_makefile(
        "define greet\n@echo hello $(1)\nendef\nall:\n\t$(call greet,world)\n",
    );
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout, "hello world");
}

#[test]
fn multi_target_rule_builds_in_dependency_order() {
    let (stdout, stderr, ok) = run_makefile("all: a b\na b:\n\t@echo $@\n");
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn ifeq_takes_the_true_branch() {
    let (stdout, stderr, ok) = run_makefile(
        "ifeq (1,1)\nX := yes\nelse\nX := no\nendif\nall:\n\t@echo $(X)\n",
    );
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout, "yes");
}

#[test]
fn ifeq_takes_the_false_branch() {
    let (stdout, stderr, ok) = run_makefile(
        "ifeq (1,2)\nX := yes\nelse\nX := no\nendif\nall:\n\t@echo $(X)\n",
    );
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout, "no");
}

#[test]
fn ignore_error_prefix_allows_recipe_to_continue() {
    let (stdout, stderr, ok) = run_makefile("all:\n\t-@false\n\t@echo after\n");
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout, "after");
}

#[test]
fn phony_target_builds_its_dependencies() {
    let (stdout, stderr, ok) = run_makefile(
        ".PHONY: clean all\nall: clean\n\t@echo built\nclean:\n\t@echo cleaning\n",
    );
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["cleaning", "built"]);
}

#[test]
fn suffix_rule_compiles_matching_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("a.c"), "int main(){return 0;}").unwrap();
    fs::write(
        dir.path().join("Makefile"),
        ".SUFFIXES: .c .o\n.c.o:\n\t@echo compiling $< into $@\nall: a.o\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_kati-rs")).current_dir(dir.path()).output().expect("run kati-rs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "compiling a.c into a.o");
}

#[test]
fn missing_target_reports_no_rule_error() {
    let (_, stderr, ok) = run_makefile("all: nonexistent_input_xyz\n\t@echo built\n");
    assert!(!ok);
    assert!(stderr.contains("No rule to make target"), "stderr: {}", stderr);
}

#[test]
fn dry_run_prints_without_executing() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("Makefile"), "all:\n\t@touch should_not_exist.txt\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_kati-rs"))
        .current_dir(dir.path())
        .arg("-n")
        .output()
        .expect("run kati-rs");
    assert!(output.status.success());
    assert!(!dir.path().join("should_not_exist.txt").exists());
}

#[test]
fn command_line_variable_overrides_makefile_assignment() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("Makefile"), "CC := gcc\nall:\n\t@echo $(CC)\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_kati-rs")).current_dir(dir.path()).arg("CC=clang").output().expect("run kati-rs");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "clang");
}
