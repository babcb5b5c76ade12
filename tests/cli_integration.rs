//! CLI integration tests for october-build.
//!
//! These tests drive the binary from `init` through building. Anything that
//! runs a compiler uses a recording fake compiler, so no C toolchain is
//! required.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the october-build binary command, isolated from user config.
fn october_build(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("october-build").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("CC");
    cmd
}

/// A temporary grammar project, initialized with `init`.
fn grammar_project(tmp: &TempDir, with_parser: bool) -> PathBuf {
    let project_dir = tmp.path().join("tree-sitter-october");

    october_build(tmp.path())
        .arg("init")
        .arg(&project_dir)
        .assert()
        .success();

    if with_parser {
        fs::create_dir_all(project_dir.join("src")).unwrap();
        fs::write(project_dir.join("src/parser.c"), "int tree_sitter_october;\n").unwrap();
    }

    project_dir
}

/// A compiler that appends its arguments to `cc.log` and creates the file
/// after `-o`.
#[cfg(unix)]
fn fake_compiler(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-gcc");
    fs::write(
        &path,
        r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/cc.log"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
[ -n "$out" ] && echo built > "$out"
exit 0
"#,
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
fn compiler_log(tmp: &TempDir) -> Vec<String> {
    fs::read_to_string(tmp.path().join("cc.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

// ============================================================================
// october-build init
// ============================================================================

#[test]
fn test_init_writes_default_manifest() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);

    let manifest = fs::read_to_string(project_dir.join("October.toml")).unwrap();
    assert!(manifest.contains("name = \"tree-sitter-october\""));
    assert!(manifest.contains("name = \"tree_sitter_october\""));
    assert!(manifest.contains("sources = [\"src/parser.c\"]"));
    assert!(manifest.contains("extra_compile_args = [\"-std=c11\"]"));
    assert!(manifest.contains("include_dirs = [\"src\"]"));
}

#[test]
fn test_init_fails_if_manifest_exists() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);

    october_build(tmp.path())
        .arg("init")
        .current_dir(&project_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ============================================================================
// october-build build
// ============================================================================

#[test]
fn test_build_fails_without_manifest() {
    let tmp = TempDir::new().unwrap();

    october_build(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no manifest found"))
        .stderr(predicate::str::contains("october-build init"));
}

#[test]
fn test_build_missing_parser_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);

    october_build(tmp.path())
        .arg("build")
        .current_dir(&project_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("source file not found: src/parser.c"))
        .stderr(predicate::str::contains("tree-sitter generate"));

    assert!(!project_dir.join(".october/target").exists());
}

#[cfg(unix)]
#[test]
fn test_build_missing_parser_never_runs_compiler() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);
    let cc = fake_compiler(tmp.path());

    october_build(tmp.path())
        .arg("build")
        .env("CC", &cc)
        .current_dir(&project_dir)
        .assert()
        .failure();

    assert!(compiler_log(&tmp).is_empty());
}

#[test]
fn test_build_unknown_target() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, true);

    october_build(tmp.path())
        .args(["build", "--target", "tree_sitter_nope"])
        .current_dir(&project_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target `tree_sitter_nope`"))
        .stderr(predicate::str::contains("[[extension]]"));
}

#[cfg(unix)]
#[test]
fn test_build_produces_module() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, true);
    let cc = fake_compiler(tmp.path());

    october_build(tmp.path())
        .arg("build")
        .env("CC", &cc)
        .current_dir(&project_dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished `debug` profile"));

    let ext = if cfg!(target_os = "macos") { "dylib" } else { "so" };
    let module = project_dir
        .join(".october/target/debug")
        .join(format!("tree_sitter_october.{}", ext));
    assert!(module.exists());

    let log = compiler_log(&tmp);
    assert_eq!(log.len(), 2);
    assert!(log[0].contains("-Isrc"));
    assert!(log[0].contains("-std=c11"));
    assert!(log[0].contains("src/parser.c"));
    assert!(log[1].contains("-shared"));
}

#[cfg(unix)]
#[test]
fn test_build_picks_up_standard_change() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, true);
    let cc = fake_compiler(tmp.path());

    october_build(tmp.path())
        .arg("build")
        .env("CC", &cc)
        .current_dir(&project_dir)
        .assert()
        .success();

    // Unchanged: nothing runs.
    october_build(tmp.path())
        .arg("build")
        .env("CC", &cc)
        .current_dir(&project_dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("(1 fresh)"));
    assert_eq!(compiler_log(&tmp).len(), 2);

    let manifest_path = project_dir.join("October.toml");
    let manifest = fs::read_to_string(&manifest_path).unwrap();
    fs::write(&manifest_path, manifest.replace("-std=c11", "-std=c99")).unwrap();

    october_build(tmp.path())
        .arg("build")
        .env("CC", &cc)
        .current_dir(&project_dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("(0 fresh)"));

    let log = compiler_log(&tmp);
    assert_eq!(log.len(), 4);
    assert!(log[2].contains("-std=c99"));
    assert!(!log[2].contains("-std=c11"));
}

#[cfg(unix)]
#[test]
fn test_build_plan_is_json() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, true);
    let cc = fake_compiler(tmp.path());

    let output = october_build(tmp.path())
        .args(["build", "--plan"])
        .env("CC", &cc)
        .current_dir(&project_dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["profile"], "debug");
    assert_eq!(plan["compile_steps"].as_array().unwrap().len(), 1);
    assert_eq!(plan["link_steps"][0]["target"], "tree_sitter_october");

    let args: Vec<&str> = plan["compile_steps"][0]["command"]["args"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a.as_str())
        .collect();
    assert!(args.contains(&"-Isrc"));

    assert!(compiler_log(&tmp).is_empty());
}

#[cfg(unix)]
#[test]
fn test_build_repeated_target_planned_once() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, true);
    let cc = fake_compiler(tmp.path());

    let output = october_build(tmp.path())
        .args([
            "--no-color",
            "build",
            "--plan",
            "--target",
            "tree_sitter_october",
            "--target",
            "tree_sitter_october",
        ])
        .env("CC", &cc)
        .current_dir(&project_dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: target `tree_sitter_october` given more than once"));

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["compile_steps"].as_array().unwrap().len(), 1);
    assert_eq!(plan["link_steps"].as_array().unwrap().len(), 1);
}

#[cfg(unix)]
#[test]
fn test_build_emits_compile_commands() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, true);
    let cc = fake_compiler(tmp.path());

    october_build(tmp.path())
        .args(["build", "--plan", "--emit-compile-commands"])
        .env("CC", &cc)
        .current_dir(&project_dir)
        .assert()
        .success();

    let contents =
        fs::read_to_string(project_dir.join(".october/compile_commands.json")).unwrap();
    let commands: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(commands[0]["file"], "src/parser.c");
    assert!(commands[0]["arguments"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a == "-std=c11"));
}

// ============================================================================
// october-build flags
// ============================================================================

#[cfg(unix)]
#[test]
fn test_flags_shows_compile_and_link() {
    let tmp = TempDir::new().unwrap();
    // parser.c is not needed to print commands
    let project_dir = grammar_project(&tmp, false);
    let cc = fake_compiler(tmp.path());

    october_build(tmp.path())
        .args(["flags", "tree_sitter_october"])
        .env("CC", &cc)
        .current_dir(&project_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("# Compile commands"))
        .stdout(predicate::str::contains("-Isrc"))
        .stdout(predicate::str::contains("-std=c11"))
        .stdout(predicate::str::contains("# Link command"))
        .stdout(predicate::str::contains("-shared"));
}

#[cfg(unix)]
#[test]
fn test_flags_with_named_profile() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);
    let cc = fake_compiler(tmp.path());

    let manifest_path = project_dir.join("October.toml");
    let mut manifest = fs::read_to_string(&manifest_path).unwrap();
    manifest.push_str("\n[profile.size]\nopt_level = \"s\"\ndebug = false\n");
    fs::write(&manifest_path, manifest).unwrap();

    october_build(tmp.path())
        .args(["flags", "tree_sitter_october", "--compile", "--profile", "size"])
        .env("CC", &cc)
        .current_dir(&project_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("-Os"))
        .stdout(predicate::str::contains("-O0").not());
}

#[test]
fn test_flags_unknown_target() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);

    october_build(tmp.path())
        .args(["flags", "nonexistent"])
        .current_dir(&project_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target `nonexistent`"))
        .stderr(predicate::str::contains("tree_sitter_october"));
}

// ============================================================================
// october-build header
// ============================================================================

#[test]
fn test_header_writes_binding() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);

    october_build(tmp.path())
        .arg("header")
        .current_dir(&project_dir)
        .assert()
        .success();

    let header =
        fs::read_to_string(project_dir.join("bindings/c/tree-sitter-october.h")).unwrap();
    assert!(header.contains("#ifndef TREE_SITTER_OCTOBER_H_"));
    assert!(header.contains("const TSLanguage *tree_sitter_october(void);"));
}

// ============================================================================
// october-build clean
// ============================================================================

#[test]
fn test_clean_removes_target_directory() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);
    fs::create_dir_all(project_dir.join(".october/target/debug")).unwrap();

    october_build(tmp.path())
        .arg("clean")
        .current_dir(&project_dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!project_dir.join(".october/target").exists());
    assert!(project_dir.join(".october").exists());
}

#[test]
fn test_clean_all_removes_project_directory() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);
    fs::create_dir_all(project_dir.join(".october/target/debug")).unwrap();
    fs::write(project_dir.join(".october/toolchain.toml"), "[toolchain]\n").unwrap();

    october_build(tmp.path())
        .args(["clean", "--all"])
        .current_dir(&project_dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!project_dir.join(".october").exists());
    assert!(project_dir.join("October.toml").exists());
}

// ============================================================================
// october-build toolchain
// ============================================================================

#[cfg(unix)]
#[test]
fn test_toolchain_show() {
    let tmp = TempDir::new().unwrap();
    let cc = fake_compiler(tmp.path());

    october_build(tmp.path())
        .arg("toolchain")
        .env("CC", &cc)
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Platform: gcc"))
        .stdout(predicate::str::contains("fake-gcc"));
}

#[cfg(unix)]
#[test]
fn test_toolchain_override_used_by_flags() {
    let tmp = TempDir::new().unwrap();
    let project_dir = grammar_project(&tmp, false);
    fake_compiler(tmp.path());

    // Given relative to a subdirectory; stored relative to the project root.
    let subdir = project_dir.join("bindings");
    fs::create_dir_all(&subdir).unwrap();
    october_build(tmp.path())
        .args(["toolchain", "override", "--cc", "../../fake-gcc", "--cflag", "-Wall"])
        .current_dir(&subdir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote"));

    let saved = fs::read_to_string(project_dir.join(".october/toolchain.toml")).unwrap();
    assert!(saved.contains("cc = \"../fake-gcc\""));
    assert!(saved.contains("-Wall"));

    for dir in [&project_dir, &subdir] {
        october_build(tmp.path())
            .args(["flags", "tree_sitter_october", "--compile"])
            .current_dir(dir)
            .assert()
            .success()
            .stdout(predicate::str::contains("fake-gcc"))
            .stdout(predicate::str::contains("-Wall"));
    }

    october_build(tmp.path())
        .args(["toolchain", "override", "--clear"])
        .current_dir(&project_dir)
        .assert()
        .success();
    assert!(!project_dir.join(".october/toolchain.toml").exists());
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    october_build(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("october-build"));
}
