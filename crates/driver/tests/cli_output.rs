use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn ast_dump_shows_the_tree() {
    let dir = tempdir().unwrap();
    let c_path = dir.path().join("add.c");
    fs::write(&c_path, "int add(int a, int b) { return a + b; }\n").unwrap();

    let mut cmd = Command::cargo_bin("quillcc").unwrap();
    cmd.args(["ast", "--preprocessed", c_path.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("TranslationUnit\n  FunctionDecl 'add'\n"))
        .stdout(predicate::str::contains("      Return\n        Binary '+'\n"));
}

#[test]
fn tokens_print_location_kind_and_lexeme() {
    let dir = tempdir().unwrap();
    let c_path = dir.path().join("t.c");
    fs::write(&c_path, "int x = 42;\n").unwrap();
    let name = c_path.display().to_string();

    let mut cmd = Command::cargo_bin("quillcc").unwrap();
    cmd.args(["tokens", "--preprocessed", name.as_str()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(format!("{}:1:1 Keyword(Int) 'int'", name)))
        .stdout(predicate::str::contains(format!("{}:1:5 Identifier 'x'", name)))
        .stdout(predicate::str::contains("end of file"));
}

#[test]
fn linemarkers_move_diagnostics() {
    let dir = tempdir().unwrap();
    let c_path = dir.path().join("pre.i");
    fs::write(&c_path, "# 1 \"orig.c\"\nint ok;\n# 40 \"orig.h\" 1\nint bad = ;\n").unwrap();

    let mut cmd = Command::cargo_bin("quillcc").unwrap();
    cmd.args(["check", "--preprocessed", c_path.to_str().unwrap()]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("orig.h:40:11: parse error: expected expression, found ';'"));
}

#[test]
fn verbose_logs_to_stderr() {
    let dir = tempdir().unwrap();
    let c_path = dir.path().join("v.c");
    fs::write(&c_path, "int v;\n").unwrap();

    let mut cmd = Command::cargo_bin("quillcc").unwrap();
    cmd.env_remove("RUST_LOG")
        .args(["-v", "check", "--preprocessed", c_path.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("parsing"));
}
