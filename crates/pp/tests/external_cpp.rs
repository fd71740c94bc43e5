use std::fs;
use std::path::{Path, PathBuf};

use pp::{Preprocessor, PreprocessorConfig};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let f = dir.join(name);
    fs::create_dir_all(f.parent().unwrap()).unwrap();
    fs::write(&f, content).unwrap();
    f
}

/// A preprocessor from the environment, or `None` to skip the test.
fn preprocessor(config: PreprocessorConfig) -> Option<Preprocessor> {
    match Preprocessor::new(config) {
        Ok(pp) => Some(pp),
        Err(e) => {
            eprintln!("skipping: {}", e);
            None
        }
    }
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn expands_object_macros() {
    let Some(pp) = preprocessor(PreprocessorConfig::default()) else { return };
    let out = pp.preprocess_source("t.c", "#define X 3\nint y = X;\n").expect("preprocess ok");
    assert!(squash(&out).contains("inty=3;"), "{}", out);
}

#[test]
fn command_line_defines_and_undefs() {
    let mut cfg = PreprocessorConfig::default();
    cfg.define("WIDTH=80").define("FLAG").undef("FLAG");
    let Some(pp) = preprocessor(cfg) else { return };
    let src = "int w = WIDTH;\n#ifdef FLAG\nint flag;\n#endif\n";
    let out = pp.preprocess_source("t.c", src).expect("preprocess ok");
    let flat = squash(&out);
    assert!(flat.contains("intw=80;"), "{}", out);
    assert!(!flat.contains("intflag;"), "{}", out);
}

#[test]
fn quoted_and_angled_includes() {
    let root = tempdir().unwrap();
    write(root.path(), "local.h", "#define LOCAL 7\n");
    write(root.path(), "inc/lib.h", "#define LIB 9\n");
    let main_c = write(
        root.path(),
        "main.c",
        "#include \"local.h\"\n#include <lib.h>\nint a = LOCAL + LIB;\n",
    );
    let mut cfg = PreprocessorConfig::default();
    cfg.include(root.path().join("inc"));
    let Some(pp) = preprocessor(cfg) else { return };
    let out = pp.preprocess_file(&main_c).expect("preprocess ok");
    assert!(squash(&out).contains("inta=7+9;"), "{}", out);
}

#[test]
fn output_carries_linemarkers_for_the_lexer() {
    let root = tempdir().unwrap();
    write(root.path(), "h.h", "int from_header;\n");
    let main_c = write(root.path(), "main.c", "#include \"h.h\"\nint from_main;\n");
    let Some(pp) = preprocessor(PreprocessorConfig::default()) else { return };
    let out = pp.preprocess_file(&main_c).expect("preprocess ok");
    assert!(out.lines().any(|l| l.starts_with('#') && l.contains("h.h")), "{}", out);
}

#[test]
fn errors_carry_tool_stderr() {
    let Some(pp) = preprocessor(PreprocessorConfig::default()) else { return };
    let err = pp
        .preprocess_source("bad.c", "#include \"definitely_missing_header.h\"\n")
        .unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("failed to preprocess bad.c"), "{}", msg);
    assert!(msg.contains("definitely_missing_header.h"), "{}", msg);
}

#[test]
fn missing_input_file() {
    let pp = Preprocessor::with_tool("cpp", PreprocessorConfig::default());
    let err = pp.preprocess_file(Path::new("/nonexistent/input.c")).unwrap_err();
    assert!(err.to_string().contains("input file not found"));
}
