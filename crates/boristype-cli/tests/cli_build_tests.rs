use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn btc_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("btc"))
}

// ============================================================================
// SINGLE FILE BUILDS
// ============================================================================

#[test]
fn test_compile_file_writes_js_with_bom() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("main.ts");
    fs::write(&input, "let x: number = 1;").unwrap();
    let out_dir = temp_dir.path().join("out");

    btc_cmd()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success();

    let output = fs::read_to_string(out_dir.join("main.js")).unwrap();
    assert!(output.starts_with('\u{FEFF}'));
    assert!(output.ends_with("var x = 1;\n"));
}

#[test]
fn test_no_bom_flag() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("main.ts");
    fs::write(&input, "let x = 1;").unwrap();
    let out_dir = temp_dir.path().join("out");

    btc_cmd()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--no-bom")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(out_dir.join("main.js")).unwrap(), "var x = 1;\n");
}

#[test]
fn test_escape_non_ascii_flag() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("text.ts");
    fs::write(&input, "const s = \"café\";").unwrap();
    let out_dir = temp_dir.path().join("out");

    btc_cmd()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--no-bom")
        .arg("--escape-non-ascii")
        .assert()
        .success();

    let output = fs::read_to_string(out_dir.join("text.js")).unwrap();
    assert!(output.contains("caf\\u00E9"));
}

#[test]
fn test_non_ascii_retained_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("text.ts");
    fs::write(&input, "const s = \"café\";").unwrap();
    let out_dir = temp_dir.path().join("out");

    btc_cmd()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success();

    let output = fs::read_to_string(out_dir.join("text.js")).unwrap();
    assert!(output.contains("café"));
}

#[test]
fn test_input_with_bom_is_accepted() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("bom.ts");
    fs::write(&input, "\u{FEFF}let x = 1;").unwrap();
    let out_dir = temp_dir.path().join("out");

    btc_cmd()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--no-bom")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(out_dir.join("bom.js")).unwrap(), "var x = 1;\n");
}

// ============================================================================
// OUTPUT KINDS
// ============================================================================

#[test]
fn test_xml_init_marker_writes_xml_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("form.ts");
    fs::write(&input, "/// @xml-init\nlog(1);").unwrap();
    let out_dir = temp_dir.path().join("out");

    btc_cmd()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success();

    assert!(!out_dir.join("form.js").exists());
    let output = fs::read_to_string(out_dir.join("form.xml")).unwrap();
    assert!(output.contains("<SPXML-INLINE-FORM>"));
    assert!(output.contains("\t\tlog(1);"));
}

#[test]
fn test_html_marker_writes_html_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("page.ts");
    fs::write(&input, "/// @html\nlog(1);").unwrap();
    let out_dir = temp_dir.path().join("out");

    btc_cmd()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--no-bom")
        .assert()
        .success();

    let output = fs::read_to_string(out_dir.join("page.html")).unwrap();
    assert!(output.starts_with("<%\n"));
    assert!(output.ends_with("%>"));
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_missing_out_dir_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("main.ts");
    fs::write(&input, "let x = 1;").unwrap();

    btc_cmd()
        .current_dir(&temp_dir)
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("outDir"));
}

#[test]
fn test_parse_error_exits_with_one() {
    let temp_dir = TempDir::new().unwrap();
    let good = temp_dir.path().join("good.ts");
    let bad = temp_dir.path().join("bad.ts");
    fs::write(&good, "let ok = 1;").unwrap();
    fs::write(&bad, "let = ;").unwrap();
    let out_dir = temp_dir.path().join("out");

    btc_cmd()
        .arg(&good)
        .arg(&bad)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Build failed"));

    assert!(out_dir.join("good.js").exists());
    assert!(!out_dir.join("bad.js").exists());
}

#[test]
fn test_missing_input_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    btc_cmd()
        .arg(temp_dir.path().join("nope.ts"))
        .arg("--out-dir")
        .arg(temp_dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.ts"));
}

// ============================================================================
// DIRECTORIES AND NON-SCRIPT FILES
// ============================================================================

#[test]
fn test_directory_input_mirrors_layout() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    fs::create_dir_all(src.join("lib")).unwrap();
    fs::write(src.join("main.ts"), "let a = 1;").unwrap();
    fs::write(src.join("lib/util.ts"), "let b = 2;").unwrap();
    fs::write(src.join("lib/types.d.ts"), "declare const c: number;").unwrap();
    let out_dir = temp_dir.path().join("out");

    btc_cmd()
        .arg(&src)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success();

    assert!(out_dir.join("main.js").exists());
    assert!(out_dir.join("lib/util.js").exists());
    assert!(!out_dir.join("lib/types.d.js").exists());
}

#[test]
fn test_non_script_files_copied_only_when_requested() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("main.ts"), "let a = 1;").unwrap();
    fs::write(src.join("data.txt"), "payload").unwrap();

    let plain_out = temp_dir.path().join("plain");
    btc_cmd()
        .arg(&src)
        .arg("--out-dir")
        .arg(&plain_out)
        .assert()
        .success();
    assert!(!plain_out.join("data.txt").exists());

    let full_out = temp_dir.path().join("full");
    btc_cmd()
        .arg(&src)
        .arg("--out-dir")
        .arg(&full_out)
        .arg("--include-non-ts-files")
        .assert()
        .success();
    assert_eq!(fs::read_to_string(full_out.join("data.txt")).unwrap(), "payload");
    assert!(full_out.join("main.js").exists());
}
