use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn btc_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("btc"))
}

// ============================================================================
// PROJECT INITIALIZATION
// ============================================================================

#[test]
fn test_init_creates_config_file() {
    let temp_dir = TempDir::new().unwrap();

    btc_cmd()
        .current_dir(&temp_dir)
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("btconfig.json"));

    let config = fs::read_to_string(temp_dir.path().join("btconfig.json")).unwrap();
    assert!(config.contains("compilerOptions"));
    assert!(config.contains("\"outDir\": \"build\""));
    assert!(temp_dir.path().join("src").is_dir());
}

#[test]
fn test_init_refuses_to_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("btconfig.json"), "{}").unwrap();

    btc_cmd()
        .current_dir(&temp_dir)
        .arg("--init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(temp_dir.path().join("btconfig.json")).unwrap(), "{}");
}

// ============================================================================
// CONFIGURATION FILE BUILDS
// ============================================================================

#[test]
fn test_build_from_include_globs() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src/lib")).unwrap();
    fs::write(temp_dir.path().join("src/main.ts"), "let a = 1;").unwrap();
    fs::write(temp_dir.path().join("src/lib/util.ts"), "let arr = [1, 2];\nlet b = arr.length;").unwrap();
    fs::write(
        temp_dir.path().join("btconfig.json"),
        r#"{ "compilerOptions": { "outDir": "build", "emitBom": false } }"#,
    )
    .unwrap();

    btc_cmd().current_dir(&temp_dir).assert().success();

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("build/main.js")).unwrap(),
        "var a = 1;\n"
    );
    let util = fs::read_to_string(temp_dir.path().join("build/lib/util.js")).unwrap();
    assert!(util.contains("var b = ArrayCount(arr);"));
}

#[test]
fn test_root_dir_controls_layout() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src/lib")).unwrap();
    fs::write(temp_dir.path().join("src/lib/util.ts"), "let b = 2;").unwrap();
    fs::write(
        temp_dir.path().join("btconfig.json"),
        r#"{ "compilerOptions": { "outDir": "build", "rootDir": "src" } }"#,
    )
    .unwrap();

    btc_cmd().current_dir(&temp_dir).assert().success();

    assert!(temp_dir.path().join("build/lib/util.js").exists());
}

#[test]
fn test_exclude_patterns_skip_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src/skip")).unwrap();
    fs::write(temp_dir.path().join("src/main.ts"), "let a = 1;").unwrap();
    fs::write(temp_dir.path().join("src/skip/broken.ts"), "let = ;").unwrap();
    fs::write(
        temp_dir.path().join("btconfig.json"),
        r#"{
            "compilerOptions": { "outDir": "build", "rootDir": "src" },
            "exclude": ["**/skip/**"]
        }"#,
    )
    .unwrap();

    btc_cmd().current_dir(&temp_dir).assert().success();

    assert!(temp_dir.path().join("build/main.js").exists());
    assert!(!temp_dir.path().join("build/skip").exists());
}

#[test]
fn test_cli_out_dir_overrides_config() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(temp_dir.path().join("src/main.ts"), "let a = 1;").unwrap();
    fs::write(
        temp_dir.path().join("btconfig.json"),
        r#"{ "compilerOptions": { "outDir": "build" } }"#,
    )
    .unwrap();

    btc_cmd()
        .current_dir(&temp_dir)
        .arg("--out-dir")
        .arg("dist")
        .assert()
        .success();

    assert!(temp_dir.path().join("dist/main.js").exists());
    assert!(!temp_dir.path().join("build").exists());
}

#[test]
fn test_explicit_project_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(temp_dir.path().join("src/main.ts"), "let a = 1;").unwrap();
    fs::write(
        temp_dir.path().join("custom.json"),
        r#"{ "compilerOptions": { "outDir": "custom-out" } }"#,
    )
    .unwrap();

    btc_cmd()
        .current_dir(&temp_dir)
        .arg("--project")
        .arg("custom.json")
        .assert()
        .success();

    assert!(temp_dir.path().join("custom-out/main.js").exists());
}

#[test]
fn test_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("btconfig.json"), "{ not json").unwrap();

    btc_cmd()
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("btconfig.json"));
}

#[test]
fn test_no_inputs_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("btconfig.json"),
        r#"{ "compilerOptions": { "outDir": "build" } }"#,
    )
    .unwrap();

    btc_cmd()
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No input files"));
}

#[test]
fn test_show_config_prints_merged_options() {
    let temp_dir = TempDir::new().unwrap();

    btc_cmd()
        .current_dir(&temp_dir)
        .arg("--show-config")
        .arg("--out-dir")
        .arg("out")
        .arg("--no-bom")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"outDir\": \"out\""))
        .stdout(predicate::str::contains("\"emitBom\": false"));
}
