use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SOURCE: &str = "contract C {
    function f(uint8 a) public returns (uint8) {
        return a + 1;
    }
}
";

fn ast(operator: &str) -> String {
    let uint8 = r#"{ "kind": "integer", "bits": 8, "signed": false }"#;
    format!(
        r#"[{{
            "name": "C",
            "functions": [{{
                "name": "f",
                "src": {{ "start": 17, "length": 70 }},
                "parameters": [{{ "declaration": 3, "name": "a", "type": {uint8} }}],
                "returnParameters": [{{ "declaration": 4, "type": {uint8} }}],
                "body": [{{
                    "nodeType": "Return",
                    "src": {{ "start": 70, "length": 13 }},
                    "expression": {{
                        "nodeType": "BinaryOperation",
                        "operator": "{operator}",
                        "leftExpression": {{
                            "nodeType": "Identifier",
                            "name": "a",
                            "referencedDeclaration": 3,
                            "type": {uint8}
                        }},
                        "rightExpression": {{
                            "nodeType": "Literal",
                            "value": "1",
                            "type": {{ "kind": "rationalNumber", "numerator": "1" }}
                        }},
                        "type": {uint8}
                    }}
                }}]
            }}]
        }}]"#,
        uint8 = uint8,
        operator = operator
    )
}

/// Writes `C.json` and `C.sol` into a fresh directory.
fn fixture(operator: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("C.json");
    fs::write(&input, ast(operator)).unwrap();
    fs::write(dir.path().join("C.sol"), SOURCE).unwrap();
    (dir, input)
}

fn solir() -> Command {
    let mut cmd = Command::cargo_bin("solir").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_prints_init_ir_by_default() {
    let (_dir, input) = fixture("+");
    solir()
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("module {\n  \"sol.contract\"() ({"))
        .stdout(predicate::str::contains("\"arith.addi\""));
}

#[test]
fn test_low_level_action() {
    let (_dir, input) = fixture("+");
    solir()
        .arg(&input)
        .args(["--action", "low-level", "--target", "eravm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sym_name = \"__entry\""))
        .stdout(predicate::str::contains("\"llvm.cond_br\""))
        .stdout(predicate::str::contains("\"sol.").not());
}

#[test]
fn test_verify_action() {
    let (_dir, input) = fixture("+");
    solir()
        .arg(&input)
        .args(["--action", "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VALID"));
}

#[test]
fn test_output_file_and_forwarded_options() {
    let (dir, input) = fixture("+");
    let output = dir.path().join("C.mlir");
    solir()
        .arg(&input)
        .arg("--mlir-opts=--print-debuginfo --verify-each")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("loc(\"C.sol\":2:5)"), "{}", written);
    assert!(!written.contains("\u{1b}["));
}

#[test]
fn test_explicit_source_path() {
    let (dir, input) = fixture("+");
    let elsewhere = dir.path().join("renamed.sol");
    fs::rename(dir.path().join("C.sol"), &elsewhere).unwrap();

    solir().arg(&input).assert().failure().code(1);
    solir()
        .arg(&input)
        .arg("--source")
        .arg(&elsewhere)
        .arg("--mlir-opts=--print-debuginfo")
        .assert()
        .success()
        .stdout(predicate::str::contains("loc(\"renamed.sol\":2:5)"));
}

#[test]
fn test_unsupported_construct_fails() {
    let (_dir, input) = fixture("-");
    solir()
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("binary operator '-'"));
}

#[test]
fn test_bad_mlir_opts_is_a_config_error() {
    let (_dir, input) = fixture("+");
    solir()
        .arg(&input)
        .arg("--mlir-opts=--definitely-not-a-flag")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_invalid_json_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.json");
    fs::write(&input, "{ not json").unwrap();
    fs::write(dir.path().join("broken.sol"), SOURCE).unwrap();
    solir()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid AST"));
}

#[test]
fn test_json_that_is_not_a_contract_list() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("single.json");
    fs::write(&input, r#"{ "name": "C", "functions": [] }"#).unwrap();
    fs::write(dir.path().join("single.sol"), SOURCE).unwrap();
    solir()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid AST"));
}

#[test]
fn test_missing_input_file() {
    solir()
        .arg(Path::new("does/not/exist.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}
