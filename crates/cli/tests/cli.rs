//! End-to-end tests for the pep10 binary.

use std::fs;
use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_assembles_file_and_prints_listing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "cat:BR 3,i\nCALL cat,i\n").unwrap();

    Command::cargo_bin("pep10")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0000 240003 cat:   BR     3,i"))
        .stdout(predicate::str::contains("0003 360000        CALL   cat,i"));
}

#[test]
fn test_writes_object_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("prog.pep");
    let object_path = dir.path().join("prog.pepo");
    fs::write(&source_path, "NOTA\nNOTA\nRET\n").unwrap();

    Command::cargo_bin("pep10")
        .unwrap()
        .arg(&source_path)
        .arg("-o")
        .arg(&object_path)
        .assert()
        .success();

    assert_eq!(fs::read(&object_path).unwrap(), vec![0x18, 0x18, 0x01]);
}

#[test]
fn test_reports_errors_and_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "RETS\nRET\n").unwrap();

    Command::cargo_bin("pep10")
        .unwrap()
        .arg(file.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains(";ERROR: Unrecognized mnemonic: RETS"))
        .stderr(predicate::str::contains("Unrecognized mnemonic: RETS"));
}

#[test]
fn test_undefined_symbol_fails_without_object() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("prog.pep");
    let object_path = dir.path().join("prog.pepo");
    fs::write(&source_path, "BR dog,i\n").unwrap();

    Command::cargo_bin("pep10")
        .unwrap()
        .arg(&source_path)
        .arg("-o")
        .arg(&object_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Undefined symbol: dog"));

    assert!(!object_path.exists());
}

#[test]
fn test_missing_input_fails() {
    Command::cargo_bin("pep10")
        .unwrap()
        .arg("does-not-exist.pep")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}
