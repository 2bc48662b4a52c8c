mod fixtures;

use fixtures::*;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::process::Command;
use tempfile::tempdir;

fn sample_quest() -> tempfile::NamedTempFile {
    QuestBuilder::new()
        .header(0x211, 7)
        .section(b"RULE", 2, &rules_payload(&[1, 5]))
        .section(b"TILE", 0, &tiles_payload(&[0x21]))
        .write_to_tempfile()
}

#[test]
fn it_respects_file_output() {
    let d = tempdir().unwrap();
    let f = d.as_ref().join("test.out");
    let sample = sample_quest();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    cmd.args(["-f", &f.to_string_lossy(), sample.path().to_str().unwrap()]);

    assert!(
        cmd.output().unwrap().stdout.is_empty(),
        "Expected output to be printed to file, but was printed to stdout"
    );

    let mut expected = String::new();
    File::open(&f).unwrap().read_to_string(&mut expected).unwrap();
    let json: serde_json::Value = serde_json::from_str(&expected).unwrap();
    assert_eq!(json["HDR"]["data"]["build"], 7);
}

#[test]
fn it_creates_missing_parent_directories() {
    let d = tempdir().unwrap();
    let f = d.as_ref().join("nested").join("dir").join("test.out");
    let sample = sample_quest();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    cmd.args(["-f", &f.to_string_lossy(), sample.path().to_str().unwrap()]);

    cmd.assert().success();
    assert!(f.exists());
}

#[test]
fn test_it_refuses_to_overwrite_directory() {
    let d = tempdir().unwrap();
    let sample = sample_quest();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    cmd.args(["-f", &d.path().to_string_lossy(), sample.path().to_str().unwrap()]);

    cmd.assert().failure().code(1);
}

#[test]
fn test_it_overwrites_file_anyways_if_passed_flag() {
    let d = tempdir().unwrap();
    let f = d.as_ref().join("test.out");

    let mut file = File::create(&f).unwrap();
    file.write_all(b"I'm a file!").unwrap();

    let sample = sample_quest();
    let mut cmd = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    cmd.args([
        "-f",
        &f.to_string_lossy(),
        "--no-confirm-overwrite",
        sample.path().to_str().unwrap(),
    ]);

    cmd.assert().success();

    let written = fs::read_to_string(&f).unwrap();
    assert!(written.contains("\"RULE\""), "Expected output to be printed to file");
    assert!(!written.contains("I'm a file!"));
}

#[test]
fn it_prints_one_line_per_section_in_jsonl() {
    let sample = sample_quest();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    cmd.args(["-o", "jsonl", sample.path().to_str().unwrap()]);

    let out = cmd.output().unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    for (line, key) in lines.iter().zip(["HDR", "RULE", "TILE"]) {
        let json: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(json.get(key).is_some(), "expected `{}` in {}", key, line);
    }
}

#[test]
fn it_filters_sections() {
    let sample = sample_quest();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    cmd.args(["--sections", "rule,hdr", sample.path().to_str().unwrap()]);

    let out = cmd.output().unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["HDR", "RULE"]);
    assert_eq!(json["RULE"]["data"]["enabled"], serde_json::json!([1, 5]));
}

#[test]
fn it_prints_a_summary() {
    let mut payload = tiles_payload(&[0]);
    payload.extend_from_slice(&[0, 0]);
    let sample = QuestBuilder::new()
        .header(0x211, 7)
        .section(b"TILE", 0, &payload)
        .write_to_tempfile();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    cmd.args(["--summary", sample.path().to_str().unwrap()]);

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with(ENHANCED_PREAMBLE))
        .stdout(predicate::str::contains("HDR  revision   0"))
        .stdout(predicate::str::contains("ok, 1 diagnostics"))
        .stdout(predicate::str::contains("did not read all data, 2 bytes remaining"));
}

#[test]
fn it_fails_on_an_unrecognized_preamble() {
    let sample = QuestBuilder::with_preamble("not a quest")
        .header(0x211, 7)
        .write_to_tempfile();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    cmd.arg(sample.path());

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not a quest"));
}

#[test]
fn it_fails_when_resync_is_disabled() {
    let sample = QuestBuilder::new()
        .header(0x211, 7)
        .raw(&[0x01])
        .section(b"RULE", 2, &rules_payload(&[]))
        .write_to_tempfile();

    let mut resyncing = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    resyncing.arg(sample.path());
    resyncing.assert().success();

    let mut strict = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    strict.args(["--no-resync", sample.path().to_str().unwrap()]);
    strict.assert().failure().code(1);
}

#[test]
fn it_fails_on_a_missing_input() {
    let d = tempdir().unwrap();
    let mut cmd = Command::new(assert_cmd::cargo_bin!("qst_dump"));
    cmd.arg(d.path().join("missing.qst"));

    cmd.assert().failure().code(1);
}
