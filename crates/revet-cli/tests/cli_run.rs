//! Integration tests for the `revet run` command.

use assert_cmd::Command;
use camino::Utf8PathBuf;
use predicates::prelude::*;
use revet_test_util::{sample_input_json, write_input, write_policy};
use serde_json::Value;

fn revet_cmd() -> Command {
    Command::cargo_bin("revet").expect("revet binary builds")
}

fn temp_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir")
}

#[test]
fn help_works() {
    revet_cmd().arg("--help").assert().success();
}

#[test]
fn failing_policy_exits_one_with_the_stable_result_contract() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = temp_root(&dir);
    let policy = write_policy(&root, "revetfile.js", r#"fail("too short")"#);

    let output = revet_cmd()
        .arg("run")
        .arg("--policy")
        .arg(policy.as_str())
        .current_dir(dir.path())
        .output()
        .expect("revet runs");

    assert_eq!(output.status.code(), Some(1));
    let envelope: Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a results envelope");
    assert_eq!(envelope["schema"], "revet.results.v1");
    // The four lists are top-level keys, not nested under a wrapper.
    assert_eq!(
        envelope["fails"],
        serde_json::json!([{ "message": "too short" }])
    );
    for list in ["warnings", "messages", "markdowns"] {
        assert_eq!(envelope[list], serde_json::json!([]), "list: {list}");
    }
}

#[test]
fn clean_policy_exits_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = temp_root(&dir);
    write_policy(&root, "revetfile.js", r#"message("looks good")"#);

    revet_cmd()
        .arg("run")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("looks good"));
}

#[test]
fn discovery_finds_the_revetfile_in_the_working_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = temp_root(&dir);
    write_policy(&root, "revetfile.js", r#"warn("heads up")"#);

    let output = revet_cmd()
        .arg("run")
        .current_dir(dir.path())
        .output()
        .expect("revet runs");

    // Warnings alone do not fail the run.
    assert_eq!(output.status.code(), Some(0));
    let envelope: Value = serde_json::from_slice(&output.stdout).expect("results envelope");
    assert_eq!(envelope["warnings"][0]["message"], "heads up");
}

#[test]
fn policy_reads_the_input_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = temp_root(&dir);
    write_policy(
        &root,
        "revetfile.js",
        r#"message(review.git.modified_files.length + " files changed")"#,
    );
    let input = write_input(&root, &sample_input_json());

    revet_cmd()
        .arg("run")
        .arg("--input")
        .arg(input.as_str())
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 files changed"));
}

#[test]
fn input_document_can_come_from_stdin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = temp_root(&dir);
    write_policy(
        &root,
        "revetfile.js",
        r#"message("pr #" + review.platform.pr.number)"#,
    );

    revet_cmd()
        .arg("run")
        .arg("--input")
        .arg("-")
        .current_dir(dir.path())
        .write_stdin(sample_input_json())
        .assert()
        .success()
        .stdout(predicate::str::contains("pr #42"));
}

#[test]
fn results_can_be_written_to_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = temp_root(&dir);
    write_policy(&root, "revetfile.js", r###"markdown("## summary")"###);
    let out = root.join("results.json");

    revet_cmd()
        .arg("run")
        .arg("--output")
        .arg(out.as_str())
        .current_dir(dir.path())
        .assert()
        .success();

    let text = std::fs::read_to_string(out.as_std_path()).expect("results written");
    let envelope: Value = serde_json::from_str(&text).expect("results envelope");
    assert_eq!(envelope["markdowns"][0], "## summary");
}

#[test]
fn throwing_policy_exits_two() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = temp_root(&dir);
    write_policy(&root, "revetfile.js", r#"throw new Error("boom")"#);

    revet_cmd()
        .arg("run")
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("revet[execution]"))
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn missing_policy_file_exits_two() {
    let dir = tempfile::tempdir().expect("tempdir");

    revet_cmd()
        .arg("run")
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("revetfile"));
}

#[test]
fn invalid_input_document_exits_two() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = temp_root(&dir);
    write_policy(&root, "revetfile.js", r#"message("unreached")"#);
    let input = write_input(&root, "not json");

    revet_cmd()
        .arg("run")
        .arg("--input")
        .arg(input.as_str())
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("input document"));
}
