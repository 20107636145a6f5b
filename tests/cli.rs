use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;

fn cmd() -> Command {
    Command::cargo_bin("cv-generate").unwrap()
}

fn write_input(dir: &Path, yaml: &str) -> std::path::PathBuf {
    let path = dir.join("cv.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn generates_pdf_and_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "name: Jane Doe\nstyle:\n  colors:\n    primary: \"#000000\"\n",
    );
    let output = dir.path().join("cv.pdf");

    cmd()
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(contains("CV generated:"))
        .stdout(contains("cv.pdf"));

    let bytes = fs::read(&output).unwrap();
    assert!(!bytes.is_empty());
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn missing_input_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cv.pdf");

    cmd()
        .arg(dir.path().join("missing.yaml"))
        .arg(&output)
        .assert()
        .failure()
        .stderr(contains("Error:"))
        .stderr(contains("missing.yaml"));

    assert!(!output.exists());
}

#[test]
fn html_flag_writes_debug_html() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "personal:\n  name: Jane Doe\n");
    let html = dir.path().join("debug/cv.html");

    cmd()
        .arg(&input)
        .arg(dir.path().join("cv.pdf"))
        .arg("--html")
        .arg(&html)
        .arg("--landscape")
        .assert()
        .success();

    let page = fs::read_to_string(&html).unwrap();
    assert!(page.contains("<style>"));
    assert!(page.contains("Jane Doe"));
}

#[test]
fn help_explains_html_is_kept_on_failure() {
    let assert = cmd().arg("--help").assert().success();
    let help = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    // Help text may be wrapped to the terminal width.
    let help = help.split_whitespace().collect::<Vec<_>>().join(" ");
    assert!(help.contains("--html"));
    assert!(help.contains("stays behind if the PDF step fails"), "{help}");
}

#[test]
fn custom_template_dir_without_html_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "name: Jane\n");
    let templates = dir.path().join("templates");
    fs::create_dir(&templates).unwrap();
    let output = dir.path().join("cv.pdf");

    cmd()
        .arg(&input)
        .arg(&output)
        .arg("--template")
        .arg(&templates)
        .assert()
        .failure()
        .stderr(contains("template not found"));

    assert!(!output.exists());
}

#[test]
fn missing_arguments_is_usage_error() {
    cmd().assert().failure().stderr(contains("Usage"));
}
