// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests that run the `ci-reporter` binary against event streams.

use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use ci_reporter_cli::ReporterExitCode;
use cli::ReporterCli;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;

mod cli;

static CALCULATOR_RUN: &str = indoc! {r#"
    {"event": "group-started", "group": {"full_description": "Calculator"}}
    {"event": "case-started"}
    {"event": "case-passed", "example": {"full_description": "Calculator adds", "execution_result": {}}}

    {"event": "case-started"}
    {"event": "case-failed", "example": {"full_description": "Calculator subtracts", "execution_result": {"exception": {"class_name": "RSpec::Expectations::ExpectationNotMetError", "message": "expected 4, got 5", "backtrace": ["spec/calculator_spec.rb:12"]}}}}
    {"event": "group-started", "group": {"full_description": "Parser handles/input"}}
    {"event": "case-started"}
    {"event": "case-pending", "example": {"full_description": "Parser handles/input later", "execution_result": {"pending_message": "not yet"}}}
    {"event": "run-finished", "summary": {"duration": 0.25, "example_count": 3, "failure_count": 1, "pending_count": 1}}
"#};

fn temp_dir() -> Utf8TempDir {
    camino_tempfile::Builder::new()
        .prefix("ci-reporter-test-")
        .tempdir()
        .expect("created temp dir")
}

fn report_files(dir: &Utf8Path) -> Vec<String> {
    let mut files: Vec<_> = dir
        .read_dir_utf8()
        .expect("report dir exists")
        .map(|entry| entry.expect("read dir entry").file_name().to_owned())
        .collect();
    files.sort();
    files
}

#[test]
fn writes_one_report_per_group() {
    let temp = temp_dir();
    let input = temp.path().join("events.jsonl");
    fs::write(&input, CALCULATOR_RUN).unwrap();

    let output = ReporterCli::new(temp.path())
        .args([input.as_str()])
        .output();
    assert_eq!(output.exit_code(), Some(ReporterExitCode::OK), "{output:?}");

    let reports = temp.path().join("spec/reports");
    assert_eq!(
        report_files(&reports),
        vec![
            "SPEC-Calculator.xml".to_owned(),
            "SPEC-Parser-handles-input.xml".to_owned(),
        ]
    );

    let calculator = fs::read_to_string(reports.join("SPEC-Calculator.xml")).unwrap();
    assert!(
        calculator.contains(r#"name="Calculator adds""#),
        "{calculator}"
    );
    assert!(calculator.contains("<failure"), "{calculator}");
    assert!(calculator.contains("expected 4, got 5"), "{calculator}");
    assert!(
        calculator.contains("spec/calculator_spec.rb:12"),
        "{calculator}"
    );

    let parser = fs::read_to_string(reports.join("SPEC-Parser-handles-input.xml")).unwrap();
    assert!(parser.contains("<skipped"), "{parser}");
    assert!(parser.contains("not yet"), "{parser}");
}

#[test]
fn progress_output_is_printed_to_stdout() {
    let temp = temp_dir();

    let output = ReporterCli::new(temp.path()).stdin(CALCULATOR_RUN).output();
    assert_eq!(output.exit_code(), Some(ReporterExitCode::OK), "{output:?}");

    assert!(output.stdout.starts_with(".F*\n"), "{output:?}");
    assert!(
        output.stdout.contains("  1) Calculator subtracts\n     expected 4, got 5\n"),
        "{output:?}"
    );
    assert!(
        output.stdout.contains("Finished in 0.25000 seconds\n"),
        "{output:?}"
    );
    assert!(
        output.stdout.ends_with("3 examples, 1 failure, 1 pending\n"),
        "{output:?}"
    );
}

#[test]
fn doc_output_lists_groups_and_examples() {
    let temp = temp_dir();

    let output = ReporterCli::new(temp.path())
        .args(["--format", "doc"])
        .stdin(CALCULATOR_RUN)
        .output();
    assert_eq!(output.exit_code(), Some(ReporterExitCode::OK), "{output:?}");

    assert!(
        output.stdout.starts_with(indoc! {"

            Calculator
              Calculator adds
              Calculator subtracts (FAILED - 1)

            Parser handles/input
              Parser handles/input later (PENDING: not yet)
        "}),
        "{output:?}"
    );
}

#[test]
fn no_progress_output_with_format_none() {
    let temp = temp_dir();

    let output = ReporterCli::new(temp.path())
        .args(["--format", "none"])
        .stdin(CALCULATOR_RUN)
        .output();
    assert_eq!(output.exit_code(), Some(ReporterExitCode::OK), "{output:?}");
    assert_eq!(output.stdout, "");
    assert_eq!(
        report_files(&temp.path().join("spec/reports")).len(),
        2,
        "reports are still written"
    );
}

#[test]
fn reads_stdin_with_kind_and_report_dir() {
    let temp = temp_dir();

    let output = ReporterCli::new(temp.path())
        .args(["--kind", "features", "--report-dir", "out", "-"])
        .stdin(CALCULATOR_RUN)
        .output();
    assert_eq!(output.exit_code(), Some(ReporterExitCode::OK), "{output:?}");

    assert_eq!(
        report_files(&temp.path().join("out")),
        vec![
            "FEATURES-Calculator.xml".to_owned(),
            "FEATURES-Parser-handles-input.xml".to_owned(),
        ]
    );
}

#[test]
fn malformed_line_is_reported_with_line_number() {
    let temp = temp_dir();
    let input = indoc! {r#"
        {"event": "group-started", "group": {"full_description": "Calculator"}}
        {"event": "case-exploded"}
    "#};

    let output = ReporterCli::new(temp.path()).stdin(input).output();
    assert_eq!(
        output.exit_code(),
        Some(ReporterExitCode::MALFORMED_EVENT),
        "{output:?}"
    );
    assert!(output.stderr.contains("line 2"), "{output:?}");
}

#[test]
fn failure_without_exception_fails_fast() {
    let temp = temp_dir();
    let input = indoc! {r#"
        {"event": "group-started", "group": {"full_description": "Calculator"}}
        {"event": "case-started"}
        {"event": "case-failed", "example": {"full_description": "Calculator divides", "execution_result": {}}}
        {"event": "run-finished"}
    "#};

    let output = ReporterCli::new(temp.path()).stdin(input).output();
    assert_eq!(
        output.exit_code(),
        Some(ReporterExitCode::MISSING_EXCEPTION),
        "{output:?}"
    );
    assert!(output.stderr.contains("Calculator divides"), "{output:?}");
}

#[test]
fn input_ending_mid_run_leaves_open_suite_unwritten() {
    let temp = temp_dir();
    let input = indoc! {r#"
        {"event": "group-started", "group": {"full_description": "Calculator"}}
        {"event": "case-started"}
        {"event": "case-passed", "example": {"full_description": "Calculator adds", "execution_result": {}}}
        {"event": "group-started", "group": {"full_description": "Parser"}}
        {"event": "case-started"}
    "#};

    let output = ReporterCli::new(temp.path()).stdin(input).output();
    assert_eq!(
        output.exit_code(),
        Some(ReporterExitCode::INCOMPLETE_RUN),
        "{output:?}"
    );
    assert_eq!(
        report_files(&temp.path().join("spec/reports")),
        vec!["SPEC-Calculator.xml".to_owned()]
    );
}

#[test]
fn setup_errors() {
    let temp = temp_dir();

    let output = ReporterCli::new(temp.path())
        .args(["does-not-exist.jsonl"])
        .output();
    assert_eq!(
        output.exit_code(),
        Some(ReporterExitCode::SETUP_ERROR),
        "{output:?}"
    );

    let config = temp.path().join("ci-reporter.toml");
    fs::write(
        &config,
        indoc! {r#"
            [backtrace]
            exclusion-patterns = ["("]
        "#},
    )
    .unwrap();
    let output = ReporterCli::new(temp.path())
        .args(["--config", config.as_str()])
        .stdin("")
        .output();
    assert_eq!(
        output.exit_code(),
        Some(ReporterExitCode::SETUP_ERROR),
        "{output:?}"
    );
    assert!(output.stderr.contains("Caused by:"), "{output:?}");
}
