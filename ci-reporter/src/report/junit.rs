// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code to generate JUnit XML reports from finished suites.

use super::ReportManager;
use crate::{
    config::ReportConfig,
    errors::WriteReportError,
    events::UNKNOWN_DESCRIPTION,
    record::{TestCaseRecord, TestSuiteRecord},
};
use camino::{Utf8Path, Utf8PathBuf};
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::{collections::HashSet, fs::File};
use xxhash_rust::xxh3::xxh3_64;

/// The longest file name, in bytes, that reports are written under.
const MAX_FILE_NAME_LEN: usize = 255;

static XML_EXTENSION: &str = ".xml";

/// A [`ReportManager`] that writes each suite to its own JUnit XML file.
///
/// Files are named `<KIND>-<suite name>.xml`, where every run of characters other than ASCII
/// letters and digits in the suite name is replaced with `-`.
#[derive(Clone, Debug)]
pub struct JunitReportManager {
    prefix: String,
    dir: Utf8PathBuf,
    written: HashSet<String>,
}

impl JunitReportManager {
    /// Creates a manager for reports of the given kind (e.g. `"spec"`), writing into `dir`.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(kind: &str, dir: impl Into<Utf8PathBuf>) -> Result<Self, WriteReportError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|error| WriteReportError::Fs {
            file: dir.clone(),
            error,
        })?;

        Ok(Self {
            prefix: kind.to_uppercase(),
            dir,
            written: HashSet::new(),
        })
    }

    /// Creates a manager from the report configuration, resolving relative directories against
    /// `cwd`.
    pub fn from_config(config: &ReportConfig, cwd: &Utf8Path) -> Result<Self, WriteReportError> {
        Self::new(config.kind(), config.resolve_dir(cwd))
    }

    /// The directory reports are written to.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Returns the path the next report for a suite named `suite_name` will be written to.
    pub fn path_for(&self, suite_name: &str) -> Utf8PathBuf {
        self.dir.join(self.file_name_for(suite_name))
    }

    fn file_name_for(&self, suite_name: &str) -> String {
        // Two suites with the same name in one run get distinct files.
        let mut counter = 0_usize;
        loop {
            let suffix = match counter {
                0 => String::new(),
                n => format!("-{n}"),
            };
            let stem = file_stem(&self.prefix, suite_name, suffix.len());
            let file_name = format!("{stem}{suffix}{XML_EXTENSION}");
            if !self.written.contains(&file_name) {
                return file_name;
            }
            counter += 1;
        }
    }
}

impl ReportManager for JunitReportManager {
    fn write_report(&mut self, suite: TestSuiteRecord) -> Result<(), WriteReportError> {
        let file_name = self.file_name_for(suite.name());
        let path = self.dir.join(&file_name);

        let mut report = Report::new(suite.name());
        report.set_timestamp(suite.start_time());
        if let Some(time) = suite.time() {
            report.set_time(time);
        }
        report.add_test_suite(to_junit_suite(&suite));

        let f = File::create(&path).map_err(|error| WriteReportError::Fs {
            file: path.clone(),
            error,
        })?;
        report
            .serialize(f)
            .map_err(|error| WriteReportError::Junit {
                file: path.clone(),
                error,
            })?;

        tracing::debug!(suite = %suite.name(), %path, "wrote JUnit report");
        self.written.insert(file_name);
        Ok(())
    }
}

/// Returns the file stem for a suite, leaving `reserved` bytes free for a uniquifying suffix.
fn file_stem(prefix: &str, suite_name: &str, reserved: usize) -> String {
    let stem = format!("{prefix}-{}", sanitize(suite_name));

    let max_stem_len = MAX_FILE_NAME_LEN - XML_EXTENSION.len() - reserved;
    if stem.len() <= max_stem_len {
        return stem;
    }

    // Keep as much of the name as fits, and disambiguate with a hash of the full name.
    let hash = format!("{:016x}", xxh3_64(stem.as_bytes()));
    let mut end = max_stem_len.saturating_sub(hash.len() + 1);
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}-{hash}", &stem[..end])
}

fn sanitize(suite_name: &str) -> String {
    let mut out = String::with_capacity(suite_name.len());
    let mut in_run = false;
    for c in suite_name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

fn to_junit_suite(suite: &TestSuiteRecord) -> TestSuite {
    let mut test_suite = TestSuite::new(suite.name());
    test_suite.set_timestamp(suite.start_time());
    if let Some(time) = suite.time() {
        test_suite.set_time(time);
    }
    for case in suite.testcases() {
        test_suite.add_test_case(to_junit_case(suite.name(), case));
    }
    test_suite
}

fn to_junit_case(classname: &str, case: &TestCaseRecord) -> TestCase {
    let status = match case.failures().first() {
        Some(first) => {
            // A case that raised any unexpected error is reported as an error, even if it also
            // had assertion failures.
            let kind = if case.is_error() {
                NonSuccessKind::Error
            } else {
                NonSuccessKind::Failure
            };
            let mut status = TestCaseStatus::non_success(kind);
            status
                .set_message(first.message())
                .set_type(first.name())
                .set_description(join_locations(case));
            status
        }
        None => match case.skipped() {
            Some(skipped) => {
                let mut status = TestCaseStatus::skipped();
                if let Some(message) = &skipped.message {
                    status.set_message(message.as_str());
                }
                status
            }
            None => TestCaseStatus::success(),
        },
    };

    let mut testcase = TestCase::new(case.name().unwrap_or(UNKNOWN_DESCRIPTION), status);
    testcase
        .set_classname(classname)
        .set_timestamp(case.start_time());
    if let Some(time) = case.time() {
        testcase.set_time(time);
    }
    testcase
}

/// Joins the locations of every failure in `case`, separated by blank lines.
fn join_locations(case: &TestCaseRecord) -> String {
    case.failures()
        .iter()
        .map(|failure| failure.location())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backtrace::PatternBacktraceFormatter,
        config::{BacktraceConfig, FrameworkProfile},
        events::RaisedException,
        failure::{FailureContext, FailureRecord},
        record::SkipInfo,
    };
    use camino_tempfile::Utf8TempDir;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn failure(class_name: &str, message: &str) -> FailureRecord {
        let framework = FrameworkProfile::new("Expectation", "Framework");
        let formatter = PatternBacktraceFormatter::new(&BacktraceConfig::unfiltered());
        FailureRecord::from_exception(
            &RaisedException::new(class_name, message).with_backtrace(["./spec/a_spec.rb:1"]),
            FailureContext::new(&framework, &formatter),
        )
    }

    fn finished_case(
        suite: &mut TestSuiteRecord,
        name: &str,
        failures: Vec<FailureRecord>,
        skipped: Option<SkipInfo>,
    ) {
        suite.start_case();
        let case = suite.last_case_mut().expect("case was just started");
        case.finish();
        case.set_name(name.to_owned());
        for failure in failures {
            case.add_failure(failure);
        }
        if let Some(skipped) = skipped {
            case.set_skipped(skipped);
        }
    }

    fn widget_suite() -> TestSuiteRecord {
        let mut suite = TestSuiteRecord::start("Widget".to_owned());
        finished_case(&mut suite, "Widget frobs", vec![], None);
        finished_case(
            &mut suite,
            "Widget counts",
            vec![failure("Expectation", "expected 2, got 3")],
            None,
        );
        finished_case(
            &mut suite,
            "Widget divides",
            vec![
                failure("Expectation", "first"),
                failure("ZeroDivisionError", "divided by 0"),
            ],
            None,
        );
        finished_case(
            &mut suite,
            "Widget flies",
            vec![],
            Some(SkipInfo {
                message: Some("not yet".to_owned()),
            }),
        );
        suite.finish();
        suite
    }

    #[test_case("Widget", "SPEC-Widget" ; "plain")]
    #[test_case("Widget#frob with  spaces", "SPEC-Widget-frob-with-spaces" ; "runs collapse")]
    #[test_case("Ünïcode names", "SPEC--n-code-names" ; "non ascii")]
    #[test_case("", "SPEC-" ; "empty")]
    fn file_stems(suite_name: &str, expected: &str) {
        assert_eq!(file_stem("SPEC", suite_name, 0), expected);
    }

    #[test]
    fn long_names_are_truncated_with_hash() {
        let long_name = "a".repeat(400);
        let stem = file_stem("SPEC", &long_name, 0);
        assert_eq!(stem.len() + XML_EXTENSION.len(), MAX_FILE_NAME_LEN);
        assert!(stem.starts_with("SPEC-aaaa"), "{stem}");

        let other = file_stem("SPEC", &format!("{long_name}b"), 0);
        assert_eq!(other.len(), stem.len());
        assert_ne!(stem, other, "names differing past the cut get different files");

        let dir = Utf8TempDir::new().expect("temp dir created");
        let mut manager = JunitReportManager::new("spec", dir.path()).expect("dir is created");
        let mut long_suite = TestSuiteRecord::start(long_name.clone());
        long_suite.finish();

        let first = manager.path_for(&long_name);
        manager
            .write_report(long_suite.clone())
            .expect("first long report written");
        let second = manager.path_for(&long_name);
        manager
            .write_report(long_suite)
            .expect("second long report written");

        assert_ne!(first, second);
        for path in [&first, &second] {
            let file_name = path.file_name().expect("path has a file name");
            assert!(
                file_name.len() <= MAX_FILE_NAME_LEN,
                "{file_name} is {} bytes",
                file_name.len()
            );
            assert!(path.is_file(), "{path} was written");
        }
        assert!(second.as_str().ends_with("-1.xml"), "{second}");
    }

    #[test]
    fn junit_suite_contents() {
        let suite = widget_suite();
        let test_suite = to_junit_suite(&suite);

        assert_eq!(test_suite.name.as_str(), "Widget");
        assert_eq!(test_suite.tests, 4);
        assert_eq!(test_suite.failures, 1);
        assert_eq!(test_suite.errors, 1);
        assert_eq!(test_suite.disabled, 1);

        let names: Vec<_> = test_suite
            .test_cases
            .iter()
            .map(|case| case.name.as_str())
            .collect();
        assert_eq!(
            names,
            ["Widget frobs", "Widget counts", "Widget divides", "Widget flies"]
        );

        match &test_suite.test_cases[2].status {
            TestCaseStatus::NonSuccess {
                kind,
                message,
                ty,
                description,
                ..
            } => {
                assert_eq!(*kind, NonSuccessKind::Error);
                assert_eq!(message.as_deref(), Some("first"));
                assert_eq!(ty.as_deref(), Some("Expectation"));
                assert_eq!(
                    description.as_deref(),
                    Some(
                        "Expectation:\nfirst\n     ./spec/a_spec.rb:1\n\n\
                         ZeroDivisionError:\ndivided by 0\n     ./spec/a_spec.rb:1"
                    )
                );
            }
            other => panic!("unexpected status: {other:?}"),
        }
        match &test_suite.test_cases[3].status {
            TestCaseStatus::Skipped { message, .. } => {
                assert_eq!(message.as_deref(), Some("not yet"));
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn writes_one_file_per_suite() {
        let dir = Utf8TempDir::new().expect("temp dir created");
        let reports_dir = dir.path().join("spec/reports");
        let mut manager = JunitReportManager::new("spec", &reports_dir).expect("dir is created");
        assert!(reports_dir.is_dir());

        assert_eq!(manager.path_for("Widget"), reports_dir.join("SPEC-Widget.xml"));
        manager.write_report(widget_suite()).expect("first report written");
        assert_eq!(manager.path_for("Widget"), reports_dir.join("SPEC-Widget-1.xml"));
        manager.write_report(widget_suite()).expect("second report written");

        let xml = std::fs::read_to_string(reports_dir.join("SPEC-Widget.xml"))
            .expect("first report exists");
        assert!(reports_dir.join("SPEC-Widget-1.xml").is_file());

        for needle in [
            "<testsuite name=\"Widget\"",
            "tests=\"4\"",
            "failures=\"1\"",
            "errors=\"1\"",
            "<testcase name=\"Widget frobs\" classname=\"Widget\"",
            "<failure message=\"expected 2, got 3\"",
            "<error message=\"first\"",
            "<skipped message=\"not yet\"",
        ] {
            assert!(xml.contains(needle), "report contains {needle}:\n{xml}");
        }
    }

    #[test]
    fn write_errors_are_reported() {
        let dir = Utf8TempDir::new().expect("temp dir created");
        let not_a_dir = dir.path().join("file");
        std::fs::write(&not_a_dir, "").expect("file written");

        let error = JunitReportManager::new("spec", not_a_dir.join("reports"))
            .expect_err("parent is a file");
        assert!(
            matches!(&error, WriteReportError::Fs { file, .. } if *file == not_a_dir.join("reports")),
            "unexpected error: {error:?}"
        );

        let reports_dir = dir.path().join("reports");
        let mut manager = JunitReportManager::new("spec", &reports_dir).expect("dir is created");
        std::fs::remove_dir(&reports_dir).expect("dir removed");
        let error = manager
            .write_report(widget_suite())
            .expect_err("dir no longer exists");
        assert!(
            matches!(&error, WriteReportError::Fs { file, .. } if *file == reports_dir.join("SPEC-Widget.xml")),
            "unexpected error: {error:?}"
        );
    }
}
