// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The report model: suites containing cases containing failures.

use crate::{
    failure::FailureRecord,
    stopwatch::{StopwatchSnapshot, StopwatchStart, stopwatch},
};
use chrono::{DateTime, Local};
use std::time::Duration;

/// One executed example.
#[derive(Clone, Debug)]
pub struct TestCaseRecord {
    name: Option<String>,
    stopwatch: StopwatchStart,
    end: Option<StopwatchSnapshot>,
    failures: Vec<FailureRecord>,
    skipped: Option<SkipInfo>,
}

impl TestCaseRecord {
    /// Creates a new, running test case. The start time is the current time.
    pub(crate) fn start() -> Self {
        Self {
            name: None,
            stopwatch: stopwatch(),
            end: None,
            failures: Vec::new(),
            skipped: None,
        }
    }

    /// Marks this case as finished. Only the first call has an effect.
    pub(crate) fn finish(&mut self) {
        if self.end.is_none() {
            self.end = Some(self.stopwatch.snapshot());
        } else {
            tracing::debug!(
                name = ?self.name,
                "test case finished more than once, keeping the first end time"
            );
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn add_failure(&mut self, failure: FailureRecord) {
        self.failures.push(failure);
    }

    pub(crate) fn set_skipped(&mut self, skipped: SkipInfo) {
        self.skipped = Some(skipped);
    }

    /// The name of the case, or `None` if it hasn't finished yet.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The time at which the case started.
    pub fn start_time(&self) -> DateTime<Local> {
        self.stopwatch.start_time()
    }

    /// The time at which the case finished, or `None` if it is still running.
    pub fn end_time(&self) -> Option<DateTime<Local>> {
        self.end.map(|end| end.end_time())
    }

    /// How long the case took, or `None` if it is still running.
    pub fn time(&self) -> Option<Duration> {
        self.end.map(|end| end.duration)
    }

    /// Returns true once the case has finished.
    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    /// The failures recorded against this case, in the order they were raised.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Returns true if any recorded failure is an assertion failure.
    pub fn is_failure(&self) -> bool {
        self.failures.iter().any(FailureRecord::is_failure)
    }

    /// Returns true if any recorded failure is an error.
    pub fn is_error(&self) -> bool {
        self.failures.iter().any(FailureRecord::is_error)
    }

    /// Returns skip information if the case was pending.
    pub fn skipped(&self) -> Option<&SkipInfo> {
        self.skipped.as_ref()
    }

    /// Returns true if the case was pending.
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Information about a pending case.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SkipInfo {
    /// The reason the case is pending, if the framework gave one.
    pub message: Option<String>,
}

/// One logical group of test cases.
#[derive(Clone, Debug)]
pub struct TestSuiteRecord {
    name: String,
    stopwatch: StopwatchStart,
    end: Option<StopwatchSnapshot>,
    testcases: Vec<TestCaseRecord>,
}

impl TestSuiteRecord {
    /// Creates a new, open suite. The start time is the current time.
    pub(crate) fn start(name: String) -> Self {
        Self {
            name,
            stopwatch: stopwatch(),
            end: None,
            testcases: Vec::new(),
        }
    }

    /// Closes the suite: sets the end time and drops cases that never finished.
    pub(crate) fn finish(&mut self) {
        let before = self.testcases.len();
        self.testcases.retain(TestCaseRecord::is_finished);
        let dropped = before - self.testcases.len();
        if dropped > 0 {
            tracing::warn!(
                suite = %self.name,
                dropped,
                "dropping test cases that started but never finished"
            );
        }

        self.end = Some(self.stopwatch.snapshot());
    }

    pub(crate) fn start_case(&mut self) {
        self.testcases.push(TestCaseRecord::start());
    }

    #[cfg(test)]
    pub(crate) fn last_case_mut(&mut self) -> Option<&mut TestCaseRecord> {
        self.testcases.last_mut()
    }

    /// Returns the last case, starting one first if the suite has none.
    pub(crate) fn last_case_or_start(&mut self) -> &mut TestCaseRecord {
        if self.testcases.is_empty() {
            self.start_case();
        }
        let last = self.testcases.len() - 1;
        &mut self.testcases[last]
    }

    /// The name of the suite.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The time at which the suite started.
    pub fn start_time(&self) -> DateTime<Local> {
        self.stopwatch.start_time()
    }

    /// The time at which the suite finished, or `None` if it is still open.
    pub fn end_time(&self) -> Option<DateTime<Local>> {
        self.end.map(|end| end.end_time())
    }

    /// How long the suite took, or `None` if it is still open.
    pub fn time(&self) -> Option<Duration> {
        self.end.map(|end| end.duration)
    }

    /// The cases in this suite, in execution order.
    pub fn testcases(&self) -> &[TestCaseRecord] {
        &self.testcases
    }

    /// The number of cases in this suite.
    pub fn tests(&self) -> usize {
        self.testcases.len()
    }

    /// The number of cases with at least one assertion failure.
    pub fn failures(&self) -> usize {
        self.testcases.iter().filter(|case| case.is_failure()).count()
    }

    /// The number of cases with at least one error.
    pub fn errors(&self) -> usize {
        self.testcases.iter().filter(|case| case.is_error()).count()
    }

    /// The number of pending cases.
    pub fn skipped(&self) -> usize {
        self.testcases.iter().filter(|case| case.is_skipped()).count()
    }
}
