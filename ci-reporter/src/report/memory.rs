// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::ReportManager;
use crate::{errors::WriteReportError, record::TestSuiteRecord};

/// A [`ReportManager`] that keeps every finished suite in memory, in submission order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryReportManager {
    suites: Vec<TestSuiteRecord>,
}

impl InMemoryReportManager {
    /// Creates a new, empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// The suites written so far.
    pub fn suites(&self) -> &[TestSuiteRecord] {
        &self.suites
    }

    /// Consumes the manager, returning the suites written to it.
    pub fn into_suites(self) -> Vec<TestSuiteRecord> {
        self.suites
    }
}

impl ReportManager for InMemoryReportManager {
    fn write_report(&mut self, suite: TestSuiteRecord) -> Result<(), WriteReportError> {
        self.suites.push(suite);
        Ok(())
    }
}
