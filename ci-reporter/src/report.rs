// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writing finished suites out.
//!
//! The aggregator hands every finished [`TestSuiteRecord`] to a [`ReportManager`]. The
//! [`JunitReportManager`] writes one JUnit XML file per suite; the [`InMemoryReportManager`] keeps
//! suites around for callers that want to inspect them.

mod junit;
mod memory;

pub use junit::*;
pub use memory::*;

use crate::{errors::WriteReportError, record::TestSuiteRecord};

/// Receives finished suites and stores them durably.
pub trait ReportManager {
    /// Writes out a finished suite.
    ///
    /// Errors are propagated to the caller of the event that finished the suite. Nothing is
    /// retried.
    fn write_report(&mut self, suite: TestSuiteRecord) -> Result<(), WriteReportError>;
}
