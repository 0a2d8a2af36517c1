// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The state machine that turns lifecycle events into suite reports.

use crate::{
    backtrace::{BacktraceFormatter, PatternBacktraceFormatter},
    config::{FrameworkProfile, ReporterConfig},
    errors::ReporterError,
    events::{
        Describe, ExampleView, ReporterEvent, RunSummary, UNKNOWN_DESCRIPTION, description_for,
    },
    failure::{FailureContext, FailureRecord},
    record::{SkipInfo, TestCaseRecord, TestSuiteRecord},
    report::ReportManager,
};
use debug_ignore::DebugIgnore;

/// Aggregates lifecycle events into suites, and hands each finished suite to a
/// [`ReportManager`].
///
/// At most one suite is open at a time. It is finished and written when the next group starts or
/// when the run finishes. Events are expected one at a time, in the order the framework emits
/// them; unexpected orderings are recovered from on a best-effort basis instead of failing.
///
/// If the process exits before [`run_finished`](Self::run_finished) is called, the open suite is
/// never written.
#[derive(Debug)]
pub struct EventAggregator<M> {
    report_manager: M,
    framework: FrameworkProfile,
    backtrace_formatter: DebugIgnore<Box<dyn BacktraceFormatter>>,
    suite: Option<TestSuiteRecord>,
    suites_written: usize,
}

impl<M: ReportManager> EventAggregator<M> {
    /// Creates a new aggregator.
    pub fn new(
        report_manager: M,
        framework: FrameworkProfile,
        backtrace_formatter: impl BacktraceFormatter + 'static,
    ) -> Self {
        Self {
            report_manager,
            framework,
            backtrace_formatter: DebugIgnore(Box::new(backtrace_formatter)),
            suite: None,
            suites_written: 0,
        }
    }

    /// Creates a new aggregator using the framework profile and backtrace settings in `config`.
    pub fn from_config(report_manager: M, config: &ReporterConfig) -> Self {
        Self::new(
            report_manager,
            config.framework().clone(),
            PatternBacktraceFormatter::new(config.backtrace()),
        )
    }

    /// Dispatches a decoded event to the matching handler.
    pub fn handle_event(&mut self, event: ReporterEvent) -> Result<(), ReporterError> {
        match event {
            ReporterEvent::GroupStarted { group } => self.group_started(&group)?,
            ReporterEvent::CaseStarted { .. } => self.case_started(),
            ReporterEvent::CasePassed { example } => self.case_passed(&example),
            ReporterEvent::CaseFailed { example } => self.case_failed(&example)?,
            ReporterEvent::CasePending { example } => self.case_pending(&example),
            ReporterEvent::RunFinished { summary } => self.run_finished(summary.as_ref())?,
        }
        Ok(())
    }

    /// An example group started: the open suite, if any, is written, and a new one is opened.
    pub fn group_started(&mut self, group: &(impl Describe + ?Sized)) -> Result<(), ReporterError> {
        self.write_report()?;

        let name = description_for(group);
        tracing::debug!(suite = %name, "opening suite");
        self.suite = Some(TestSuiteRecord::start(name));
        Ok(())
    }

    /// An example started: a new, unnamed case is appended to the open suite.
    pub fn case_started(&mut self) {
        open_suite(&mut self.suite).start_case();
    }

    /// An example passed: the last case is finished and named.
    pub fn case_passed(&mut self, example: &(impl Describe + ?Sized)) {
        finish_last_case(&mut self.suite, example);
    }

    /// An example failed: the last case is finished and named, and a failure is recorded against
    /// it.
    ///
    /// If the open suite has no cases yet (for example because the failure happened in
    /// suite-level setup) a case is started first.
    ///
    /// Returns an error if the example carries no exception. The case is still finished and named
    /// in that case, but no failure is recorded.
    pub fn case_failed(
        &mut self,
        example: &(impl ExampleView + ?Sized),
    ) -> Result<(), ReporterError> {
        tracing::debug!(
            example = %description_for(example),
            exception = ?example.raised_exception(),
            "example failed"
        );

        let cx = FailureContext::new(&self.framework, &*self.backtrace_formatter.0);
        let case = finish_last_case(&mut self.suite, example);
        let failure = FailureRecord::new(example, cx)?;
        case.add_failure(failure);
        Ok(())
    }

    /// An example is pending: the last case is finished, named, and marked as skipped.
    pub fn case_pending(&mut self, example: &(impl ExampleView + ?Sized)) {
        let case = finish_last_case(&mut self.suite, example);
        case.set_skipped(SkipInfo {
            message: example.pending_message().map(str::to_owned),
        });
    }

    /// The run finished: the open suite, if any, is written.
    pub fn run_finished(&mut self, summary: Option<&RunSummary>) -> Result<(), ReporterError> {
        self.write_report()?;

        if let Some(summary) = summary {
            tracing::debug!(
                duration = ?summary.duration,
                examples = ?summary.example_count,
                failures = ?summary.failure_count,
                pending = ?summary.pending_count,
                "framework reported run summary"
            );
        }
        tracing::info!(suites = self.suites_written, "test run finished");
        Ok(())
    }

    /// The currently open suite, if any.
    pub fn current_suite(&self) -> Option<&TestSuiteRecord> {
        self.suite.as_ref()
    }

    /// The number of suites written so far.
    pub fn suites_written(&self) -> usize {
        self.suites_written
    }

    /// Returns the report manager.
    pub fn report_manager(&self) -> &M {
        &self.report_manager
    }

    /// Consumes the aggregator, returning the report manager.
    ///
    /// A suite that is still open is discarded.
    pub fn into_report_manager(self) -> M {
        self.report_manager
    }

    fn write_report(&mut self) -> Result<(), ReporterError> {
        let Some(mut suite) = self.suite.take() else {
            return Ok(());
        };

        suite.finish();
        let name = suite.name().to_owned();
        tracing::debug!(suite = %name, tests = suite.tests(), "writing suite");
        self.report_manager
            .write_report(suite)
            .map_err(|error| ReporterError::Write { suite: name, error })?;
        self.suites_written += 1;
        Ok(())
    }
}

fn open_suite(suite: &mut Option<TestSuiteRecord>) -> &mut TestSuiteRecord {
    suite.get_or_insert_with(|| {
        tracing::warn!("example event received outside of any group, opening an unnamed suite");
        TestSuiteRecord::start(UNKNOWN_DESCRIPTION.to_owned())
    })
}

fn finish_last_case<'a>(
    suite: &'a mut Option<TestSuiteRecord>,
    example: &(impl Describe + ?Sized),
) -> &'a mut TestCaseRecord {
    let case = open_suite(suite).last_case_or_start();
    case.finish();
    case.set_name(description_for(example));
    case
}
