// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a stream of test lifecycle events into suite reports for CI systems.
//!
//! A test framework emits events as it runs: an example group started, an example started,
//! passed, failed or is pending, the run finished. The [`EventAggregator`](aggregator::EventAggregator)
//! folds those events into [`TestSuiteRecord`](record::TestSuiteRecord)s, one per group, and hands
//! each finished suite to a [`ReportManager`](report::ReportManager), which writes it out (as JUnit
//! XML with [`JunitReportManager`](report::JunitReportManager)).
//!
//! The basic flow is:
//!
//! 1. Load a [`ReporterConfig`](config::ReporterConfig).
//! 2. Construct a report manager and an aggregator from it.
//! 3. Feed [`ReporterEvent`](events::ReporterEvent)s to the aggregator, finishing with
//!    `run-finished`.

#![warn(missing_docs)]

pub mod aggregator;
pub mod backtrace;
pub mod config;
pub mod display;
pub mod errors;
pub mod events;
pub mod failure;
pub mod record;
pub mod report;
mod stopwatch;
