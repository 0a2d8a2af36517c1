// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line interface for ci-reporter.
//!
//! Reads test lifecycle events as JSON lines and writes one JUnit XML report per example group.
//! The event model and report writers live in the `ci-reporter` library crate.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::ReporterExitCode;
pub use output::{Color, OutputContext, StderrStyles};
