// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `ci-reporter` failures.
///
/// `ci-reporter` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum ReporterExitCode {}

impl ReporterExitCode {
    /// No errors occurred and every suite was written.
    pub const OK: i32 = 0;

    /// An error occurred while setting up the run, e.g. a config file failed to parse or the
    /// input could not be opened.
    pub const SETUP_ERROR: i32 = 96;

    /// A line of input could not be decoded as an event.
    pub const MALFORMED_EVENT: i32 = 97;

    /// A failure event carried no exception.
    pub const MISSING_EXCEPTION: i32 = 98;

    /// The input ended before the run finished. The suite that was open at that point was not
    /// written.
    pub const INCOMPLETE_RUN: i32 = 106;

    /// Writing a report or progress output failed.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
