// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    exit_codes::ReporterExitCode,
    output::{NO_HEADING_TARGET, StderrStyles},
};
use camino::Utf8PathBuf;
use ci_reporter::errors::{ConfigParseError, ReporterError, WriteReportError};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error that terminates a `ci-reporter` invocation.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("failed to determine current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: camino::FromPathBufError,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to set up report directory")]
    ReportSetupError {
        #[source]
        err: WriteReportError,
    },
    #[error("failed to open input")]
    InputOpenError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to read input")]
    InputReadError {
        input: String,
        line: usize,
        #[source]
        err: std::io::Error,
    },
    #[error("malformed event")]
    MalformedEvent {
        input: String,
        line: usize,
        #[source]
        err: serde_json::Error,
    },
    #[error("failed to write progress output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
    #[error("error handling event")]
    ReporterError {
        input: String,
        line: usize,
        #[source]
        err: ReporterError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. }
            | Self::InputOpenError { .. }
            | Self::InputReadError { .. } => ReporterExitCode::SETUP_ERROR,
            Self::MalformedEvent { .. } => ReporterExitCode::MALFORMED_EVENT,
            Self::ReportSetupError { .. } | Self::WriteOutputError { .. } => {
                ReporterExitCode::WRITE_OUTPUT_ERROR
            }
            Self::ReporterError { err, .. } => match err {
                ReporterError::Failure(_) => ReporterExitCode::MISSING_EXCEPTION,
                _ => ReporterExitCode::WRITE_OUTPUT_ERROR,
            },
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirFailed { err } => {
                tracing::error!("failed to determine current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                tracing::error!("current directory is not valid UTF-8");
                Some(err as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::ReportSetupError { err } => {
                tracing::error!("failed to set up report directory");
                Some(err as &dyn Error)
            }
            Self::InputOpenError { path, err } => {
                tracing::error!("failed to open input `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::InputReadError { input, line, err } => {
                tracing::error!(
                    "failed to read line {} of {}",
                    line.style(styles.bold),
                    input.style(styles.bold),
                );
                Some(err as &dyn Error)
            }
            Self::MalformedEvent { input, line, err } => {
                tracing::error!(
                    "line {} of {} is not a valid event",
                    line.style(styles.bold),
                    input.style(styles.bold),
                );
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                tracing::error!("failed to write progress output");
                Some(err as &dyn Error)
            }
            Self::ReporterError { input, line, err } => {
                tracing::error!(
                    "error handling event at line {} of {}",
                    line.style(styles.bold),
                    input.style(styles.bold),
                );
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ci_reporter::errors::FailureRecordError;

    #[test]
    fn exit_codes_follow_error_kind() {
        let missing = ExpectedError::ReporterError {
            input: "<stdin>".to_owned(),
            line: 3,
            err: ReporterError::Failure(FailureRecordError::MissingException {
                example: "divides".to_owned(),
            }),
        };
        assert_eq!(
            missing.process_exit_code(),
            ReporterExitCode::MISSING_EXCEPTION
        );

        let write = ExpectedError::ReporterError {
            input: "<stdin>".to_owned(),
            line: 3,
            err: ReporterError::Write {
                suite: "Calculator".to_owned(),
                error: WriteReportError::Fs {
                    file: "reports/SPEC-Calculator.xml".into(),
                    error: std::io::Error::other("disk full"),
                },
            },
        };
        assert_eq!(write.process_exit_code(), ReporterExitCode::WRITE_OUTPUT_ERROR);

        let malformed = ExpectedError::MalformedEvent {
            input: "<stdin>".to_owned(),
            line: 1,
            err: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        };
        assert_eq!(
            malformed.process_exit_code(),
            ReporterExitCode::MALFORMED_EVENT
        );
    }
}
