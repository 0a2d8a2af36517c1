// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by ci-reporter.

use camino::Utf8PathBuf;
use config::ConfigError;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse ci-reporter config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &camino::Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// A backtrace pattern was not a valid regular expression.
    #[error("invalid backtrace {list} pattern `{pattern}`")]
    InvalidPattern {
        /// The list the pattern was found in (`exclusion-patterns` or `inclusion-patterns`).
        list: &'static str,

        /// The pattern that failed to compile.
        pattern: String,

        /// The underlying error.
        #[source]
        err: regex::Error,
    },
}

/// An error that occurred while building a [`FailureRecord`](crate::failure::FailureRecord).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FailureRecordError {
    /// The failed example carried no exception in any of the known result fields.
    ///
    /// This indicates that the event adapter and the test framework disagree about where the
    /// exception is stored.
    #[error("example `{example}` failed, but no exception was recorded for it")]
    MissingException {
        /// The resolved description of the example.
        example: String,
    },
}

/// An error that occurred while writing a finished suite out.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while producing JUnit XML.
    #[error("error writing JUnit output to {file}")]
    Junit {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_junit::SerializeError,
    },
}

/// An error returned by the event aggregator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReporterError {
    /// A failure event could not be turned into a failure record.
    #[error("error recording failure")]
    Failure(#[from] FailureRecordError),

    /// The report manager failed to write a finished suite.
    #[error("error writing report for suite `{suite}`")]
    Write {
        /// The name of the suite being written.
        suite: String,

        /// The underlying error.
        #[source]
        error: WriteReportError,
    },
}
