// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized failures attached to test cases.

use crate::{
    backtrace::BacktraceFormatter,
    config::FrameworkProfile,
    errors::FailureRecordError,
    events::{ExampleView, RaisedException, description_for},
};
use std::fmt;
use swrite::{SWrite, swrite};

/// The indentation applied to every backtrace line in a failure location.
static BACKTRACE_INDENT: &str = "     ";

/// Whether a failure came from an unmet expectation or from an unexpected exception.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FailureKind {
    /// The exception was raised by the assertion framework because an expectation was not met.
    Assertion,

    /// Any other uncaught exception.
    Error,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Assertion => write!(f, "failure"),
            FailureKind::Error => write!(f, "error"),
        }
    }
}

/// Everything needed to turn a raised exception into a [`FailureRecord`].
#[derive(Clone, Copy)]
pub struct FailureContext<'a> {
    framework: &'a FrameworkProfile,
    backtrace_formatter: &'a dyn BacktraceFormatter,
}

impl<'a> FailureContext<'a> {
    /// Creates a new context.
    pub fn new(
        framework: &'a FrameworkProfile,
        backtrace_formatter: &'a dyn BacktraceFormatter,
    ) -> Self {
        Self {
            framework,
            backtrace_formatter,
        }
    }
}

impl fmt::Debug for FailureContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureContext")
            .field("framework", &self.framework)
            .finish_non_exhaustive()
    }
}

/// One raised condition recorded against a test case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureRecord {
    name: String,
    message: String,
    kind: FailureKind,
    location: String,
}

impl FailureRecord {
    /// Builds a failure record from the exception recorded on a failed example.
    ///
    /// Returns an error if the example carries no exception.
    pub fn new(
        example: &(impl ExampleView + ?Sized),
        cx: FailureContext<'_>,
    ) -> Result<Self, FailureRecordError> {
        let exception =
            example
                .raised_exception()
                .ok_or_else(|| FailureRecordError::MissingException {
                    example: description_for(example),
                })?;
        Ok(Self::from_exception(exception, cx))
    }

    /// Builds a failure record from an exception.
    pub fn from_exception(exception: &RaisedException, cx: FailureContext<'_>) -> Self {
        let kind = if exception.is_a(cx.framework.expectation_error()) {
            FailureKind::Assertion
        } else {
            FailureKind::Error
        };

        let mut location = String::new();
        if !exception
            .class_name
            .contains(cx.framework.namespace_marker())
        {
            swrite!(location, "{}:\n", exception.class_name);
        }
        location.push_str(&exception.message);
        for entry in cx
            .backtrace_formatter
            .format_backtrace(&exception.backtrace)
        {
            // An empty entry still separates the notice from the frames above it.
            if entry.is_empty() {
                swrite!(location, "\n{BACKTRACE_INDENT}");
            }
            for line in entry.lines() {
                swrite!(location, "\n{BACKTRACE_INDENT}{line}");
            }
        }

        Self {
            name: exception.class_name.clone(),
            message: exception.message.clone(),
            kind,
            location,
        }
    }

    /// The name of the exception's type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The exception message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this is an assertion failure or an error.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns true if this failure was raised by an unmet expectation.
    pub fn is_failure(&self) -> bool {
        self.kind == FailureKind::Assertion
    }

    /// Returns true if this failure was an unexpected exception.
    pub fn is_error(&self) -> bool {
        !self.is_failure()
    }

    /// The formatted location text: type name, message and filtered backtrace.
    pub fn location(&self) -> &str {
        &self.location
    }
}
