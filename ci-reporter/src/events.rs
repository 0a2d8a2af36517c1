// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events and entities handed to the reporter by a test framework.
//!
//! Frameworks describe groups and examples in slightly different shapes depending on their
//! version. Those differences are absorbed here: [`Example`] is a closed set of adapters, one per
//! supported shape, picked once when an event is decoded. The rest of the crate only sees the
//! [`Describe`] and [`ExampleView`] traits.

use serde::Deserialize;
use std::time::Duration;

/// The placeholder name used when nothing describes an entity.
pub static UNKNOWN_DESCRIPTION: &str = "UNKNOWN";

/// Something that can be named in a report: an example group or an example.
///
/// Each method is a probe; adapters return `None` for the accessors their shape doesn't have.
pub trait Describe {
    /// The full description, including the descriptions of all enclosing groups.
    fn full_description(&self) -> Option<&str> {
        None
    }

    /// The full description of the owning group, as recorded in metadata.
    fn group_full_description(&self) -> Option<&str> {
        None
    }

    /// The plain description of this entity alone.
    fn description(&self) -> Option<&str> {
        None
    }
}

/// Resolves the name of `subject` for use in a report.
///
/// Probes, in order: the full description, the owning group's full description, the plain
/// description. Falls back to [`UNKNOWN_DESCRIPTION`], so this never fails.
pub fn description_for(subject: &(impl Describe + ?Sized)) -> String {
    subject
        .full_description()
        .or_else(|| subject.group_full_description())
        .or_else(|| subject.description())
        .unwrap_or(UNKNOWN_DESCRIPTION)
        .to_owned()
}

/// An example, as seen by the reporter when it finishes.
pub trait ExampleView: Describe {
    /// The exception raised while running this example, if one was recorded.
    fn raised_exception(&self) -> Option<&RaisedException>;

    /// The message attached to a pending example, if any.
    fn pending_message(&self) -> Option<&str> {
        None
    }
}

/// An exception raised by a test case.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RaisedException {
    /// The fully qualified name of the exception's type.
    pub class_name: String,

    /// The names of the types the exception's type inherits from, nearest first.
    #[serde(default)]
    pub ancestors: Vec<String>,

    /// The exception message.
    #[serde(default)]
    pub message: String,

    /// The raw backtrace frames, innermost first.
    #[serde(default)]
    pub backtrace: Vec<String>,
}

impl RaisedException {
    /// Creates a new exception with no ancestors and no backtrace.
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ancestors: Vec::new(),
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    /// Adds an ancestor type.
    pub fn with_ancestor(mut self, ancestor: impl Into<String>) -> Self {
        self.ancestors.push(ancestor.into());
        self
    }

    /// Sets the raw backtrace.
    pub fn with_backtrace(mut self, backtrace: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.backtrace = backtrace.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if this exception's type is `type_name` or inherits from it.
    pub fn is_a(&self, type_name: &str) -> bool {
        self.class_name == type_name || self.ancestors.iter().any(|ancestor| ancestor == type_name)
    }
}

/// An example group.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ExampleGroup {
    /// The full description of the group.
    #[serde(default)]
    pub full_description: Option<String>,

    /// The group's own description.
    #[serde(default)]
    pub description: Option<String>,

    /// Metadata attached by older framework versions.
    #[serde(default)]
    pub metadata: Option<GroupMetadata>,
}

impl ExampleGroup {
    /// Creates a group with the given full description.
    pub fn new(full_description: impl Into<String>) -> Self {
        Self {
            full_description: Some(full_description.into()),
            description: None,
            metadata: None,
        }
    }
}

/// The metadata of an [`ExampleGroup`] in the legacy shape.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct GroupMetadata {
    /// The group the metadata describes.
    #[serde(default)]
    pub example_group: Option<Box<ExampleGroup>>,
}

impl Describe for ExampleGroup {
    fn full_description(&self) -> Option<&str> {
        self.full_description.as_deref()
    }

    fn group_full_description(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.example_group.as_deref())
            .and_then(|group| group.full_description.as_deref())
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// An example in the shape used by current framework versions, which expose the execution result
/// directly.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct CurrentExample {
    /// The full description of the example.
    #[serde(default)]
    pub full_description: Option<String>,

    /// The example's own description.
    #[serde(default)]
    pub description: Option<String>,

    /// The outcome of running the example.
    pub execution_result: ExecutionResult,
}

impl CurrentExample {
    /// Creates an example with the given full description and an empty execution result.
    pub fn new(full_description: impl Into<String>) -> Self {
        Self {
            full_description: Some(full_description.into()),
            description: None,
            execution_result: ExecutionResult::default(),
        }
    }

    /// Records `exception` as the raised exception.
    pub fn with_exception(mut self, exception: RaisedException) -> Self {
        self.execution_result.exception = Some(exception);
        self
    }
}

/// The execution result of a [`CurrentExample`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ExecutionResult {
    /// The exception raised by the example.
    #[serde(default)]
    pub exception: Option<RaisedException>,

    /// The exception encountered while running the example, used by some framework versions
    /// instead of `exception`.
    #[serde(default)]
    pub exception_encountered: Option<RaisedException>,

    /// The message attached to a pending example.
    #[serde(default)]
    pub pending_message: Option<String>,
}

impl Describe for CurrentExample {
    fn full_description(&self) -> Option<&str> {
        self.full_description.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl ExampleView for CurrentExample {
    fn raised_exception(&self) -> Option<&RaisedException> {
        self.execution_result
            .exception
            .as_ref()
            .or(self.execution_result.exception_encountered.as_ref())
    }

    fn pending_message(&self) -> Option<&str> {
        self.execution_result.pending_message.as_deref()
    }
}

/// An example in the shape used by older framework versions, where everything is nested under
/// metadata.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct LegacyExample {
    /// The full description of the example, if the framework exposes it.
    #[serde(default)]
    pub full_description: Option<String>,

    /// The example's own description.
    #[serde(default)]
    pub description: Option<String>,

    /// The example metadata.
    pub metadata: LegacyMetadata,
}

/// The metadata of a [`LegacyExample`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct LegacyMetadata {
    /// The group that owns the example.
    #[serde(default)]
    pub example_group: Option<ExampleGroup>,

    /// The outcome of running the example.
    #[serde(default)]
    pub execution_result: LegacyExecutionResult,
}

/// The execution result of a [`LegacyExample`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct LegacyExecutionResult {
    /// The exception raised by the example.
    #[serde(default)]
    pub exception: Option<RaisedException>,

    /// The message attached to a pending example.
    #[serde(default)]
    pub pending_message: Option<String>,
}

impl Describe for LegacyExample {
    fn full_description(&self) -> Option<&str> {
        self.full_description.as_deref()
    }

    fn group_full_description(&self) -> Option<&str> {
        self.metadata
            .example_group
            .as_ref()
            .and_then(|group| group.full_description.as_deref())
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl ExampleView for LegacyExample {
    fn raised_exception(&self) -> Option<&RaisedException> {
        self.metadata.execution_result.exception.as_ref()
    }

    fn pending_message(&self) -> Option<&str> {
        self.metadata.execution_result.pending_message.as_deref()
    }
}

/// An example in any of the supported shapes.
///
/// When decoding, the shape is chosen by which accessor is present: an `execution_result` field
/// selects [`CurrentExample`], a `metadata` field selects [`LegacyExample`]. An example with
/// neither is treated as a bare description.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum Example {
    /// The current shape.
    Current(CurrentExample),

    /// The legacy shape.
    Legacy(LegacyExample),

    /// An example that carries nothing but (possibly) descriptions.
    Bare(ExampleGroup),
}

impl Example {
    fn as_view(&self) -> &dyn ExampleView {
        match self {
            Example::Current(example) => example,
            Example::Legacy(example) => example,
            Example::Bare(group) => group,
        }
    }
}

// A bare example never carries an exception.
impl ExampleView for ExampleGroup {
    fn raised_exception(&self) -> Option<&RaisedException> {
        None
    }
}

impl Describe for Example {
    fn full_description(&self) -> Option<&str> {
        self.as_view().full_description()
    }

    fn group_full_description(&self) -> Option<&str> {
        self.as_view().group_full_description()
    }

    fn description(&self) -> Option<&str> {
        self.as_view().description()
    }
}

impl ExampleView for Example {
    fn raised_exception(&self) -> Option<&RaisedException> {
        self.as_view().raised_exception()
    }

    fn pending_message(&self) -> Option<&str> {
        self.as_view().pending_message()
    }
}

/// Totals reported by the framework when a run finishes.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RunSummary {
    /// How long the run took, in seconds.
    #[serde(default, with = "duration_secs")]
    pub duration: Option<Duration>,

    /// The number of examples run.
    #[serde(default)]
    pub example_count: Option<usize>,

    /// The number of examples that failed.
    #[serde(default)]
    pub failure_count: Option<usize>,

    /// The number of examples that were pending.
    #[serde(default)]
    pub pending_count: Option<usize>,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        secs.map(|secs| {
            Duration::try_from_secs_f64(secs).map_err(<D::Error as serde::de::Error>::custom)
        })
        .transpose()
    }
}

/// A lifecycle event emitted by a test framework.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ReporterEvent {
    /// An example group started.
    GroupStarted {
        /// The group.
        group: ExampleGroup,
    },

    /// An example started.
    CaseStarted {
        /// The example, if the framework provides it.
        #[serde(default)]
        example: Option<Example>,
    },

    /// An example passed.
    CasePassed {
        /// The example.
        example: Example,
    },

    /// An example failed.
    CaseFailed {
        /// The example, including its execution result.
        example: Example,
    },

    /// An example is pending.
    CasePending {
        /// The example.
        example: Example,
    },

    /// The run finished.
    RunFinished {
        /// The framework's totals, if provided.
        #[serde(default)]
        summary: Option<RunSummary>,
    },
}
