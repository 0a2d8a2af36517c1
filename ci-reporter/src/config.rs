// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for ci-reporter.
//!
//! The configuration is assembled from the defaults embedded in this crate, optionally layered
//! with a user config file. Values coming from the command line are applied afterwards through the
//! setters on [`ReportConfig`] and [`BacktraceConfig`].

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use regex::Regex;
use serde::Deserialize;

/// The full reporter configuration.
#[derive(Clone, Debug)]
pub struct ReporterConfig {
    report: ReportConfig,
    framework: FrameworkProfile,
    backtrace: BacktraceConfig,
}

impl ReporterConfig {
    /// The default configuration.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// The name used for the embedded defaults in error messages.
    const DEFAULT_CONFIG_NAME: &'static str = "<default config>";

    /// Reads the configuration, layering `config_file` on top of the defaults if provided.
    pub fn from_sources(config_file: Option<&Utf8Path>) -> Result<Self, ConfigParseError> {
        let mut builder = Self::make_default_config();
        let source_name = match config_file {
            Some(config_file) => {
                builder = builder.add_source(File::new(config_file.as_str(), FileFormat::Toml));
                config_file
            }
            None => Utf8Path::new(Self::DEFAULT_CONFIG_NAME),
        };

        let inner = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(source_name, kind))?;
        Self::from_impl(inner).map_err(|kind| ConfigParseError::new(source_name, kind))
    }

    /// Returns the default configuration, without any user overrides.
    pub fn default_config() -> Self {
        Self::from_sources(None).expect("default config is always valid")
    }

    /// Returns the report configuration.
    pub fn report(&self) -> &ReportConfig {
        &self.report
    }

    /// Returns a mutable reference to the report configuration.
    pub fn report_mut(&mut self) -> &mut ReportConfig {
        &mut self.report
    }

    /// Returns the assertion framework profile.
    pub fn framework(&self) -> &FrameworkProfile {
        &self.framework
    }

    /// Returns the backtrace configuration.
    pub fn backtrace(&self) -> &BacktraceConfig {
        &self.backtrace
    }

    /// Returns a mutable reference to the backtrace configuration.
    pub fn backtrace_mut(&mut self) -> &mut BacktraceConfig {
        &mut self.backtrace
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<ReporterConfigImpl, ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|err| ConfigParseErrorKind::BuildError(Box::new(err)))?;

        serde_path_to_error::deserialize(config)
            .map_err(|err| ConfigParseErrorKind::DeserializeError(Box::new(err)))
    }

    fn from_impl(inner: ReporterConfigImpl) -> Result<Self, ConfigParseErrorKind> {
        let ReporterConfigImpl {
            report,
            framework,
            backtrace,
        } = inner;

        let backtrace = BacktraceConfig {
            full_backtrace: backtrace.full_backtrace,
            exclusion_patterns: compile_patterns("exclusion-patterns", backtrace.exclusion_patterns)?,
            inclusion_patterns: compile_patterns("inclusion-patterns", backtrace.inclusion_patterns)?,
        };

        Ok(Self {
            report: ReportConfig {
                kind: report.kind,
                dir: report.dir,
            },
            framework,
            backtrace,
        })
    }
}

fn compile_patterns(
    list: &'static str,
    patterns: Vec<String>,
) -> Result<Vec<Regex>, ConfigParseErrorKind> {
    patterns
        .into_iter()
        .map(|pattern| {
            Regex::new(&pattern)
                .map_err(|err| ConfigParseErrorKind::InvalidPattern { list, pattern, err })
        })
        .collect()
}

/// Where and under which name reports are written.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportConfig {
    kind: String,
    dir: Option<Utf8PathBuf>,
}

impl ReportConfig {
    /// Creates a new report configuration for the given report kind, e.g. `"spec"`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            dir: None,
        }
    }

    /// Returns the report kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Sets the report kind.
    pub fn set_kind(&mut self, kind: impl Into<String>) -> &mut Self {
        self.kind = kind.into();
        self
    }

    /// Returns the configured report directory, if any.
    pub fn dir(&self) -> Option<&Utf8Path> {
        self.dir.as_deref()
    }

    /// Sets the report directory.
    pub fn set_dir(&mut self, dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.dir = Some(dir.into());
        self
    }

    /// Returns the directory reports are written to, resolving relative paths against `cwd`.
    ///
    /// Without an explicit directory, this is `<cwd>/<kind>/reports`.
    pub fn resolve_dir(&self, cwd: &Utf8Path) -> Utf8PathBuf {
        match &self.dir {
            Some(dir) => cwd.join(dir),
            None => cwd.join(self.kind.to_lowercase()).join("reports"),
        }
    }
}

/// Identifies the assertion framework whose exceptions are classified as failures.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FrameworkProfile {
    expectation_error: String,
    namespace_marker: String,
}

impl FrameworkProfile {
    /// Creates a new framework profile.
    pub fn new(expectation_error: impl Into<String>, namespace_marker: impl Into<String>) -> Self {
        Self {
            expectation_error: expectation_error.into(),
            namespace_marker: namespace_marker.into(),
        }
    }

    /// The fully qualified name of the "expectation not met" error type.
    pub fn expectation_error(&self) -> &str {
        &self.expectation_error
    }

    /// The marker that identifies exception types belonging to the framework itself.
    pub fn namespace_marker(&self) -> &str {
        &self.namespace_marker
    }
}

/// Backtrace filtering options.
#[derive(Clone, Debug)]
pub struct BacktraceConfig {
    full_backtrace: bool,
    exclusion_patterns: Vec<Regex>,
    inclusion_patterns: Vec<Regex>,
}

impl BacktraceConfig {
    /// Creates a configuration that performs no filtering.
    pub fn unfiltered() -> Self {
        Self {
            full_backtrace: true,
            exclusion_patterns: Vec::new(),
            inclusion_patterns: Vec::new(),
        }
    }

    /// Returns true if backtraces are reported unfiltered.
    pub fn full_backtrace(&self) -> bool {
        self.full_backtrace
    }

    /// Sets whether backtraces are reported unfiltered.
    pub fn set_full_backtrace(&mut self, full_backtrace: bool) -> &mut Self {
        self.full_backtrace = full_backtrace;
        self
    }

    /// Adds a pattern for frames to drop.
    pub fn add_exclusion_pattern(&mut self, pattern: Regex) -> &mut Self {
        self.exclusion_patterns.push(pattern);
        self
    }

    /// Adds a pattern for frames to keep even if an exclusion pattern matches them.
    pub fn add_inclusion_pattern(&mut self, pattern: Regex) -> &mut Self {
        self.inclusion_patterns.push(pattern);
        self
    }

    /// Returns the exclusion patterns.
    pub fn exclusion_patterns(&self) -> &[Regex] {
        &self.exclusion_patterns
    }

    /// Returns the inclusion patterns.
    pub fn inclusion_patterns(&self) -> &[Regex] {
        &self.inclusion_patterns
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReporterConfigImpl {
    report: ReportConfigImpl,
    framework: FrameworkProfile,
    backtrace: BacktraceConfigImpl,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReportConfigImpl {
    kind: String,
    #[serde(default)]
    dir: Option<Utf8PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BacktraceConfigImpl {
    full_backtrace: bool,
    exclusion_patterns: Vec<String>,
    inclusion_patterns: Vec<String>,
}
