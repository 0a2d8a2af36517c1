// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning raw backtrace frames into readable lines for failure locations.

use crate::config::BacktraceConfig;
use camino::Utf8PathBuf;
use regex::Regex;

/// Notice appended when filtering would have removed every frame.
pub static ALL_FRAMES_FILTERED: &str =
    "Showing full backtrace because every line was filtered out.";

/// Filters and formats raw backtrace frames.
pub trait BacktraceFormatter {
    /// Returns the frames to display for `backtrace`, in order.
    ///
    /// A single returned entry may span several lines.
    fn format_backtrace(&self, backtrace: &[String]) -> Vec<String>;
}

/// A [`BacktraceFormatter`] that drops frames by regular expression, and shortens paths under a
/// root directory.
#[derive(Clone, Debug)]
pub struct PatternBacktraceFormatter {
    full_backtrace: bool,
    exclusion_patterns: Vec<Regex>,
    inclusion_patterns: Vec<Regex>,
    root: Option<String>,
}

impl PatternBacktraceFormatter {
    /// Creates a new formatter from the given configuration.
    pub fn new(config: &BacktraceConfig) -> Self {
        Self {
            full_backtrace: config.full_backtrace(),
            exclusion_patterns: config.exclusion_patterns().to_vec(),
            inclusion_patterns: config.inclusion_patterns().to_vec(),
            root: None,
        }
    }

    /// Rewrites frames starting with `root` to be relative to it, e.g. `/work/spec/a_spec.rb:3` to
    /// `./spec/a_spec.rb:3`.
    pub fn with_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        let mut root = root.into().into_string();
        if !root.ends_with('/') {
            root.push('/');
        }
        self.root = Some(root);
        self
    }

    fn is_excluded(&self, frame: &str) -> bool {
        self.exclusion_patterns.iter().any(|re| re.is_match(frame))
            && !self.inclusion_patterns.iter().any(|re| re.is_match(frame))
    }

    fn relativize(&self, frame: &str) -> String {
        match self.root.as_deref().and_then(|root| frame.strip_prefix(root)) {
            Some(rest) => format!("./{rest}"),
            None => frame.to_owned(),
        }
    }
}

impl BacktraceFormatter for PatternBacktraceFormatter {
    fn format_backtrace(&self, backtrace: &[String]) -> Vec<String> {
        if self.full_backtrace || backtrace.is_empty() {
            return backtrace.to_vec();
        }

        let filtered: Vec<_> = backtrace
            .iter()
            .filter(|frame| !self.is_excluded(frame))
            .map(|frame| self.relativize(frame))
            .collect();

        if filtered.is_empty() {
            let mut full = backtrace.to_vec();
            full.push(String::new());
            full.push(ALL_FRAMES_FILTERED.to_owned());
            full
        } else {
            filtered
        }
    }
}
