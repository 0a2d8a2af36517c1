// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable output printed while events are processed.
//!
//! Reports are the durable output of a run. The [`EventDisplayer`] is the interactive one: a
//! character per finished example in [`DisplayFormat::Progress`] mode, or a line per group and
//! example in [`DisplayFormat::Doc`] mode, followed by pending examples, failures and totals once
//! the run finishes.

use crate::{
    events::{RunSummary, UNKNOWN_DESCRIPTION},
    record::TestCaseRecord,
};
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};
use swrite::{SWrite, swrite};

/// Indentation for details printed under a numbered pending example or failure.
static DETAIL_INDENT: &str = "     ";

/// How finished examples are shown.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DisplayFormat {
    /// One character per example: `.` passed, `F` failed, `*` pending.
    #[default]
    Progress,

    /// Group names, then one line per example.
    Doc,

    /// Print nothing.
    None,
}

/// Writes progress for a run to `W`.
#[derive(Debug)]
pub struct EventDisplayer<W> {
    format: DisplayFormat,
    writer: W,
    styles: Styles,
    examples: usize,
    failed: Vec<FailedExample>,
    pending: Vec<PendingExample>,
    mid_line: bool,
}

impl<W: Write> EventDisplayer<W> {
    /// Creates a new displayer.
    pub fn new(format: DisplayFormat, writer: W, should_colorize: bool) -> Self {
        let mut styles = Styles::default();
        if should_colorize {
            styles.colorize();
        }

        Self {
            format,
            writer,
            styles,
            examples: 0,
            failed: Vec::new(),
            pending: Vec::new(),
            mid_line: false,
        }
    }

    /// A group started.
    pub fn group_started(&mut self, name: &str) -> io::Result<()> {
        if self.format == DisplayFormat::Doc {
            writeln!(self.writer, "\n{}", name.style(self.styles.group))?;
        }
        Ok(())
    }

    /// An example reached a terminal event. `case` is the case it was recorded as.
    pub fn case_finished(&mut self, case: &TestCaseRecord) -> io::Result<()> {
        self.examples += 1;
        let name = case.name().unwrap_or(UNKNOWN_DESCRIPTION).to_owned();

        let outcome = if !case.failures().is_empty() {
            self.failed.push(FailedExample {
                name: name.clone(),
                locations: case
                    .failures()
                    .iter()
                    .map(|failure| failure.location().to_owned())
                    .collect(),
            });
            Outcome::Failed(self.failed.len())
        } else if let Some(skipped) = case.skipped() {
            self.pending.push(PendingExample {
                name: name.clone(),
                message: skipped.message.clone(),
            });
            Outcome::Pending
        } else {
            Outcome::Passed
        };

        match self.format {
            DisplayFormat::Progress => {
                let (ch, style) = match outcome {
                    Outcome::Passed => (".", self.styles.pass),
                    Outcome::Failed(_) => ("F", self.styles.fail),
                    Outcome::Pending => ("*", self.styles.pending),
                };
                write!(self.writer, "{}", ch.style(style))?;
                self.mid_line = true;
                self.writer.flush()
            }
            DisplayFormat::Doc => {
                match outcome {
                    Outcome::Passed => {
                        writeln!(self.writer, "  {}", name.style(self.styles.pass))?;
                    }
                    Outcome::Failed(index) => {
                        let line = format!("{name} (FAILED - {index})");
                        writeln!(self.writer, "  {}", line.style(self.styles.fail))?;
                    }
                    Outcome::Pending => {
                        let reason = case
                            .skipped()
                            .and_then(|skipped| skipped.message.as_deref())
                            .unwrap_or("No reason given");
                        let line = format!("{name} (PENDING: {reason})");
                        writeln!(self.writer, "  {}", line.style(self.styles.pending))?;
                    }
                }
                self.writer.flush()
            }
            DisplayFormat::None => Ok(()),
        }
    }

    /// The run finished: pending examples, failures and totals are printed.
    pub fn run_finished(&mut self, summary: Option<&RunSummary>) -> io::Result<()> {
        if self.format == DisplayFormat::None {
            return Ok(());
        }
        if self.mid_line {
            writeln!(self.writer)?;
            self.mid_line = false;
        }

        if !self.pending.is_empty() {
            writeln!(self.writer, "\nPending:")?;
            for (index, pending) in self.pending.iter().enumerate() {
                writeln!(
                    self.writer,
                    "  {}) {}",
                    index + 1,
                    pending.name.style(self.styles.pending)
                )?;
                if let Some(message) = &pending.message {
                    writeln!(self.writer, "{DETAIL_INDENT}# {message}")?;
                }
            }
        }

        if !self.failed.is_empty() {
            writeln!(self.writer, "\nFailures:")?;
            for (index, failed) in self.failed.iter().enumerate() {
                writeln!(self.writer, "\n  {}) {}", index + 1, failed.name)?;
                for location in &failed.locations {
                    for line in location.lines() {
                        writeln!(
                            self.writer,
                            "{DETAIL_INDENT}{}",
                            line.style(self.styles.fail_detail)
                        )?;
                    }
                }
            }
        }

        if let Some(duration) = summary.and_then(|summary| summary.duration) {
            writeln!(
                self.writer,
                "\nFinished in {:.5} seconds",
                duration.as_secs_f64()
            )?;
        } else {
            writeln!(self.writer)?;
        }

        let mut totals = format!(
            "{} {}, {} {}",
            self.examples,
            plural::examples_str(self.examples),
            self.failed.len(),
            plural::failures_str(self.failed.len()),
        );
        if !self.pending.is_empty() {
            swrite!(totals, ", {} pending", self.pending.len());
        }
        let totals_style = if !self.failed.is_empty() {
            self.styles.fail
        } else if !self.pending.is_empty() {
            self.styles.pending
        } else {
            self.styles.pass
        };
        writeln!(self.writer, "{}", totals.style(totals_style))?;

        self.writer.flush()
    }

    /// Consumes the displayer, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[derive(Clone, Copy, Debug)]
enum Outcome {
    Passed,
    // The 1-based index of the failure in this run.
    Failed(usize),
    Pending,
}

#[derive(Clone, Debug)]
struct FailedExample {
    name: String,
    locations: Vec<String>,
}

#[derive(Clone, Debug)]
struct PendingExample {
    name: String,
    message: Option<String>,
}

#[derive(Clone, Debug, Default)]
struct Styles {
    group: Style,
    pass: Style,
    fail: Style,
    fail_detail: Style,
    pending: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.group = Style::new().bold();
        self.pass = Style::new().green();
        self.fail = Style::new().red().bold();
        self.fail_detail = Style::new().red();
        self.pending = Style::new().yellow();
    }
}

mod plural {
    pub(super) fn examples_str(count: usize) -> &'static str {
        if count == 1 { "example" } else { "examples" }
    }

    pub(super) fn failures_str(count: usize) -> &'static str {
        if count == 1 { "failure" } else { "failures" }
    }
}
