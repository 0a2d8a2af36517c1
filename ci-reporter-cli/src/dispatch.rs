// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, ReporterExitCode,
    errors::Result,
    output::{OutputContext, OutputOpts, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use ci_reporter::{
    aggregator::EventAggregator,
    backtrace::PatternBacktraceFormatter,
    config::ReporterConfig,
    display::{DisplayFormat, EventDisplayer},
    events::{ReporterEvent, RunSummary},
    report::{JunitReportManager, ReportManager},
};
use clap::{Parser, ValueEnum};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
};

/// Convert a stream of test framework events into JUnit XML reports.
///
/// Events are read one per line, as JSON objects tagged with an `event` field. Each example group
/// becomes one report file in the report directory.
#[derive(Debug, Parser)]
#[command(version, bin_name = "ci-reporter", styles = clap_styles::style())]
pub struct CiReporterApp {
    /// File to read events from, or `-` for standard input
    #[arg(value_name = "INPUT", default_value = "-")]
    input: Utf8PathBuf,

    /// Report kind, used as the report file prefix and the default directory name
    #[arg(long, value_name = "KIND", env = "CI_REPORTER_KIND")]
    kind: Option<String>,

    /// Directory to write reports to [default: <KIND>/reports]
    #[arg(long, value_name = "DIR", env = "CI_REPORTS")]
    report_dir: Option<Utf8PathBuf>,

    /// Config file to layer over the default config
    #[arg(long, value_name = "PATH", env = "CI_REPORTER_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Do not filter or relativize backtraces
    #[arg(long, env = "CI_REPORTER_FULL_BACKTRACE")]
    full_backtrace: bool,

    /// Progress output printed to stdout while events are read
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT", env = "CI_REPORTER_FORMAT")]
    format: OutputFormat,

    #[command(flatten)]
    output: OutputOpts,
}

impl CiReporterApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        let cwd = current_dir_utf8()?;
        let config = self.load_config()?;

        let report_manager = JunitReportManager::from_config(config.report(), &cwd)
            .map_err(|err| ExpectedError::ReportSetupError { err })?;
        let formatter = PatternBacktraceFormatter::new(config.backtrace()).with_root(cwd.clone());
        let mut aggregator =
            EventAggregator::new(report_manager, config.framework().clone(), formatter);

        let mut displayer = EventDisplayer::new(
            self.format.into(),
            io::stdout(),
            output.should_colorize_stdout(),
        );

        let input = EventInput::open(&self.input)?;
        let input_name = input.name.clone();
        let mut run_finished = false;

        for (line_no, line) in input.reader.lines().enumerate() {
            let line_no = line_no + 1;
            let line = line.map_err(|err| ExpectedError::InputReadError {
                input: input_name.clone(),
                line: line_no,
                err,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let event: ReporterEvent =
                serde_json::from_str(&line).map_err(|err| ExpectedError::MalformedEvent {
                    input: input_name.clone(),
                    line: line_no,
                    err,
                })?;
            run_finished = matches!(event, ReporterEvent::RunFinished { .. });

            let step = DisplayStep::for_event(&event);
            aggregator
                .handle_event(event)
                .map_err(|err| ExpectedError::ReporterError {
                    input: input_name.clone(),
                    line: line_no,
                    err,
                })?;
            step.display(&mut displayer, &aggregator)
                .map_err(|err| ExpectedError::WriteOutputError { err })?;
        }

        if !run_finished {
            if let Some(suite) = aggregator.current_suite() {
                tracing::warn!(
                    "input ended before the run finished, suite `{}` was not written",
                    suite.name()
                );
                return Ok(ReporterExitCode::INCOMPLETE_RUN);
            }
        }

        tracing::info!(
            "wrote {} suites to {}",
            aggregator.suites_written(),
            aggregator.report_manager().dir()
        );
        Ok(ReporterExitCode::OK)
    }

    fn load_config(&self) -> Result<ReporterConfig> {
        let mut config = ReporterConfig::from_sources(self.config.as_deref())?;
        if let Some(kind) = &self.kind {
            config.report_mut().set_kind(kind.as_str());
        }
        if let Some(dir) = &self.report_dir {
            config.report_mut().set_dir(dir.clone());
        }
        if self.full_backtrace {
            config.backtrace_mut().set_full_backtrace(true);
        }
        Ok(config)
    }
}

/// Progress output formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One character per example
    #[default]
    Progress,
    /// One line per group and example
    Doc,
    /// No progress output
    None,
}

impl From<OutputFormat> for DisplayFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Progress => DisplayFormat::Progress,
            OutputFormat::Doc => DisplayFormat::Doc,
            OutputFormat::None => DisplayFormat::None,
        }
    }
}

/// What to display once an event has been handled.
enum DisplayStep {
    GroupStarted,
    CaseFinished,
    RunFinished(Option<RunSummary>),
    Nothing,
}

impl DisplayStep {
    fn for_event(event: &ReporterEvent) -> Self {
        match event {
            ReporterEvent::GroupStarted { .. } => Self::GroupStarted,
            ReporterEvent::CasePassed { .. }
            | ReporterEvent::CaseFailed { .. }
            | ReporterEvent::CasePending { .. } => Self::CaseFinished,
            ReporterEvent::RunFinished { summary } => Self::RunFinished(summary.clone()),
            ReporterEvent::CaseStarted { .. } => Self::Nothing,
        }
    }

    fn display<W: Write, M: ReportManager>(
        self,
        displayer: &mut EventDisplayer<W>,
        aggregator: &EventAggregator<M>,
    ) -> io::Result<()> {
        match self {
            Self::GroupStarted => match aggregator.current_suite() {
                Some(suite) => displayer.group_started(suite.name()),
                None => Ok(()),
            },
            Self::CaseFinished => {
                match aggregator
                    .current_suite()
                    .and_then(|suite| suite.testcases().last())
                {
                    Some(case) => displayer.case_finished(case),
                    None => Ok(()),
                }
            }
            Self::RunFinished(summary) => displayer.run_finished(summary.as_ref()),
            Self::Nothing => Ok(()),
        }
    }
}

struct EventInput {
    name: String,
    reader: Box<dyn BufRead>,
}

impl EventInput {
    fn open(path: &Utf8Path) -> Result<Self> {
        if path.as_str() == "-" {
            return Ok(Self {
                name: "<stdin>".to_owned(),
                reader: Box::new(io::stdin().lock()),
            });
        }

        let file = File::open(path).map_err(|err| ExpectedError::InputOpenError {
            path: path.to_owned(),
            err,
        })?;
        Ok(Self {
            name: path.to_string(),
            reader: Box::new(BufReader::new(file)),
        })
    }
}

fn current_dir_utf8() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().map_err(|err| ExpectedError::CurrentDirFailed { err })?;
    Utf8PathBuf::try_from(cwd).map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })
}
