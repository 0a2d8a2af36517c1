// Copyright (c) The ci-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use std::{
    fmt,
    io::Write,
    process::{Command, ExitStatus, Stdio},
};

/// Environment variables that would otherwise leak into the reporter from the outer environment.
static CLEARED_ENV: &[&str] = &[
    "CI_REPORTS",
    "CI_REPORTER_KIND",
    "CI_REPORTER_CONFIG",
    "CI_REPORTER_FULL_BACKTRACE",
    "CI_REPORTER_VERBOSE",
    "CI_REPORTER_LOG",
    "CI_REPORTER_FORMAT",
    "CI_REPORTER_COLOR",
];

pub struct ReporterCli {
    args: Vec<String>,
    cwd: Utf8PathBuf,
    stdin: Option<String>,
}

impl ReporterCli {
    pub fn new(cwd: &Utf8Path) -> Self {
        Self {
            args: vec!["--color".to_owned(), "never".to_owned()],
            cwd: cwd.to_owned(),
            stdin: None,
        }
    }

    pub fn args(&mut self, args: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(&mut self, input: impl Into<String>) -> &mut Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn output(&self) -> ReporterOutput {
        let mut command = Command::new(env!("CARGO_BIN_EXE_ci-reporter"));
        command
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for var in CLEARED_ENV {
            command.env_remove(var);
        }

        let mut child = command.spawn().expect("spawned ci-reporter");
        {
            let mut stdin = child.stdin.take().expect("stdin is piped");
            if let Some(input) = &self.stdin {
                stdin
                    .write_all(input.as_bytes())
                    .expect("wrote input to stdin");
            }
        }
        let output = child.wait_with_output().expect("waited for ci-reporter");

        ReporterOutput {
            args: self.args.clone(),
            exit_status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

pub struct ReporterOutput {
    args: Vec<String>,
    pub exit_status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ReporterOutput {
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status.code()
    }
}

impl fmt::Debug for ReporterOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "args: {:?}", self.args)?;
        writeln!(f, "exit status: {}", self.exit_status)?;
        writeln!(f, "--- stdout ---\n{}", self.stdout)?;
        writeln!(f, "--- stderr ---\n{}", self.stderr)
    }
}
