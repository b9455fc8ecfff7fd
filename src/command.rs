/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use std::env;
use std::io::Write;
use std::process::{Command, Stdio};

use log::trace;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("IO error while running {0}: {1}")]
    Io(String, std::io::Error),
    #[error("{0} exited unsuccessfully ({1})")]
    Failed(String, std::process::ExitStatus),
    #[error("bad command {0} didn't contain a program after parsing")]
    BadCommand(String),
}

type CommandResult<T> = Result<T, CommandError>;

/// The command line held in `var`, or `default` when it is unset.
pub fn command_line_from_env(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Build a command from a shell-style command line, so wrappers such as
/// `npx tool` work.
pub fn command_from_line(line: &str) -> CommandResult<Command> {
    let parts = shell_words::split(line).map_err(|_| CommandError::BadCommand(line.to_string()))?;
    let mut iter = parts.into_iter();
    let prog = iter
        .next()
        .ok_or_else(|| CommandError::BadCommand(line.to_string()))?;

    let mut cmd = Command::new(prog);
    cmd.args(iter);
    Ok(cmd)
}

/// Run `cmd` to completion, copying its output into `log`.
///
/// Output is decoded lossily; only the exit status decides success.
pub fn run_command<W: Write>(cmd: &mut Command, mut log: W) -> CommandResult<()> {
    let prog = cmd.get_program().to_string_lossy().to_string();
    trace!("running {:?}", cmd);
    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CommandError::Io(prog.clone(), e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        println!("{}", stdout);
        eprintln!("{}", stderr);
        return Err(CommandError::Failed(prog, output.status));
    }

    writeln!(log, "STDOUT:")
        .and_then(|_| writeln!(log, "{}", stdout))
        .and_then(|_| writeln!(log))
        .and_then(|_| writeln!(log, "STDERR:"))
        .and_then(|_| writeln!(log, "{}", stderr))
        .map_err(|e| CommandError::Io(prog, e))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn output_lands_in_log() {
        let mut log = Vec::new();
        run_command(Command::new("sh").arg("-c").arg("echo hello"), &mut log).unwrap();
        let text = String::from_utf8(log).unwrap();
        assert!(text.starts_with("STDOUT:\nhello\n"));
    }

    #[test]
    fn non_utf8_output_of_a_successful_run_is_accepted() {
        let mut log = Vec::new();
        run_command(Command::new("sh").arg("-c").arg("printf 'a\\377b'"), &mut log).unwrap();
        let text = String::from_utf8(log).unwrap();
        assert!(text.starts_with("STDOUT:\na\u{fffd}b\n"));
    }

    #[test]
    fn failure_is_reported() {
        let err = run_command(Command::new("sh").arg("-c").arg("exit 3"), Vec::new()).unwrap_err();
        assert!(matches!(err, CommandError::Failed(ref p, _) if p == "sh"));
    }

    #[test]
    fn command_line_is_split() {
        let cmd = command_from_line("npx electron-builder").unwrap();
        assert_eq!(cmd.get_program(), "npx");
        assert_eq!(cmd.get_args().collect::<Vec<_>>(), vec!["electron-builder"]);
    }

    #[test]
    fn unset_variable_falls_back_to_default() {
        assert_eq!(
            command_line_from_env("DESKTOP_INSTALLER_TEST_UNSET_VAR", "asar"),
            "asar"
        );
    }

    #[test]
    fn empty_command_line_is_rejected() {
        assert!(matches!(
            command_from_line("  "),
            Err(CommandError::BadCommand(_))
        ));
    }
}
