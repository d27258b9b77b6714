//! Subprocess execution
//!
//! Runs external tools without a shell. The command line is tokenized with
//! shell quoting rules but never expanded. Stderr is drained line by line on a
//! separate task while the child runs; each line is logged at debug level and
//! the last non-empty one is kept for error reporting. Stdout is drained and
//! discarded so a chatty tool cannot block on a full pipe.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::error::ProcessError;

const PASSWORD_FLAG: &str = "--password=";

/// Outcome of a successful subprocess run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    /// Last non-empty stderr line, empty if the tool wrote nothing
    pub last_line: String,
}

/// Something that can run a command line
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, command_line: &str) -> Result<ProcessResult, ProcessError>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    async fn execute(&self, command_line: &str) -> Result<ProcessResult, ProcessError> {
        (**self).execute(command_line).await
    }
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl CommandRunner for ProcessExecutor {
    async fn execute(&self, command_line: &str) -> Result<ProcessResult, ProcessError> {
        let argv = shell_words::split(command_line).map_err(|source| {
            ProcessError::InvalidCommandLine {
                command: redact(command_line),
                source,
            }
        })?;
        let (program, args) = argv.split_first().ok_or(ProcessError::EmptyCommand)?;

        debug!("Issuing subprocess {}", redact(command_line));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stderr = tokio::spawn(drain_stderr(child.stderr.take(), program.clone()));
        let stdout = tokio::spawn(discard(child.stdout.take()));

        let status = child.wait().await.map_err(|source| ProcessError::Wait {
            program: program.clone(),
            source,
        })?;

        // Every diagnostic line is observed before the exit code is judged
        let last_line = stderr.await.unwrap_or_default();
        let _ = stdout.await;

        match status.code() {
            Some(0) => Ok(ProcessResult {
                exit_code: 0,
                last_line,
            }),
            exit_code => {
                debug!(
                    "Subprocess {} exited with {:?}: {}",
                    program, exit_code, last_line
                );
                Err(ProcessError::Failed {
                    program: program.clone(),
                    exit_code,
                    last_line,
                })
            }
        }
    }
}

async fn drain_stderr<R>(stream: Option<R>, program: String) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return String::new();
    };

    let mut segments = BufReader::new(stream).split(b'\n');
    let mut last_line = String::new();

    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => {
                let line = String::from_utf8_lossy(&bytes);
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                debug!("Subprocess {} => {}", program, line);
                last_line = line.to_string();
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Stopped reading stderr of {}: {}", program, e);
                break;
            }
        }
    }

    last_line
}

async fn discard<R>(stream: Option<R>)
where
    R: AsyncRead + Unpin,
{
    if let Some(mut stream) = stream {
        let _ = tokio::io::copy(&mut stream, &mut tokio::io::sink()).await;
    }
}

/// Hide `--password=...` values before a command line is logged
///
/// The line is re-tokenized so quoted values containing spaces are replaced
/// whole. An unparsable line is cut at the first password flag.
pub fn redact(command_line: &str) -> String {
    match shell_words::split(command_line) {
        Ok(argv) => shell_words::join(argv.iter().map(|arg| {
            if arg.starts_with(PASSWORD_FLAG) {
                format!("{}<redacted>", PASSWORD_FLAG)
            } else {
                arg.clone()
            }
        })),
        Err(_) => match command_line.find(PASSWORD_FLAG) {
            Some(index) => format!("{}{}<redacted>", &command_line[..index], PASSWORD_FLAG),
            None => command_line.to_string(),
        },
    }
}
