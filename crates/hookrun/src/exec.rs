use std::io::{self, Write};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::pretty::pretty;
use crate::tee::{MultiWriter, SharedBuffer};

const READ_CHUNK: usize = 8 * 1024;

/// The command to run, exactly as given after the flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub exe: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Split `argv` into executable and arguments; `None` when empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (exe, args) = argv.split_first()?;
        Some(Self {
            exe: exe.clone(),
            args: args.to_vec(),
        })
    }

    pub fn pretty(&self) -> String {
        pretty(&self.exe, &self.args)
    }
}

/// Why the command did not succeed. The `Display` text is what ends up in
/// the notification's "Error" field.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start `{exe}`: {source}")]
    Spawn {
        exe: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Exit(ExitStatus),

    #[error("reading command output: {0}")]
    Io(#[source] io::Error),
}

/// Result of one run of the command.
#[derive(Debug)]
pub struct Outcome {
    /// Combined stdout and stderr, in arrival order.
    pub output: Vec<u8>,
    pub failure: Option<ExecError>,
    pub elapsed: Duration,
}

/// Run the command to completion. Never fails: every problem is recorded on
/// the returned [`Outcome`].
///
/// With `verbose`, the child's stdout and stderr are also copied to ours as
/// they arrive.
pub async fn run(invocation: &Invocation, verbose: bool) -> Outcome {
    let capture = SharedBuffer::new();
    let start = Instant::now();
    let failure = drive(invocation, verbose, &capture).await.err();
    let elapsed = start.elapsed();

    Outcome {
        output: capture.contents(),
        failure,
        elapsed,
    }
}

async fn drive(
    invocation: &Invocation,
    verbose: bool,
    capture: &SharedBuffer,
) -> Result<(), ExecError> {
    let status = if verbose {
        run_echoed(invocation, capture).await?
    } else {
        run_merged(invocation, capture).await?
    };
    debug!(%status, captured = capture.bytes_written(), "command finished");

    if status.success() {
        Ok(())
    } else {
        Err(ExecError::Exit(status))
    }
}

fn spawn(cmd: &mut Command, invocation: &Invocation) -> Result<Child, ExecError> {
    let child = cmd
        .args(&invocation.args)
        .stdin(Stdio::inherit())
        .spawn()
        .map_err(|source| ExecError::Spawn {
            exe: invocation.exe.clone(),
            source,
        })?;
    debug!(pid = ?child.id(), exe = %invocation.exe, "spawned command");
    Ok(child)
}

/// stdout and stderr share one pipe, so the capture keeps the exact order
/// the child wrote in.
async fn run_merged(
    invocation: &Invocation,
    capture: &SharedBuffer,
) -> Result<ExitStatus, ExecError> {
    let (mut reader, writer) = io::pipe().map_err(ExecError::Io)?;
    let mut child = {
        let mut cmd = Command::new(&invocation.exe);
        cmd.stdout(writer.try_clone().map_err(ExecError::Io)?)
            .stderr(writer);
        spawn(&mut cmd, invocation)?
        // `cmd` drops our write ends here; EOF arrives once the child exits.
    };

    let mut sink = capture.clone();
    let drain = tokio::task::spawn_blocking(move || io::copy(&mut reader, &mut sink));
    let (status, drained) = tokio::join!(child.wait(), drain);

    let status = status.map_err(ExecError::Io)?;
    drained
        .map_err(|e| ExecError::Io(io::Error::other(e)))?
        .map_err(ExecError::Io)?;
    Ok(status)
}

/// Separate pipes so each stream can be echoed to its local counterpart.
async fn run_echoed(
    invocation: &Invocation,
    capture: &SharedBuffer,
) -> Result<ExitStatus, ExecError> {
    let mut child = spawn(
        Command::new(&invocation.exe)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped()),
        invocation,
    )?;

    let out_sink = MultiWriter::new().with(capture.clone()).with(io::stdout());
    let err_sink = MultiWriter::new().with(capture.clone()).with(io::stderr());

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (out_res, err_res, status) = tokio::join!(
        pump(stdout, out_sink),
        pump(stderr, err_sink),
        child.wait(),
    );

    let status = status.map_err(ExecError::Io)?;
    out_res.map_err(ExecError::Io)?;
    err_res.map_err(ExecError::Io)?;
    Ok(status)
}

/// Copy a child pipe into `sink` until EOF. Only read errors end the copy.
/// Write errors can only come from the local echo: the capture still gets
/// every byte and the run is not marked failed.
async fn pump<R>(reader: Option<R>, mut sink: MultiWriter) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(());
    };

    let mut buf = vec![0u8; READ_CHUNK];
    let mut echo_failed = false;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if let Err(err) = sink.write_all(&buf[..n]).and_then(|()| sink.flush()) {
            if !echo_failed {
                warn!(error = %err, "local echo failed; output is still captured");
                echo_failed = true;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sh(script: &str) -> Invocation {
        Invocation {
            exe: "sh".into(),
            args: vec!["-c".into(), script.into()],
        }
    }

    #[test]
    fn from_argv_splits_exe() {
        let argv: Vec<String> = ["ls", "-la", "my dir"].iter().map(|s| s.to_string()).collect();
        let inv = Invocation::from_argv(&argv).unwrap();
        assert_eq!(inv.exe, "ls");
        assert_eq!(inv.args, vec!["-la".to_string(), "my dir".to_string()]);
        assert_eq!(inv.pretty(), r#"ls -la "my dir""#);
        assert!(Invocation::from_argv(&[]).is_none());
    }

    #[tokio::test]
    async fn captures_stdout() {
        let inv = Invocation {
            exe: "echo".into(),
            args: vec!["hello".into(), "world".into()],
        };
        let outcome = run(&inv, false).await;
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.output, b"hello world\n");
    }

    #[tokio::test]
    async fn combines_streams_in_write_order() {
        for _ in 0..20 {
            let outcome = run(
                &sh("printf a; printf b >&2; printf c; printf d >&2; printf e"),
                false,
            )
            .await;
            assert!(outcome.failure.is_none());
            assert_eq!(String::from_utf8_lossy(&outcome.output), "abcde");
        }
    }

    #[tokio::test]
    async fn verbose_keeps_order_of_separated_writes() {
        let outcome = run(&sh("echo a; sleep 0.1; echo b >&2; sleep 0.1; echo c"), true).await;
        assert!(outcome.failure.is_none());
        assert_eq!(String::from_utf8_lossy(&outcome.output), "a\nb\nc\n");
    }

    #[tokio::test]
    async fn failing_echo_does_not_cut_capture() {
        let capture = SharedBuffer::new();
        let sink = MultiWriter::new().with(capture.clone()).with(ClosedPipe);
        let data: &[u8] = b"first chunk\nsecond chunk\n";
        pump(Some(data), sink).await.unwrap();
        assert_eq!(capture.contents(), data);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn verbose_still_captures() {
        let outcome = run(&sh("echo shown; echo also >&2"), true).await;
        assert!(outcome.failure.is_none());
        let text = String::from_utf8_lossy(&outcome.output);
        assert!(text.contains("shown\n"));
        assert!(text.contains("also\n"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_failure() {
        let outcome = run(&sh("echo partial; exit 3"), false).await;
        assert_eq!(outcome.output, b"partial\n");
        let failure = outcome.failure.unwrap();
        assert_matches!(&failure, ExecError::Exit(status) if status.code() == Some(3));
        assert_eq!(failure.to_string(), "exit status: 3");
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_failure() {
        let inv = Invocation {
            exe: "hookrun-no-such-binary".into(),
            args: vec![],
        };
        let outcome = run(&inv, false).await;
        assert!(outcome.output.is_empty());
        let failure = outcome.failure.unwrap();
        assert_matches!(&failure, ExecError::Spawn { exe, .. } if exe == "hookrun-no-such-binary");
        assert!(failure
            .to_string()
            .starts_with("failed to start `hookrun-no-such-binary`: "));
    }

    #[tokio::test]
    async fn elapsed_covers_the_run() {
        let outcome = run(&sh("sleep 0.2"), false).await;
        assert!(outcome.failure.is_none());
        assert!(outcome.elapsed >= Duration::from_millis(200));
    }
}
