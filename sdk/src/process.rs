use {
    anyhow::{Context as _, Result, bail},
    std::{
        io::Write,
        process::{Command, Output, Stdio},
        thread,
    },
    tracing::{debug, warn},
};

/// Runs `command` to completion, feeding it `input` on stdin.
///
/// Stdout is captured. Stderr is captured unless `inherit_stderr` is set.
pub(crate) fn run(
    mut command: Command,
    input: Option<&[u8]>,
    inherit_stderr: bool,
) -> std::io::Result<Output> {
    debug!(?command, "running");
    command
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(if inherit_stderr {
            Stdio::inherit()
        } else {
            Stdio::piped()
        });
    let mut child = command.spawn()?;
    let stdin = child.stdin.take();
    thread::scope(|scope| {
        if let (Some(mut stdin), Some(input)) = (stdin, input) {
            // Written from a separate thread so a child filling its stdout
            // cannot block us.
            scope.spawn(move || {
                if let Err(err) = stdin.write_all(input) {
                    warn!(%err, "failed to write child process input");
                }
            });
        }
        child.wait_with_output()
    })
}

/// Fails with the captured stderr if the process did not succeed.
pub(crate) fn check(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        bail!("{program} failed ({})", output.status);
    }
    bail!("{program} failed ({}): {stderr}", output.status);
}

pub(crate) fn split_command_line(command_line: &str) -> Result<Vec<String>> {
    let words = shell_words::split(command_line)
        .with_context(|| format!("invalid command line: {command_line:?}"))?;
    if words.is_empty() {
        bail!("empty command line");
    }
    Ok(words)
}
