use {
    crate::{config::Config, term},
    anyhow::{Context as _, Result, bail},
    fs_err as fs,
    std::{
        env,
        io::{self, ErrorKind, IsTerminal, Write},
        path::Path,
        process::{Command, Stdio},
    },
    tracing::debug,
};

const DEFAULT_EDITOR: &str = "vi";
const DEFAULT_PAGER: &str = "less";

fn command_line(configured: Option<&str>, variables: &[&str], default: &str) -> String {
    configured
        .map(str::to_owned)
        .or_else(|| {
            variables
                .iter()
                .filter_map(|name| env::var(name).ok())
                .find(|value| !value.trim().is_empty())
        })
        .unwrap_or_else(|| default.to_owned())
}

fn command(command_line: &str) -> Result<Command> {
    let words = shell_words::split(command_line)
        .with_context(|| format!("invalid command line: {command_line:?}"))?;
    let Some((program, args)) = words.split_first() else {
        bail!("empty command line");
    };
    let mut command = Command::new(program);
    command.args(args);
    Ok(command)
}

/// Editor command: the config, then `$VISUAL`, then `$EDITOR`.
#[must_use]
#[inline]
pub fn editor_command_line(config: &Config) -> String {
    command_line(
        config.editor.as_deref(),
        &["VISUAL", "EDITOR"],
        DEFAULT_EDITOR,
    )
}

/// Pager command: the config, then `$PAGER`.
#[must_use]
#[inline]
pub fn pager_command_line(config: &Config) -> String {
    command_line(config.pager.as_deref(), &["PAGER"], DEFAULT_PAGER)
}

/// Opens `text` in the editor and returns the edited text.
///
/// The text lives in a private temporary file ending with `extension` so the
/// editor can pick a syntax.
#[inline]
pub fn edit(config: &Config, text: &str, extension: Option<&str>) -> Result<String> {
    let suffix = extension.map(|ext| format!(".{ext}")).unwrap_or_default();
    let file = tempfile::Builder::new()
        .prefix("fidelius-")
        .suffix(&suffix)
        .tempfile()?;
    fs::write(file.path(), text)?;

    let command_line = editor_command_line(config);
    debug!("running editor {command_line:?} on {}", file.path().display());
    let status = command(&command_line)?
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to run editor {command_line:?}"))?;
    if !status.success() {
        bail!("editor {command_line:?} failed ({status})");
    }
    Ok(fs::read_to_string(file.path())?)
}

/// Shows `contents` in the pager, or prints them if stdout is not a terminal.
#[inline]
pub fn view(config: &Config, contents: &[u8]) -> Result<()> {
    if !io::stdout().is_terminal() {
        term::write_raw(contents)?;
        return Ok(());
    }
    let command_line = pager_command_line(config);
    debug!("running pager {command_line:?}");
    let mut child = command(&command_line)?
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to run pager {command_line:?}"))?;
    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(contents) {
            // The pager may quit before reading everything.
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
            result => result?,
        }
    }
    let status = child.wait()?;
    if !status.success() {
        bail!("pager {command_line:?} failed ({status})");
    }
    Ok(())
}

/// Extension of the plaintext file, passed to the editor's temporary file.
#[must_use]
#[inline]
pub fn plaintext_extension(decrypted: &Path) -> Option<&str> {
    decrypted.extension().and_then(|ext| ext.to_str())
}
