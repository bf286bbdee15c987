use {
    crossterm::{
        QueueableCommand,
        style::{Color, ResetColor, SetForegroundColor, Stylize},
    },
    once_cell::sync::Lazy,
    parking_lot::{Mutex, MutexGuard},
    std::{
        env,
        fmt::{self, Display, Write as _},
        io::{self, IsTerminal, Stderr, Stdout, Write},
        path::{Path, PathBuf},
    },
    tracing::{
        Event, Level, Metadata, Subscriber,
        field::{Field, Visit},
    },
    tracing_subscriber::{Layer, layer::Context},
};

struct Term {
    stdout: Stdout,
    stderr: Stderr,
    stderr_color: bool,
}

fn term() -> MutexGuard<'static, Term> {
    static TERM: Lazy<Mutex<Term>> = Lazy::new(|| Mutex::new(Term::new()));
    TERM.lock()
}

fn color_allowed() -> bool {
    env::var_os("NO_COLOR").is_none_or(|value| value.is_empty())
}

static STDOUT_COLOR: Lazy<bool> = Lazy::new(|| color_allowed() && io::stdout().is_terminal());

impl Term {
    fn new() -> Self {
        let stderr = io::stderr();
        Self {
            stdout: io::stdout(),
            stderr_color: color_allowed() && stderr.is_terminal(),
            stderr,
        }
    }

    fn write_stderr(&mut self, color: Option<Color>, text: &str) -> io::Result<()> {
        let color = color.filter(|_| self.stderr_color);
        if let Some(color) = color {
            self.stderr.queue(SetForegroundColor(color))?;
        }
        self.stderr.write_all(text.trim_end_matches('\n').as_bytes())?;
        if color.is_some() {
            self.stderr.queue(ResetColor)?;
        }
        self.stderr.write_all(b"\n")?;
        self.stderr.flush()
    }
}

/// Writes a line of command output to stdout.
#[inline]
pub fn print(line: impl Display) -> io::Result<()> {
    let mut term = term();
    writeln!(term.stdout, "{line}")?;
    term.stdout.flush()
}

/// Writes decrypted contents to stdout unchanged.
#[inline]
pub fn write_raw(bytes: &[u8]) -> io::Result<()> {
    let mut term = term();
    term.stdout.write_all(bytes)?;
    term.stdout.flush()
}

/// Reports a fatal error on stderr. Works before the logger is set up.
#[inline]
pub fn error(message: impl Display) {
    let _ = term().write_stderr(Some(Color::Red), &format!("error: {message}"));
}

/// `path` relative to the current directory, if it can be expressed that way.
#[must_use]
#[inline]
pub fn relative(path: &Path) -> PathBuf {
    static CURRENT_DIR: Lazy<Option<PathBuf>> = Lazy::new(|| {
        env::current_dir()
            .ok()
            .and_then(|dir| dunce::canonicalize(dir).ok())
    });
    CURRENT_DIR
        .as_deref()
        .and_then(|dir| pathdiff::diff_paths(path, dir))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Encrypted path for display, green on a terminal.
#[must_use]
#[inline]
pub fn encrypted(path: &Path) -> String {
    styled(path, Color::Green)
}

/// Decrypted path for display, red on a terminal.
#[must_use]
#[inline]
pub fn decrypted(path: &Path) -> String {
    styled(path, Color::Red)
}

fn styled(path: &Path, color: Color) -> String {
    let text = relative(path).display().to_string();
    if *STDOUT_COLOR {
        text.with(color).to_string()
    } else {
        text
    }
}

pub struct TermLayer;

impl<S: Subscriber> Layer<S> for TermLayer {
    #[inline]
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        let (prefix, color) = if level == Level::ERROR {
            ("error: ", Some(Color::Red))
        } else if level == Level::WARN {
            ("warning: ", Some(Color::Yellow))
        } else if level == Level::INFO {
            ("", None)
        } else {
            ("", Some(Color::Grey))
        };
        let mut message = prefix.to_owned();
        let mut fields = Vec::new();
        event.record(&mut DebugVisitor(&mut message, &mut fields));
        if !fields.is_empty() {
            let _ = write!(message, " ({})", fields.join(", "));
        }
        let _ = term().write_stderr(color, &message);
    }

    #[inline]
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        metadata
            .module_path()
            .is_some_and(|path| path.starts_with("fidelius"))
    }
}

struct DebugVisitor<'a>(&'a mut String, &'a mut Vec<String>);

impl Visit for DebugVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{value:?}");
        } else {
            self.1.push(format!("{} = {:?}", field.name(), value));
        }
    }
}
