use {
    clap::{Args, Parser, Subcommand, ValueEnum},
    fidelius_paths::Layout,
    std::path::PathBuf,
};

/// Manage GPG encrypted secrets in a git repository.
///
/// `name.encrypted.ext.asc` decrypts to `name.decrypted.ext`, and
/// `dir.encrypted/name.ext.gpg` decrypts to `dir/name.decrypted.ext`.
#[derive(Debug, Parser)]
#[command(name = "fidelius", version)]
pub struct Cli {
    /// Directory to search for secrets. Defaults to the enclosing git repository.
    #[arg(short, long, global = true)]
    pub path: Option<PathBuf>,
    /// Config file. Defaults to `.fidelius.json5` in the searched directory.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub debug: bool,
    /// Show gpg's own messages.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Show the application version.
    Version,
    /// List encrypted paths with the paths they decrypt to.
    Ls,
    /// List encrypted paths.
    LsEncrypted,
    /// List decrypted paths.
    LsDecrypted,
    /// Write plaintext files for encrypted secrets.
    ///
    /// Decrypts every secret when no paths are given.
    Decrypt { secrets: Vec<PathBuf> },
    /// Delete all plaintext files.
    Clean,
    /// Print decrypted contents.
    Cat {
        #[arg(required = true)]
        secrets: Vec<PathBuf>,
    },
    /// Show decrypted contents in a pager.
    View { secret: PathBuf },
    /// Edit a secret without writing a plaintext file.
    Edit {
        #[command(flatten)]
        recipients: RecipientArgs,
        secret: PathBuf,
    },
    /// Encrypt secrets from their plaintext files.
    Encrypt {
        #[command(flatten)]
        recipients: RecipientArgs,
        /// Encrypt even if the plaintext has not changed.
        #[arg(short, long)]
        force: bool,
        #[arg(required = true)]
        secrets: Vec<PathBuf>,
    },
    /// Create a new secret from a plaintext file or in the editor.
    ///
    /// Without `--layout`, PATH is the encrypted path to create. With
    /// `--layout`, PATH is the plaintext path and the encrypted path is
    /// derived from it.
    Create {
        #[command(flatten)]
        recipients: RecipientArgs,
        /// Derive the encrypted path from a plaintext path.
        #[arg(short, long, value_enum)]
        layout: Option<LayoutArg>,
        /// Use ASCII-armored `.asc` output for a derived path instead of `.gpg`.
        #[arg(short, long, requires = "layout")]
        armor: bool,
        #[arg(value_name = "PATH")]
        target: PathBuf,
        /// File to read the plaintext from instead of opening the editor.
        plaintext: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct RecipientArgs {
    /// Key to encrypt for, passed to gpg as `--recipient`. Falls back to
    /// `$FIDELIUS_RECIPIENTS` and the config file.
    #[arg(short, long = "recipient", value_name = "ID")]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// `name.encrypted.ext.gpg`
    Name,
    /// `name.encrypted/file.ext.gpg`
    Directory,
    /// `name.encrypted/file.encrypted.ext.gpg`
    DirectoryName,
}

impl From<LayoutArg> for Layout {
    #[inline]
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Name => Self::Name,
            LayoutArg::Directory => Self::Directory {
                depth: 0,
                name_marker: false,
            },
            LayoutArg::DirectoryName => Self::Directory {
                depth: 0,
                name_marker: true,
            },
        }
    }
}
