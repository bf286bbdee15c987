pub mod cli;
pub mod config;
mod decrypt;
pub mod editor;
mod encrypt;
mod info;
pub mod term;

use {
    crate::{
        cli::{Cli, Command, RecipientArgs},
        config::Config,
        encrypt::CreateOptions,
        term::TermLayer,
    },
    anyhow::{Context as _, Result, bail},
    fidelius_sdk::{Gpg, SecretKeeper, git},
    fs_err as fs,
    std::{env, path::Path, sync::Mutex},
    tracing::{debug, warn},
    tracing_subscriber::{EnvFilter, prelude::*},
};

/// Environment variable holding whitespace separated recipients.
pub const RECIPIENTS_ENV: &str = "FIDELIUS_RECIPIENTS";

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug)]
pub struct Ctx {
    pub config: Config,
    pub keeper: SecretKeeper,
}

impl Ctx {
    #[must_use]
    #[inline]
    pub fn gpg(&self) -> &Gpg {
        self.keeper.gpg()
    }
}

#[inline]
pub fn run(cli: Cli) -> Result<()> {
    if cli.command == Command::Version {
        term::print(format!("fidelius {}", env!("CARGO_PKG_VERSION")))?;
        return Ok(());
    }

    let root = match &cli.path {
        Some(path) => path.clone(),
        None => {
            let current = env::current_dir()?;
            git::find_repository_root(&current).with_context(|| {
                format!(
                    "{} is not inside a git repository, use `--path` to choose a directory",
                    current.display()
                )
            })?
        }
    };
    let config = Config::load(cli.config.as_deref(), &root)?;
    let filter = log_filter(cli.debug, env::var("RUST_LOG").ok(), &config);
    setup_logger(&filter, config.log_file.as_deref())?;
    debug!(?config, root = %root.display(), "starting");

    let gpg = match &config.gpg_program {
        Some(command_line) => Gpg::from_command_line(command_line)?,
        None => Gpg::default(),
    }
    .with_verbose(cli.verbose)
    .with_create_parents(config.create_parents);
    let ctx = Ctx {
        keeper: SecretKeeper::open(&root, gpg)?,
        config,
    };
    if ctx.config.check_gitignore {
        check_gitignore(&ctx);
    }
    handle_command(cli.command, &ctx)
}

fn handle_command(command: Command, ctx: &Ctx) -> Result<()> {
    match command {
        Command::Version => {}
        Command::Ls => info::ls(ctx)?,
        Command::LsEncrypted => info::ls_encrypted(ctx)?,
        Command::LsDecrypted => info::ls_decrypted(ctx)?,
        Command::Decrypt { secrets } => decrypt::decrypt(ctx, &secrets)?,
        Command::Clean => decrypt::clean(ctx)?,
        Command::Cat { secrets } => decrypt::cat(ctx, &secrets)?,
        Command::View { secret } => decrypt::view(ctx, &secret)?,
        Command::Edit { recipients, secret } => {
            let recipients = resolve_recipients(recipients, env_recipients(), &ctx.config)?;
            encrypt::edit(ctx, &recipients, &secret)?;
        }
        Command::Encrypt {
            recipients,
            force,
            secrets,
        } => {
            let recipients = resolve_recipients(recipients, env_recipients(), &ctx.config)?;
            encrypt::encrypt(ctx, &recipients, &secrets, force)?;
        }
        Command::Create {
            recipients,
            layout,
            armor,
            target,
            plaintext,
        } => {
            let recipients = resolve_recipients(recipients, env_recipients(), &ctx.config)?;
            let options = CreateOptions {
                path: &target,
                layout: layout.map(Into::into),
                armor,
                plaintext: plaintext.as_deref(),
            };
            encrypt::create(ctx, &recipients, &options)?;
        }
    }
    Ok(())
}

fn check_gitignore(ctx: &Ctx) {
    match ctx.keeper.check_gitignore() {
        Ok(paths) => {
            for path in paths {
                warn!(
                    "{} is not ignored by git, add it to .gitignore",
                    term::relative(&path).display()
                );
            }
        }
        Err(err) => warn!("failed to check .gitignore: {err:#}"),
    }
}

fn env_recipients() -> Option<String> {
    env::var(RECIPIENTS_ENV).ok()
}

/// Recipients from the command line, then the environment, then the config.
fn resolve_recipients(
    args: RecipientArgs,
    from_env: Option<String>,
    config: &Config,
) -> Result<Vec<String>> {
    if !args.recipients.is_empty() {
        return Ok(args.recipients);
    }
    let from_env: Vec<String> = from_env
        .iter()
        .flat_map(|value| value.split_whitespace())
        .map(str::to_owned)
        .collect();
    if !from_env.is_empty() {
        return Ok(from_env);
    }
    if !config.recipients.is_empty() {
        return Ok(config.recipients.clone());
    }
    bail!(
        "no recipients, use `--recipient`, set ${RECIPIENTS_ENV} \
        or add `recipients` to the config file"
    );
}

/// `--debug` wins over `RUST_LOG`, which wins over the config.
fn log_filter(debug: bool, from_env: Option<String>, config: &Config) -> String {
    if debug {
        return "debug".into();
    }
    from_env
        .filter(|value| !value.trim().is_empty())
        .or_else(|| config.log_filter.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.into())
}

fn setup_logger(filter: &str, log_file: Option<&Path>) -> Result<()> {
    let file_layer = log_file
        .map(|path| -> Result<_> {
            let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
            Ok(tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)))
        })
        .transpose()?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(filter).with_context(|| format!("invalid log filter {filter:?}"))?)
        .with(TermLayer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}
