use {
    crate::{Ctx, editor, term},
    anyhow::{Context as _, Result, bail},
    fidelius_paths::{CipherSuffix, Layout, encrypted_path, resolve},
    fidelius_sdk::absolute,
    fs_err as fs,
    std::path::{Path, PathBuf},
    tracing::warn,
};

/// Edits a secret in memory and encrypts the result. No plaintext file is written.
#[inline]
pub fn edit(ctx: &Ctx, recipients: &[String], path: &Path) -> Result<()> {
    let secret = ctx.keeper.get(path)?;
    let old_text = String::from_utf8(secret.contents(ctx.gpg())?).with_context(|| {
        format!(
            "{} does not contain UTF-8 text",
            term::relative(&secret.encrypted).display()
        )
    })?;
    let new_text = editor::edit(
        &ctx.config,
        &old_text,
        editor::plaintext_extension(&secret.decrypted),
    )?;
    if new_text.is_empty() {
        bail!(
            "new contents are empty, {} was not changed",
            term::relative(&secret.encrypted).display()
        );
    }
    if new_text == old_text {
        bail!(
            "no changes were made to {}",
            term::relative(&secret.encrypted).display()
        );
    }
    secret.encrypt_bytes(ctx.gpg(), new_text.as_bytes(), recipients)?;
    term::print(format!("Encrypted {}", term::encrypted(&secret.encrypted)))?;

    if secret.decrypted.try_exists()? {
        warn!(
            "plaintext {} is out of date, run `fidelius decrypt` to update it \
            or `fidelius clean` to remove it",
            term::relative(&secret.decrypted).display()
        );
    }
    Ok(())
}

/// Encrypts secrets from their plaintext files.
///
/// Secrets without a plaintext file are skipped, as are secrets whose
/// plaintext matches the encrypted contents unless `force` is set.
#[inline]
pub fn encrypt(ctx: &Ctx, recipients: &[String], paths: &[PathBuf], force: bool) -> Result<()> {
    for path in paths {
        let secret = ctx.keeper.get(path)?;
        if !secret.decrypted.try_exists()? {
            term::print(format!(
                "Skipping {}: {} does not exist",
                term::encrypted(&secret.encrypted),
                term::decrypted(&secret.decrypted)
            ))?;
            continue;
        }
        if !force && secret.plaintext()? == secret.contents(ctx.gpg())? {
            term::print(format!(
                "Skipping {}: {} has not changed",
                term::encrypted(&secret.encrypted),
                term::decrypted(&secret.decrypted)
            ))?;
            continue;
        }
        secret.re_encrypt(ctx.gpg(), recipients)?;
        term::print(format!(
            "Encrypted {} from {}",
            term::encrypted(&secret.encrypted),
            term::decrypted(&secret.decrypted)
        ))?;
    }
    Ok(())
}

/// Options of [`create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions<'a> {
    /// Encrypted path, or the plaintext path if `layout` is set.
    pub path: &'a Path,
    pub layout: Option<Layout>,
    pub armor: bool,
    /// Read the plaintext from this file instead of the editor.
    pub plaintext: Option<&'a Path>,
}

/// Creates a new secret.
#[inline]
pub fn create(ctx: &Ctx, recipients: &[String], options: &CreateOptions<'_>) -> Result<()> {
    let root = ctx.keeper.root();
    let target = absolute(options.path)?;
    let relative = target
        .strip_prefix(root)
        .with_context(|| format!("{} is outside of {}", target.display(), root.display()))?;
    let paths = match options.layout {
        Some(layout) => {
            let cipher = if options.armor {
                CipherSuffix::Asc
            } else {
                CipherSuffix::Gpg
            };
            resolve(&encrypted_path(relative, layout, cipher)?)?
        }
        None => resolve(relative)?,
    };
    let encrypted = root.join(&paths.encrypted);
    let decrypted = root.join(&paths.decrypted);

    if encrypted.try_exists()? {
        bail!(
            "{} already exists, use `fidelius edit` to change it",
            term::relative(&encrypted).display()
        );
    }
    if let Some(existing) = ctx.keeper.iter().find(|secret| secret.decrypted == decrypted) {
        bail!(
            "{} already decrypts to {}",
            term::relative(&existing.encrypted).display(),
            term::relative(&decrypted).display()
        );
    }
    if let Some(parent) = encrypted.parent() {
        fs::create_dir_all(parent)?;
    }

    match options.plaintext {
        Some(input) => ctx
            .gpg()
            .encrypt_file(&encrypted, input, paths.cipher, recipients)?,
        None => {
            let text = editor::edit(&ctx.config, "", editor::plaintext_extension(&decrypted))?;
            if text.is_empty() {
                bail!(
                    "new contents are empty, {} was not created",
                    term::relative(&encrypted).display()
                );
            }
            ctx.gpg()
                .encrypt_bytes(&encrypted, text.as_bytes(), paths.cipher, recipients)?;
        }
    }
    term::print(format!(
        "Created {} for {}",
        term::encrypted(&encrypted),
        term::decrypted(&decrypted)
    ))?;
    Ok(())
}
