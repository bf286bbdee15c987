use {
    crate::{Ctx, editor, term},
    anyhow::{Result, bail},
    fidelius_sdk::Secret,
    fs_err as fs,
    std::path::{Path, PathBuf},
    tracing::error,
};

/// Secrets named by `paths`, or every secret if `paths` is empty.
fn select<'a>(ctx: &'a Ctx, paths: &[PathBuf]) -> Result<Vec<&'a Secret>> {
    if paths.is_empty() {
        return Ok(ctx.keeper.iter().collect());
    }
    paths.iter().map(|path| ctx.keeper.get(path)).collect()
}

/// Writes plaintext files. A secret that fails to decrypt does not stop the others.
#[inline]
pub fn decrypt(ctx: &Ctx, paths: &[PathBuf]) -> Result<()> {
    let secrets = select(ctx, paths)?;
    let mut failed = Vec::new();
    for secret in &secrets {
        match secret.decrypt(ctx.gpg()) {
            Ok(()) => term::print(format!(
                "Decrypted {} to {}",
                term::encrypted(&secret.encrypted),
                term::decrypted(&secret.decrypted)
            ))?,
            Err(err) => {
                error!(
                    "failed to decrypt {}: {err:#}",
                    term::relative(&secret.encrypted).display()
                );
                failed.push(secret);
            }
        }
    }
    if !failed.is_empty() {
        bail!("failed to decrypt {} of {} secrets", failed.len(), secrets.len());
    }
    Ok(())
}

/// Deletes every plaintext file that exists.
#[inline]
pub fn clean(ctx: &Ctx) -> Result<()> {
    for secret in &ctx.keeper {
        if secret.decrypted.try_exists()? {
            fs::remove_file(&secret.decrypted)?;
            term::print(format!("Deleted {}", term::decrypted(&secret.decrypted)))?;
        }
    }
    Ok(())
}

#[inline]
pub fn cat(ctx: &Ctx, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let secret = ctx.keeper.get(path)?;
        term::write_raw(&secret.contents(ctx.gpg())?)?;
    }
    Ok(())
}

#[inline]
pub fn view(ctx: &Ctx, path: &Path) -> Result<()> {
    let secret = ctx.keeper.get(path)?;
    editor::view(&ctx.config, &secret.contents(ctx.gpg())?)
}
