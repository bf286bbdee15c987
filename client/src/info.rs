use {
    crate::{Ctx, term},
    anyhow::Result,
    tracing::warn,
};

fn warn_if_empty(ctx: &Ctx) {
    if ctx.keeper.is_empty() {
        warn!("no secrets found in {}", term::relative(ctx.keeper.root()).display());
    }
}

/// Prints `encrypted -> decrypted` for every secret.
#[inline]
pub fn ls(ctx: &Ctx) -> Result<()> {
    warn_if_empty(ctx);
    for secret in &ctx.keeper {
        term::print(format!(
            "{} -> {}",
            term::encrypted(&secret.encrypted),
            term::decrypted(&secret.decrypted)
        ))?;
    }
    Ok(())
}

#[inline]
pub fn ls_encrypted(ctx: &Ctx) -> Result<()> {
    warn_if_empty(ctx);
    for secret in &ctx.keeper {
        term::print(term::encrypted(&secret.encrypted))?;
    }
    Ok(())
}

#[inline]
pub fn ls_decrypted(ctx: &Ctx) -> Result<()> {
    warn_if_empty(ctx);
    for secret in &ctx.keeper {
        term::print(term::decrypted(&secret.decrypted))?;
    }
    Ok(())
}
