use {
    crate::{git, gpg::Gpg, search},
    anyhow::{Result, anyhow, bail},
    derive_more::{Deref, From},
    fidelius_paths::SecretPaths,
    fs_err as fs,
    std::{
        collections::{BTreeMap, btree_map},
        env,
        path::{Path, PathBuf},
    },
    tracing::{debug, info},
};

/// An encrypted file and the plaintext file it decrypts to.
#[derive(Debug, Clone, PartialEq, Eq, From, Deref)]
pub struct Secret(SecretPaths);

impl Secret {
    #[must_use]
    #[inline]
    pub fn paths(&self) -> &SecretPaths {
        &self.0
    }

    #[must_use]
    #[inline]
    pub fn is_armored(&self) -> bool {
        self.cipher.is_armored()
    }

    /// Writes the plaintext file.
    #[inline]
    pub fn decrypt(&self, gpg: &Gpg) -> Result<()> {
        gpg.decrypt_to(&self.encrypted, &self.decrypted, self.cipher)
    }

    /// Decrypts into memory without touching the plaintext file.
    #[inline]
    pub fn contents(&self, gpg: &Gpg) -> Result<Vec<u8>> {
        gpg.contents(&self.encrypted, self.cipher)
    }

    /// Reads the current plaintext file.
    #[inline]
    pub fn plaintext(&self) -> Result<Vec<u8>> {
        debug!("reading contents of {}", self.decrypted.display());
        Ok(fs::read(&self.decrypted)?)
    }

    /// Replaces the encrypted file with the contents of the plaintext file.
    #[inline]
    pub fn re_encrypt(&self, gpg: &Gpg, recipients: &[String]) -> Result<()> {
        debug!(
            "re-encrypting {} from {}",
            self.encrypted.display(),
            self.decrypted.display()
        );
        gpg.encrypt_file(&self.encrypted, &self.decrypted, self.cipher, recipients)
    }

    /// Replaces the encrypted file with `text`.
    #[inline]
    pub fn encrypt_bytes(&self, gpg: &Gpg, text: &[u8], recipients: &[String]) -> Result<()> {
        gpg.encrypt_bytes(&self.encrypted, text, self.cipher, recipients)
    }
}

/// All secrets found below a directory.
#[derive(Debug)]
pub struct SecretKeeper {
    root: PathBuf,
    /// Keyed by encrypted path.
    secrets: BTreeMap<PathBuf, Secret>,
    gpg: Gpg,
}

impl SecretKeeper {
    /// Searches `root` for secrets.
    #[inline]
    pub fn open(root: &Path, gpg: Gpg) -> Result<Self> {
        let root = dunce::canonicalize(root)
            .map_err(|err| anyhow!("cannot open {}: {err}", root.display()))?;
        let secrets = search::search(&root)?
            .into_iter()
            .map(|paths| (paths.encrypted.clone(), Secret::from(paths)))
            .collect();
        Ok(Self { root, secrets, gpg })
    }

    #[must_use]
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    #[inline]
    pub fn gpg(&self) -> &Gpg {
        &self.gpg
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Secrets ordered by encrypted path.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Secret> {
        self.secrets.values()
    }

    /// Finds a secret by its encrypted or decrypted path.
    ///
    /// Relative paths are resolved against the current directory.
    #[inline]
    pub fn get(&self, path: &Path) -> Result<&Secret> {
        let absolute = absolute(path)?;
        self.secrets
            .get(&absolute)
            .or_else(|| self.iter().find(|secret| secret.decrypted == absolute))
            .ok_or_else(|| anyhow!("no secret named {}", path.display()))
    }

    /// Plaintext paths that `.gitignore` does not exclude.
    #[inline]
    pub fn check_gitignore(&self) -> Result<Vec<PathBuf>> {
        info!("checking all decrypted files are ignored by git");
        let decrypted = search::decrypted_paths(self.iter().map(Secret::paths));
        git::unignored_paths(&self.root, &decrypted)
    }
}

impl<'a> IntoIterator for &'a SecretKeeper {
    type Item = &'a Secret;
    type IntoIter = btree_map::Values<'a, PathBuf, Secret>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.secrets.values()
    }
}

/// Makes `path` absolute, resolving symlinks in the part that exists.
#[inline]
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    canonicalize(&path)
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    if path.try_exists()? {
        return Ok(dunce::canonicalize(path)?);
    }

    // Only works if last component is `Component::Normal`.
    let Some(file_name) = path.file_name() else {
        bail!(
            "unsupported path (must end with file or dir name): {}",
            path.display()
        );
    };
    let Some(parent) = path.parent() else {
        bail!("unsupported path (couldn't get parent): {}", path.display());
    };
    Ok(canonicalize(parent)?.join(file_name))
}
