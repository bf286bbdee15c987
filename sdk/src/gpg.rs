use {
    crate::process,
    anyhow::{Context as _, Result, bail},
    fidelius_paths::CipherSuffix,
    fs_err as fs,
    std::{ffi::OsStr, path::Path, process::Command},
    tracing::debug,
};

/// Runs the `gpg` executable. All cryptography happens there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gpg {
    /// Program followed by any fixed arguments, e.g. `["gpg2", "--homedir", "x"]`.
    command_line: Vec<String>,
    verbose: bool,
    create_parents: bool,
}

impl Default for Gpg {
    #[inline]
    fn default() -> Self {
        Self {
            command_line: vec!["gpg".into()],
            verbose: false,
            create_parents: true,
        }
    }
}

impl Gpg {
    /// Uses a shell-style command line instead of plain `gpg`.
    #[inline]
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        Ok(Self {
            command_line: process::split_command_line(command_line)?,
            ..Self::default()
        })
    }

    /// Let gpg's stderr through to the terminal instead of capturing it.
    #[must_use]
    #[inline]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Create a missing plaintext parent directory before decrypting into it.
    #[must_use]
    #[inline]
    pub fn with_create_parents(mut self, create_parents: bool) -> Self {
        self.create_parents = create_parents;
        self
    }

    fn program(&self) -> &str {
        self.command_line.first().map_or("gpg", String::as_str)
    }

    fn command(&self, cipher: CipherSuffix) -> Command {
        let mut command = Command::new(self.program());
        command.args(self.command_line.iter().skip(1));
        command.arg("--yes");
        if cipher.is_armored() {
            command.arg("--armor");
        }
        command
    }

    fn run(&self, command: Command, input: Option<&[u8]>) -> Result<Vec<u8>> {
        let output = process::run(command, input, self.verbose)
            .with_context(|| format!("failed to run {}", self.program()))?;
        process::check(self.program(), &output)?;
        Ok(output.stdout)
    }

    /// Decrypts `encrypted` into the file at `decrypted`.
    #[inline]
    pub fn decrypt_to(&self, encrypted: &Path, decrypted: &Path, cipher: CipherSuffix) -> Result<()> {
        debug!("decrypting {} to {}", encrypted.display(), decrypted.display());
        if let Some(parent) = decrypted.parent() {
            if !parent.as_os_str().is_empty() && !parent.try_exists()? {
                if !self.create_parents {
                    bail!("directory {} does not exist", parent.display());
                }
                fs::create_dir_all(parent)?;
            }
        }
        let mut command = self.command(cipher);
        command
            .arg("--output")
            .arg(decrypted)
            .arg("--decrypt")
            .arg(encrypted);
        self.run(command, None)?;
        Ok(())
    }

    /// Decrypts `encrypted` into memory.
    #[inline]
    pub fn contents(&self, encrypted: &Path, cipher: CipherSuffix) -> Result<Vec<u8>> {
        debug!("reading contents of {}", encrypted.display());
        let mut command = self.command(cipher);
        command.arg("--decrypt").arg(encrypted);
        self.run(command, None)
    }

    /// Encrypts `plaintext` for `recipients` into the file at `output`.
    #[inline]
    pub fn encrypt_bytes(
        &self,
        output: &Path,
        plaintext: &[u8],
        cipher: CipherSuffix,
        recipients: &[String],
    ) -> Result<()> {
        debug!("encrypting {}", output.display());
        let mut command = self.encrypt_command(output, cipher, recipients)?;
        command.arg("--encrypt");
        self.run(command, Some(plaintext))?;
        Ok(())
    }

    /// Encrypts the file at `input` for `recipients` into the file at `output`.
    #[inline]
    pub fn encrypt_file(
        &self,
        output: &Path,
        input: &Path,
        cipher: CipherSuffix,
        recipients: &[String],
    ) -> Result<()> {
        debug!("encrypting {} to {}", input.display(), output.display());
        let mut command = self.encrypt_command(output, cipher, recipients)?;
        command.arg("--encrypt").arg(input);
        self.run(command, None)?;
        Ok(())
    }

    fn encrypt_command(
        &self,
        output: &Path,
        cipher: CipherSuffix,
        recipients: &[String],
    ) -> Result<Command> {
        if recipients.is_empty() {
            bail!("no recipients given to encrypt {} for", output.display());
        }
        let mut command = self.command(cipher);
        for recipient in recipients {
            command.arg("--recipient").arg(OsStr::new(recipient));
        }
        command.arg("--output").arg(output);
        Ok(command)
    }
}
