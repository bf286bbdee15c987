use {crate::CipherSuffix, std::fmt};

/// A file name split lexically on `.` into a base name and its suffix tokens.
///
/// A leading dot belongs to the base name, so `.env.encrypted` has the base
/// `.env` and a single `encrypted` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileName {
    base: String,
    suffixes: Vec<String>,
}

impl FileName {
    pub(crate) fn parse(name: &str) -> Self {
        let (hidden, rest) = match name.strip_prefix('.') {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        let mut tokens = rest.split('.');
        let first = tokens.next().unwrap_or_default();
        let base = if hidden {
            format!(".{first}")
        } else {
            first.to_owned()
        };
        Self {
            base,
            suffixes: tokens.map(str::to_owned).collect(),
        }
    }

    pub(crate) fn cipher(&self) -> Option<CipherSuffix> {
        self.suffixes
            .last()
            .and_then(|last| CipherSuffix::from_extension(last))
    }

    /// Removes the trailing cipher suffix, if there is one.
    pub(crate) fn pop_cipher(&mut self) -> Option<CipherSuffix> {
        let cipher = self.cipher()?;
        self.suffixes.pop();
        Some(cipher)
    }

    /// True if any suffix, not only the last one, is `asc` or `gpg`.
    pub(crate) fn has_cipher_token(&self) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| CipherSuffix::from_extension(suffix).is_some())
    }

    pub(crate) fn push(&mut self, suffix: &str) {
        self.suffixes.push(suffix.to_owned());
    }

    pub(crate) fn count(&self, token: &str) -> usize {
        self.suffixes.iter().filter(|s| *s == token).count()
    }

    pub(crate) fn position(&self, token: &str) -> Option<usize> {
        self.suffixes.iter().position(|s| s == token)
    }

    pub(crate) fn len(&self) -> usize {
        self.suffixes.len()
    }

    pub(crate) fn replace(&mut self, from: &str, to: &str) {
        for suffix in &mut self.suffixes {
            if suffix == from {
                to.clone_into(suffix);
            }
        }
    }

    /// Inserts `token` before the final suffix, or appends it when there is none.
    pub(crate) fn insert_before_last(&mut self, token: &str) {
        let index = self.suffixes.len().saturating_sub(1);
        self.suffixes.insert(index, token.to_owned());
    }

    pub(crate) fn remove(&mut self, index: usize) {
        self.suffixes.remove(index);
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for suffix in &self.suffixes {
            write!(f, ".{suffix}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_dots() {
        let name = FileName::parse("one.encrypted.json.asc");
        assert_eq!(name.base, "one");
        assert_eq!(name.suffixes, ["encrypted", "json", "asc"]);
        assert_eq!(name.to_string(), "one.encrypted.json.asc");
    }

    #[test]
    fn hidden_file_keeps_leading_dot() {
        let name = FileName::parse(".env.encrypted.gpg");
        assert_eq!(name.base, ".env");
        assert_eq!(name.suffixes, ["encrypted", "gpg"]);
        assert_eq!(name.to_string(), ".env.encrypted.gpg");
    }

    #[test]
    fn cipher_tokens_anywhere() {
        assert!(FileName::parse("x.gpg.encrypted.json").has_cipher_token());
        assert!(FileName::parse("x.encrypted.asc").has_cipher_token());
        assert!(!FileName::parse("gpg.encrypted.json").has_cipher_token());
        assert!(!FileName::parse("x.gpgx.json").has_cipher_token());
    }

    #[test]
    fn insert_without_extension_appends() {
        let mut name = FileName::parse("README");
        name.insert_before_last("decrypted");
        assert_eq!(name.to_string(), "README.decrypted");

        let mut name = FileName::parse("two.json");
        name.insert_before_last("decrypted");
        assert_eq!(name.to_string(), "two.decrypted.json");
    }
}
