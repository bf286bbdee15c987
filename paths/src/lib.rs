//! Path rules connecting GPG-encrypted secrets to the plaintext files they
//! decrypt to.
//!
//! Two shapes of encrypted path are recognized:
//!
//! - `name.encrypted.ext.asc` decrypts to `name.decrypted.ext`;
//! - `dir.encrypted/name.ext.gpg` decrypts to `dir/name.decrypted.ext`, and
//!   `dir.encrypted/name.encrypted.ext.gpg` decrypts to the same path.
//!
//! Suffixes are matched lexically on the file name. Nothing here touches the
//! file system.

mod error;
mod name;
mod rule;

pub use crate::{
    error::PathShapeError,
    rule::{encrypted_path, has_cipher_suffix, has_marker, map_encrypted_to_decrypted, resolve},
};

use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Suffix token marking an encrypted file or directory.
pub const ENCRYPTED_MARKER: &str = "encrypted";

/// Suffix token marking a plaintext file.
pub const DECRYPTED_MARKER: &str = "decrypted";

/// Extension that turns a directory into an encrypted directory.
pub const DIRECTORY_MARKER: &str = ".encrypted";

/// Returns true if a directory name has the form `<name>.encrypted`.
#[must_use]
#[inline]
pub fn is_marked_directory(name: &str) -> bool {
    name.strip_suffix(DIRECTORY_MARKER)
        .is_some_and(|rest| !rest.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CipherSuffix {
    /// `.asc`, ASCII-armored output.
    Asc,
    /// `.gpg`, binary output.
    Gpg,
}

impl CipherSuffix {
    #[must_use]
    #[inline]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "asc" => Some(Self::Asc),
            "gpg" => Some(Self::Gpg),
            _ => None,
        }
    }

    #[must_use]
    #[inline]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
    }

    #[must_use]
    #[inline]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Gpg => "gpg",
        }
    }

    /// Whether gpg should be asked for `--armor` output.
    #[must_use]
    #[inline]
    pub fn is_armored(self) -> bool {
        self == Self::Asc
    }
}

impl fmt::Display for CipherSuffix {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// Where the `encrypted` marker of a secret was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// `name.encrypted.ext.asc`
    Name,
    /// A file inside a `<name>.encrypted` directory.
    Directory {
        /// Directories between the marked directory and the file; zero when
        /// the marked directory is the immediate parent.
        depth: usize,
        /// The file name also carries the `encrypted` token.
        name_marker: bool,
    },
}

/// An encrypted path together with the plaintext path it decrypts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretPaths {
    pub encrypted: PathBuf,
    pub decrypted: PathBuf,
    pub layout: Layout,
    pub cipher: CipherSuffix,
}
