use {std::path::PathBuf, thiserror::Error};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathShapeError {
    #[error("{} does not end with `.asc` or `.gpg`", .0.display())]
    MissingCipherSuffix(PathBuf),
    #[error(
        "unrecognized path shape: {} (expected `<name>.encrypted.<ext>.<asc|gpg>` \
        or a file inside a `<name>.encrypted/` directory)",
        .0.display()
    )]
    UnrecognizedPathShape(PathBuf),
    #[error("ambiguous path shape: {}: {reason}", path.display())]
    AmbiguousPathShape { path: PathBuf, reason: &'static str },
    #[error("cannot derive an encrypted path from {}: {reason}", path.display())]
    InvalidDecryptedPath { path: PathBuf, reason: &'static str },
}

impl PathShapeError {
    pub(crate) fn ambiguous(path: impl Into<PathBuf>, reason: &'static str) -> Self {
        Self::AmbiguousPathShape {
            path: path.into(),
            reason,
        }
    }

    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: &'static str) -> Self {
        Self::InvalidDecryptedPath {
            path: path.into(),
            reason,
        }
    }
}
