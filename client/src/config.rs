use {
    anyhow::{Context as _, Result},
    fs_err as fs,
    serde::Deserialize,
    std::path::{Path, PathBuf},
    tracing::debug,
};

/// Name of the config file looked up in the searched directory.
pub const LOCAL_CONFIG_NAME: &str = ".fidelius.json5";

/// Name of the config file looked up in the user config directory.
pub const USER_CONFIG_NAME: &str = "fidelius.json5";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Used when no recipients are given on the command line or in the environment.
    pub recipients: Vec<String>,
    /// Command line used instead of `gpg`.
    pub gpg_program: Option<String>,
    pub create_parents: bool,
    pub check_gitignore: bool,
    pub editor: Option<String>,
    pub pager: Option<String>,
    pub log_filter: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            gpg_program: None,
            create_parents: true,
            check_gitignore: true,
            editor: None,
            pager: None,
            log_filter: None,
            log_file: None,
        }
    }
}

impl Config {
    #[inline]
    pub fn parse(text: &str) -> Result<Self> {
        Ok(json5::from_str(text)?)
    }

    #[inline]
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Loads `explicit` if given, otherwise the first config file found in
    /// `root` or the user config directory. Defaults apply if there is none.
    #[inline]
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidates = [
            Some(root.join(LOCAL_CONFIG_NAME)),
            dirs::config_dir().map(|dir| dir.join(USER_CONFIG_NAME)),
        ];
        for path in candidates.into_iter().flatten() {
            if path.try_exists()? {
                debug!("using config file {}", path.display());
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }
}
