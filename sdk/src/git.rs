use {
    crate::process,
    anyhow::{Context as _, Result},
    itertools::Itertools,
    std::{
        collections::HashSet,
        io,
        path::{Path, PathBuf},
        process::Command,
    },
    tracing::{debug, warn},
};

/// Finds the working tree root of the git repository containing `start`.
#[must_use]
#[inline]
pub fn find_repository_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Returns the paths that `.gitignore` rules in `root` do not exclude.
///
/// Runs `git check-ignore` with NUL-separated paths, so names are never
/// quoted. If git is not installed nothing is reported.
#[inline]
pub fn unignored_paths(root: &Path, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }
    let input = paths
        .iter()
        .map(|path| path.to_string_lossy())
        .join("\0");
    let mut command = Command::new("git");
    command
        .args(["check-ignore", "-z", "--stdin"])
        .current_dir(root);
    let output = match process::run(command, Some(input.as_bytes()), false) {
        Ok(output) => output,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("git is not installed, skipping the .gitignore check");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err).context("failed to run git check-ignore"),
    };
    // Exit code 1 means that none of the paths are ignored.
    if output.status.code() != Some(1) {
        process::check("git check-ignore", &output)?;
    }
    let stdout = String::from_utf8(output.stdout).context("git returned a non-UTF-8 path")?;
    let ignored: HashSet<&str> = stdout.split('\0').filter(|path| !path.is_empty()).collect();
    debug!("{} of {} paths are ignored by git", ignored.len(), paths.len());
    let unignored = paths
        .iter()
        .filter(|path| !ignored.contains(path.to_string_lossy().as_ref()))
        .cloned()
        .collect_vec();
    Ok(unignored)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test")]
mod tests {
    use {super::*, fs_err as fs, tempfile::TempDir};

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    #[test]
    fn finds_root_from_nested_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_repository_root(&nested), None);

        fs::create_dir(dir.path().join(".git")).unwrap();
        assert_eq!(find_repository_root(&nested).unwrap(), dir.path());
    }

    #[test]
    fn reports_paths_not_ignored() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        let status = Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(&root)
            .status()
            .unwrap();
        assert!(status.success());
        fs::write(root.join(".gitignore"), "*.decrypted.*\n").unwrap();

        let ignored = root.join("one.decrypted.json");
        let tracked = root.join("directory/two.json");
        let result = unignored_paths(&root, &[ignored, tracked.clone()]).unwrap();
        assert_eq!(result, [tracked]);

        let none_ignored = root.join("three.json");
        let result = unignored_paths(&root, &[none_ignored.clone()]).unwrap();
        assert_eq!(result, [none_ignored]);
    }

    #[test]
    fn non_ascii_names_are_matched() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        let status = Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(&root)
            .status()
            .unwrap();
        assert!(status.success());
        fs::write(root.join(".gitignore"), "*.decrypted.*\n").unwrap();

        let ignored = root.join("ключ.decrypted.json");
        let spaced = root.join("with space \"quoted\".decrypted.txt");
        let tracked = root.join("café.json");
        let result = unignored_paths(&root, &[ignored, spaced, tracked.clone()]).unwrap();
        assert_eq!(result, [tracked]);
    }

    #[test]
    fn outside_repository_is_an_error() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        if find_repository_root(&root).is_some() {
            return;
        }
        unignored_paths(&root, &[root.join("a.decrypted.json")]).unwrap_err();
    }
}
