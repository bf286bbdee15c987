use {
    anyhow::{Context as _, Result},
    fidelius_paths::{SecretPaths, has_cipher_suffix, has_marker, resolve},
    itertools::Itertools,
    std::path::{Path, PathBuf},
    tracing::{debug, error, info, warn},
    walkdir::WalkDir,
};

/// Finds every encrypted secret below `root`.
///
/// Selects files inside `<name>.encrypted` directories and files carrying the
/// `encrypted` token. Files the path rules reject are skipped with a warning.
/// Secrets that would decrypt to the same plaintext are reported and left out.
/// Returned paths are `root` joined with the relative path found.
#[inline]
pub fn search(root: &Path) -> Result<Vec<SecretPaths>> {
    info!("searching for encrypted files in {}", root.display());
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to search {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root)?;
        if !has_marker(relative) {
            continue;
        }
        if !has_cipher_suffix(relative) {
            warn!(
                "skipping {}: encrypted files must end with `.asc` or `.gpg`",
                relative.display()
            );
            continue;
        }
        match resolve(relative) {
            Ok(paths) => found.push(SecretPaths {
                encrypted: root.join(&paths.encrypted),
                decrypted: root.join(&paths.decrypted),
                ..paths
            }),
            Err(err) => warn!("skipping {err}"),
        }
    }

    let by_plaintext = found
        .into_iter()
        .into_group_map_by(|paths| paths.decrypted.clone());
    let mut secrets = Vec::new();
    for (decrypted, mut group) in by_plaintext {
        if group.len() == 1 {
            secrets.extend(group.pop());
        } else {
            error!(
                "{} secrets decrypt to {}, skipping all of them: {}",
                group.len(),
                decrypted.display(),
                group.iter().map(|paths| paths.encrypted.display()).join(", ")
            );
        }
    }
    secrets.sort_by(|a, b| a.encrypted.cmp(&b.encrypted));
    debug!("found {} encrypted files in {}", secrets.len(), root.display());
    Ok(secrets)
}

/// Paths of every plaintext file of `secrets`.
#[inline]
pub fn decrypted_paths<'a>(secrets: impl IntoIterator<Item = &'a SecretPaths>) -> Vec<PathBuf> {
    secrets
        .into_iter()
        .map(|paths| paths.decrypted.clone())
        .collect()
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test")]
mod tests {
    use {super::*, fidelius_paths::Layout, fs_err as fs, tempfile::TempDir};

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn relative_pairs(root: &Path, secrets: &[SecretPaths]) -> Vec<(String, String)> {
        secrets
            .iter()
            .map(|paths| {
                (
                    paths.encrypted.strip_prefix(root).unwrap().display().to_string(),
                    paths.decrypted.strip_prefix(root).unwrap().display().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn finds_both_layouts() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "one.encrypted.json.asc");
        touch(root, "one.decrypted.json");
        touch(root, "directory.encrypted/two.json.gpg");
        touch(root, "directory.encrypted/three.encrypted.json.gpg");
        touch(root, "directory.encrypted/nested/four.txt.asc");
        touch(root, "plain/notes.txt");
        touch(root, ".git/config.encrypted.gpg");

        let secrets = search(root).unwrap();
        assert_eq!(
            relative_pairs(root, &secrets),
            [
                ("directory.encrypted/nested/four.txt.asc", "directory/nested/four.decrypted.txt"),
                ("directory.encrypted/three.encrypted.json.gpg", "directory/three.decrypted.json"),
                ("directory.encrypted/two.json.gpg", "directory/two.decrypted.json"),
                ("one.encrypted.json.asc", "one.decrypted.json"),
            ]
            .map(|(a, b)| (a.to_owned(), b.to_owned()))
        );
        assert_eq!(
            secrets[0].layout,
            Layout::Directory {
                depth: 1,
                name_marker: false
            }
        );
    }

    #[test]
    fn skips_files_without_cipher_suffix_or_with_bad_shape() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "directory.encrypted/README.md");
        touch(root, "notes.encrypted.md");
        touch(root, "double.encrypted.encrypted.json.gpg");
        touch(root, "good.encrypted.gpg");

        let secrets = search(root).unwrap();
        assert_eq!(
            relative_pairs(root, &secrets),
            [("good.encrypted.gpg".to_owned(), "good.decrypted".to_owned())]
        );
    }

    #[test]
    fn colliding_secrets_are_left_out() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "d.encrypted/a.json.gpg");
        touch(root, "d.encrypted/a.encrypted.json.asc");
        touch(root, "d.encrypted/b.json.gpg");

        let secrets = search(root).unwrap();
        assert_eq!(
            relative_pairs(root, &secrets),
            [("d.encrypted/b.json.gpg".to_owned(), "d/b.decrypted.json".to_owned())]
        );
        assert_eq!(decrypted_paths(&secrets), [root.join("d/b.decrypted.json")]);
    }
}
