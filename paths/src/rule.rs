use {
    crate::{
        CipherSuffix, DECRYPTED_MARKER, DIRECTORY_MARKER, ENCRYPTED_MARKER, Layout,
        PathShapeError, SecretPaths, is_marked_directory, name::FileName,
    },
    std::{
        ffi::OsStr,
        path::{Component, Path, PathBuf},
    },
};

fn file_name(path: &Path) -> Option<FileName> {
    path.file_name()
        .and_then(OsStr::to_str)
        .map(FileName::parse)
}

fn parent(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// Indexes of the components of `dir` named `<name>.encrypted`.
fn marked_components(dir: &Path) -> impl Iterator<Item = usize> + '_ {
    dir.components()
        .enumerate()
        .filter_map(|(index, component)| match component {
            Component::Normal(name) if name.to_str().is_some_and(is_marked_directory) => {
                Some(index)
            }
            _ => None,
        })
}

/// True if the file name ends in `.asc` or `.gpg`.
#[must_use]
#[inline]
pub fn has_cipher_suffix(path: &Path) -> bool {
    file_name(path).is_some_and(|name| name.cipher().is_some())
}

/// True if the file name carries the `encrypted` token or one of its parent
/// directories is named `<name>.encrypted`.
#[must_use]
#[inline]
pub fn has_marker(path: &Path) -> bool {
    file_name(path).is_some_and(|name| name.count(ENCRYPTED_MARKER) > 0)
        || marked_components(parent(path)).next().is_some()
}

/// Computes the plaintext path of an encrypted secret.
#[inline]
pub fn map_encrypted_to_decrypted(path: &Path) -> Result<PathBuf, PathShapeError> {
    resolve(path).map(|paths| paths.decrypted)
}

/// Computes the plaintext path of an encrypted secret and records the layout
/// it was found in.
///
/// The cipher suffix is stripped first. A `<name>.encrypted` parent directory
/// loses its marker; the file name then has its `encrypted` token replaced by
/// `decrypted`, or gets `decrypted` inserted before its last extension if it
/// has no token. Outside a marked directory the token is required.
#[inline]
pub fn resolve(path: &Path) -> Result<SecretPaths, PathShapeError> {
    let mut name =
        file_name(path).ok_or_else(|| PathShapeError::UnrecognizedPathShape(path.into()))?;
    let cipher = name
        .pop_cipher()
        .ok_or_else(|| PathShapeError::MissingCipherSuffix(path.into()))?;
    if name.has_cipher_token() {
        return Err(PathShapeError::ambiguous(path, "more than one cipher suffix"));
    }
    if name.count(DECRYPTED_MARKER) > 0 {
        return Err(PathShapeError::ambiguous(
            path,
            "file name already carries a `decrypted` marker",
        ));
    }
    let name_marker = match name.count(ENCRYPTED_MARKER) {
        0 => false,
        1 => true,
        _ => {
            return Err(PathShapeError::ambiguous(
                path,
                "more than one `encrypted` token in the file name",
            ));
        }
    };

    let parent = parent(path);
    let marked: Vec<usize> = marked_components(parent).collect();
    let (layout, directory) = match *marked.as_slice() {
        [] if name_marker => (Layout::Name, parent.to_path_buf()),
        [] => return Err(PathShapeError::UnrecognizedPathShape(path.into())),
        [index] => {
            let depth = parent.components().skip(index.saturating_add(1)).count();
            (
                Layout::Directory { depth, name_marker },
                unmark_directory(parent, index),
            )
        }
        _ => {
            return Err(PathShapeError::ambiguous(
                path,
                "more than one `<name>.encrypted` directory",
            ));
        }
    };

    if name_marker {
        name.replace(ENCRYPTED_MARKER, DECRYPTED_MARKER);
    } else {
        name.insert_before_last(DECRYPTED_MARKER);
    }

    Ok(SecretPaths {
        encrypted: path.to_path_buf(),
        decrypted: directory.join(name.to_string()),
        layout,
        cipher,
    })
}

/// Derives the encrypted path that decrypts to `decrypted` under `layout`.
///
/// This is the inverse of [`resolve`]: resolving the returned path yields
/// `decrypted` again.
#[inline]
pub fn encrypted_path(
    decrypted: &Path,
    layout: Layout,
    cipher: CipherSuffix,
) -> Result<PathBuf, PathShapeError> {
    let mut name = file_name(decrypted)
        .ok_or_else(|| PathShapeError::invalid(decrypted, "path has no UTF-8 file name"))?;
    if name.has_cipher_token() {
        return Err(PathShapeError::invalid(
            decrypted,
            "path already carries a cipher suffix",
        ));
    }
    if name.count(ENCRYPTED_MARKER) > 0 {
        return Err(PathShapeError::invalid(
            decrypted,
            "file name carries an `encrypted` token",
        ));
    }
    let Some(position) = name.position(DECRYPTED_MARKER) else {
        return Err(PathShapeError::invalid(
            decrypted,
            "file name has no `decrypted` marker",
        ));
    };
    if name.count(DECRYPTED_MARKER) > 1 {
        return Err(PathShapeError::invalid(
            decrypted,
            "more than one `decrypted` marker",
        ));
    }
    let parent = parent(decrypted);
    if marked_components(parent).next().is_some() {
        return Err(PathShapeError::invalid(
            decrypted,
            "a parent directory already carries the `.encrypted` marker",
        ));
    }

    let directory = match layout {
        Layout::Name => {
            name.replace(DECRYPTED_MARKER, ENCRYPTED_MARKER);
            parent.to_path_buf()
        }
        Layout::Directory { depth, name_marker } => {
            if name_marker {
                name.replace(DECRYPTED_MARKER, ENCRYPTED_MARKER);
            } else {
                let before_extension = position.saturating_add(2) == name.len();
                let only_suffix = position == 0 && name.len() == 1;
                if !before_extension && !only_suffix {
                    return Err(PathShapeError::invalid(
                        decrypted,
                        "`decrypted` marker is not directly before the extension",
                    ));
                }
                name.remove(position);
            }
            mark_directory(parent, depth).ok_or_else(|| {
                PathShapeError::invalid(decrypted, "not enough parent directories to mark")
            })?
        }
    };

    name.push(cipher.extension());
    Ok(directory.join(name.to_string()))
}

fn unmark_directory(dir: &Path, index: usize) -> PathBuf {
    dir.components()
        .enumerate()
        .map(|(i, component)| {
            let os_name = component.as_os_str();
            if i == index {
                os_name
                    .to_str()
                    .and_then(|name| name.strip_suffix(DIRECTORY_MARKER))
                    .map_or(os_name, OsStr::new)
            } else {
                os_name
            }
        })
        .collect()
}

fn mark_directory(dir: &Path, depth: usize) -> Option<PathBuf> {
    let components: Vec<Component<'_>> = dir.components().collect();
    let index = components.len().checked_sub(depth)?.checked_sub(1)?;
    let Some(Component::Normal(target)) = components.get(index) else {
        return None;
    };
    let mut marked = target.to_os_string();
    marked.push(DIRECTORY_MARKER);
    Some(
        components
            .iter()
            .enumerate()
            .map(|(i, component)| {
                if i == index {
                    marked.as_os_str()
                } else {
                    component.as_os_str()
                }
            })
            .collect(),
    )
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test")]
mod tests {
    use super::*;

    fn decrypted(path: &str) -> PathBuf {
        map_encrypted_to_decrypted(Path::new(path)).unwrap()
    }

    fn error(path: &str) -> PathShapeError {
        map_encrypted_to_decrypted(Path::new(path)).unwrap_err()
    }

    #[test]
    fn marker_in_file_name() {
        assert_eq!(
            decrypted("one.encrypted.json.asc"),
            Path::new("one.decrypted.json")
        );
        assert_eq!(
            decrypted("config/example-1.encrypted.json.gpg"),
            Path::new("config/example-1.decrypted.json")
        );
        assert_eq!(
            decrypted("/srv/app/secret.encrypted.gpg"),
            Path::new("/srv/app/secret.decrypted")
        );
    }

    #[test]
    fn marker_in_directory() {
        assert_eq!(
            decrypted("directory.encrypted/two.json.gpg"),
            Path::new("directory/two.decrypted.json")
        );
        assert_eq!(
            decrypted("a/files.encrypted/example-2.json.asc"),
            Path::new("a/files/example-2.decrypted.json")
        );
        assert_eq!(
            decrypted("directory.encrypted/README.gpg"),
            Path::new("directory/README.decrypted")
        );
        assert_eq!(
            decrypted("directory.encrypted/archive.tar.gz.gpg"),
            Path::new("directory/archive.tar.decrypted.gz")
        );
    }

    #[test]
    fn marker_in_directory_and_file_name() {
        assert_eq!(
            decrypted("directory.encrypted/three.encrypted.json.gpg"),
            Path::new("directory/three.decrypted.json")
        );
    }

    #[test]
    fn nested_directory_keeps_structure() {
        let paths = resolve(Path::new("root/files.encrypted/nested/deeper/key.pem.asc")).unwrap();
        assert_eq!(
            paths.decrypted,
            Path::new("root/files/nested/deeper/key.decrypted.pem")
        );
        assert_eq!(
            paths.layout,
            Layout::Directory {
                depth: 2,
                name_marker: false
            }
        );
        assert_eq!(paths.cipher, CipherSuffix::Asc);
    }

    #[test]
    fn hidden_files() {
        assert_eq!(decrypted(".env.encrypted.gpg"), Path::new(".env.decrypted"));
        assert_eq!(
            decrypted("secrets.encrypted/.env.asc"),
            Path::new("secrets/.env.decrypted")
        );
    }

    #[test]
    fn records_layout_and_cipher() {
        let paths = resolve(Path::new("one.encrypted.json.asc")).unwrap();
        assert_eq!(paths.layout, Layout::Name);
        assert_eq!(paths.cipher, CipherSuffix::Asc);
        assert_eq!(paths.encrypted, Path::new("one.encrypted.json.asc"));

        let paths = resolve(Path::new("directory.encrypted/three.encrypted.json.gpg")).unwrap();
        assert_eq!(
            paths.layout,
            Layout::Directory {
                depth: 0,
                name_marker: true
            }
        );
        assert_eq!(paths.cipher, CipherSuffix::Gpg);
    }

    #[test]
    fn missing_cipher_suffix() {
        assert_eq!(
            error("one.encrypted.json"),
            PathShapeError::MissingCipherSuffix("one.encrypted.json".into())
        );
        assert!(!has_cipher_suffix(Path::new("one.encrypted.json")));
        assert!(has_cipher_suffix(Path::new("one.encrypted.json.gpg")));
    }

    #[test]
    fn unrecognized_shape() {
        for path in [
            "plain.json.gpg",
            "dir/plain.json.asc",
            "encrypted.json.gpg",
            ".encrypted/file.json.gpg",
            "dir.encrypted.old/file.json.gpg",
        ] {
            assert_eq!(
                error(path),
                PathShapeError::UnrecognizedPathShape(path.into()),
                "{path}"
            );
        }
    }

    #[test]
    fn ambiguous_shapes() {
        for path in [
            "one.encrypted.json.asc.gpg",
            "one.encrypted.gpg.gpg",
            "x.gpg.encrypted.json.asc",
            "d.encrypted/x.asc.json.gpg",
            "one.encrypted.encrypted.json.gpg",
            "one.decrypted.encrypted.json.gpg",
            "a.encrypted/b.encrypted/file.json.gpg",
        ] {
            assert!(
                matches!(error(path), PathShapeError::AmbiguousPathShape { .. }),
                "{path}"
            );
        }
    }

    #[test]
    fn markers() {
        assert!(has_marker(Path::new("one.encrypted.json.asc")));
        assert!(has_marker(Path::new("d.encrypted/one.json.asc")));
        assert!(has_marker(Path::new("d.encrypted/x/one.json")));
        assert!(!has_marker(Path::new("d/one.json.asc")));
    }

    #[test]
    fn inverse_of_each_layout() {
        let cases = [
            ("one.encrypted.json.asc", "one.decrypted.json"),
            ("directory.encrypted/two.json.gpg", "directory/two.decrypted.json"),
            (
                "directory.encrypted/three.encrypted.json.gpg",
                "directory/three.decrypted.json",
            ),
            ("d.encrypted/README.gpg", "d/README.decrypted"),
            ("x/d.encrypted/a/b/key.pem.asc", "x/d/a/b/key.decrypted.pem"),
            (".env.encrypted.gpg", ".env.decrypted"),
        ];
        for (encrypted, plaintext) in cases {
            let paths = resolve(Path::new(encrypted)).unwrap();
            assert_eq!(paths.decrypted, Path::new(plaintext));
            let derived = encrypted_path(&paths.decrypted, paths.layout, paths.cipher).unwrap();
            assert_eq!(derived, Path::new(encrypted));
            assert_eq!(map_encrypted_to_decrypted(&derived).unwrap(), paths.decrypted);
        }
    }

    #[test]
    fn inverse_from_plaintext() {
        let name = encrypted_path(
            Path::new("config/db.decrypted.yaml"),
            Layout::Name,
            CipherSuffix::Gpg,
        )
        .unwrap();
        assert_eq!(name, Path::new("config/db.encrypted.yaml.gpg"));

        let directory = encrypted_path(
            Path::new("config/db.decrypted.yaml"),
            Layout::Directory {
                depth: 0,
                name_marker: false,
            },
            CipherSuffix::Asc,
        )
        .unwrap();
        assert_eq!(directory, Path::new("config.encrypted/db.yaml.asc"));
        assert_eq!(
            map_encrypted_to_decrypted(&directory).unwrap(),
            Path::new("config/db.decrypted.yaml")
        );
    }

    #[test]
    fn inverse_rejects_foreign_shapes() {
        let directory = Layout::Directory {
            depth: 0,
            name_marker: false,
        };
        for (path, layout) in [
            ("config/db.yaml", Layout::Name),
            ("config/db.decrypted.yaml.gpg", Layout::Name),
            ("config/db.gpg.decrypted.yaml", Layout::Name),
            ("config/db.decrypted.decrypted.yaml", Layout::Name),
            ("config/db.encrypted.decrypted.yaml", Layout::Name),
            ("c.encrypted/db.decrypted.yaml", Layout::Name),
            ("config/db.yaml.decrypted", directory),
            ("db.decrypted.yaml", directory),
            (
                "config/db.decrypted.yaml",
                Layout::Directory {
                    depth: 3,
                    name_marker: false,
                },
            ),
        ] {
            assert!(
                matches!(
                    encrypted_path(Path::new(path), layout, CipherSuffix::Gpg),
                    Err(PathShapeError::InvalidDecryptedPath { .. })
                ),
                "{path}"
            );
        }
    }
}
