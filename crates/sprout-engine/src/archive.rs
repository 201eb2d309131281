//! Archive extraction with path validation.
//!
//! Package archives are gzipped tarballs. Entry paths are validated so a
//! hostile archive cannot write outside the destination directory, either
//! through `..`/absolute paths or through escaping symlink targets.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use sprout_core::error::SproutError;

use crate::EngineResult;

/// Extract a gzipped tarball for `package` into `dest_dir`
pub fn extract_archive<R: Read>(package: &str, reader: R, dest_dir: &Path) -> EngineResult<()> {
    let gz_decoder = GzDecoder::new(reader);
    let mut archive = Archive::new(gz_decoder);

    fs::create_dir_all(dest_dir)
        .map_err(|e| SproutError::io("Failed to create extraction directory".to_string(), e))?;

    let entries = archive.entries().map_err(|e| SproutError::Install {
        package: package.to_string(),
        message: format!("extract failed: unreadable archive: {}", e),
    })?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| SproutError::Install {
            package: package.to_string(),
            message: format!("extract failed: corrupt entry: {}", e),
        })?;

        let entry_path = entry.path().map_err(|e| SproutError::Install {
            package: package.to_string(),
            message: format!("extract failed: invalid entry path: {}", e),
        })?;
        let safe_path = validate_extract_path(package, &entry_path, dest_dir)?;

        let entry_type = entry.header().entry_type();
        let mode = entry.header().mode().ok();

        match entry_type {
            tar::EntryType::Regular => {
                extract_regular_file(package, &mut entry, &safe_path)?;
            },
            tar::EntryType::Directory => {
                fs::create_dir_all(&safe_path)
                    .map_err(|e| SproutError::io("Failed to create directory".to_string(), e))?;
            },
            tar::EntryType::Symlink | tar::EntryType::Link => {
                extract_symlink(package, &mut entry, &safe_path, dest_dir)?;
            },
            // Skip device nodes, fifos, and other special entries
            _ => continue,
        }

        if let Some(mode) = mode {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if safe_path.exists() {
                    let permissions = fs::Permissions::from_mode(mode);
                    let _ = fs::set_permissions(&safe_path, permissions);
                }
            }
        }
    }

    Ok(())
}

/// Reject entry paths that would land outside `dest_dir`
fn validate_extract_path(
    package: &str,
    entry_path: &Path,
    dest_dir: &Path,
) -> EngineResult<PathBuf> {
    let mut safe_path = dest_dir.to_path_buf();

    for component in entry_path.components() {
        match component {
            std::path::Component::Normal(name) => safe_path.push(name),
            std::path::Component::ParentDir => {
                return Err(SproutError::Install {
                    package: package.to_string(),
                    message: format!(
                        "extract failed: directory traversal in entry '{}'",
                        entry_path.display()
                    ),
                });
            },
            std::path::Component::RootDir => {
                return Err(SproutError::Install {
                    package: package.to_string(),
                    message: format!(
                        "extract failed: absolute entry path '{}'",
                        entry_path.display()
                    ),
                });
            },
            _ => continue,
        }
    }

    if !safe_path.starts_with(dest_dir) {
        return Err(SproutError::Install {
            package: package.to_string(),
            message: format!(
                "extract failed: entry escapes destination: '{}'",
                entry_path.display()
            ),
        });
    }

    Ok(safe_path)
}

fn extract_regular_file<R: Read>(
    package: &str,
    entry: &mut tar::Entry<R>,
    dest_path: &Path,
) -> EngineResult<()> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SproutError::io("Failed to create parent directory".to_string(), e))?;
    }

    let mut file = fs::File::create(dest_path)
        .map_err(|e| SproutError::io("Failed to create extracted file".to_string(), e))?;

    std::io::copy(entry, &mut file).map_err(|e| SproutError::Install {
        package: package.to_string(),
        message: format!("extract failed: write error: {}", e),
    })?;

    Ok(())
}

/// Create a symlink after checking the target stays inside `dest_dir`
fn extract_symlink<R: Read>(
    package: &str,
    entry: &mut tar::Entry<R>,
    dest_path: &Path,
    dest_dir: &Path,
) -> EngineResult<()> {
    let Ok(Some(target_path)) = entry.link_name() else {
        return Ok(());
    };

    if target_path.is_absolute() {
        return Err(SproutError::Install {
            package: package.to_string(),
            message: "extract failed: absolute symlink target".to_string(),
        });
    }

    // Containment check by walking components: `..` segments may not climb
    // above the destination root. A plain prefix comparison would pass
    // un-normalized targets like `dest/a/../../outside`.
    let mut depth = dest_path
        .parent()
        .and_then(|parent| parent.strip_prefix(dest_dir).ok())
        .map(|relative| relative.components().count() as i64)
        .unwrap_or(0);
    for component in target_path.components() {
        match component {
            std::path::Component::Normal(_) => depth += 1,
            std::path::Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return Err(SproutError::Install {
                        package: package.to_string(),
                        message: "extract failed: symlink target escapes destination".to_string(),
                    });
                }
            },
            _ => {},
        }
    }

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SproutError::io("Failed to create parent directory".to_string(), e))?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target_path, dest_path)
            .map_err(|e| SproutError::io("Failed to create symlink".to_string(), e))?;
    }
    #[cfg(windows)]
    {
        let _ = (dest_path, target_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;
    use tempfile::tempdir;

    fn tarball(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut data, Compression::default());
            let mut builder = Builder::new(encoder);
            for (path, content) in entries {
                let mut header = tar::Header::new_gnu();
                header.set_path(path).unwrap();
                header.set_size(content.len() as u64);
                header.set_cksum();
                builder.append(&header, content.as_bytes()).unwrap();
            }
            builder.finish().unwrap();
        }
        data
    }

    #[test]
    fn test_extract_files_and_directories() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("out");

        let data = tarball(&[
            ("package/index.js", "module.exports = {};"),
            ("package/lib/util.js", "exports.noop = () => {};"),
        ]);
        extract_archive("pkg", Cursor::new(data), &dest).unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("package/index.js")).unwrap(),
            "module.exports = {};"
        );
        assert!(dest.join("package/lib/util.js").exists());
    }

    #[test]
    fn test_parent_dir_entry_rejected() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("out");

        let result = validate_extract_path("pkg", Path::new("a/../../escape.txt"), &dest);
        assert!(matches!(result, Err(SproutError::Install { .. })));
    }

    #[test]
    fn test_absolute_entry_rejected() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("out");

        let result = validate_extract_path("pkg", Path::new("/etc/passwd"), &dest);
        assert!(matches!(result, Err(SproutError::Install { .. })));
    }

    #[test]
    fn test_corrupt_archive_is_install_error() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("out");

        let result = extract_archive("pkg", Cursor::new(b"definitely not gzip".to_vec()), &dest);
        assert!(matches!(result, Err(SproutError::Install { package, .. }) if package == "pkg"));
    }

    fn symlink_tarball(link_path: &str, link_target: &str) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut data, Compression::default());
            let mut builder = Builder::new(encoder);
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Symlink);
            header.set_path(link_path).unwrap();
            header.set_link_name(link_target).unwrap();
            header.set_size(0);
            header.set_cksum();
            builder.append(&header, std::io::empty()).unwrap();
            builder.finish().unwrap();
        }
        data
    }

    #[cfg(unix)]
    #[test]
    fn test_escaping_symlink_rejected() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("out");

        let data = symlink_tarball("package/link", "../../outside");
        let result = extract_archive("pkg", Cursor::new(data), &dest);
        assert!(matches!(result, Err(SproutError::Install { .. })));
        assert!(fs::symlink_metadata(dest.join("package/link")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_unnormalized_escaping_symlink_rejected() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("out");

        // Climbs back inside lexically before escaping for real.
        let data = symlink_tarball("package/link", "a/../../../outside");
        let result = extract_archive("pkg", Cursor::new(data), &dest);
        assert!(matches!(result, Err(SproutError::Install { .. })));
        assert!(fs::symlink_metadata(dest.join("package/link")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_internal_relative_symlink_allowed() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("out");

        let data = symlink_tarball("package/sub/link", "../data.txt");
        extract_archive("pkg", Cursor::new(data), &dest).unwrap();

        let meta = fs::symlink_metadata(dest.join("package/sub/link")).unwrap();
        assert!(meta.file_type().is_symlink());
    }
}
