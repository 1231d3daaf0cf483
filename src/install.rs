use crate::errors::SetupError;
use fs_err as fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// What extraction left behind. Per-file copy failures are collected rather
/// than raised so one corrupt member cannot block the rest of the install;
/// callers decide whether partial success is acceptable.
#[derive(Debug)]
pub struct InstallReport {
    pub target: PathBuf,
    pub files_installed: usize,
    pub skipped: Vec<(String, String)>,
}

/// Extract the contents of the archive's logical root directory into
/// `target_dir`, flattening `<root>/…` onto `target_dir/…`, then verify that
/// `marker` exists directly under `target_dir`.
pub fn install(
    archive: &[u8],
    target_dir: &Path,
    expected_root: &str,
    marker: &str,
) -> Result<InstallReport, SetupError> {
    fs::create_dir_all(target_dir)
        .map_err(|e| SetupError::Verification(format!("creating {}: {e}", target_dir.display())))?;

    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| SetupError::ArchiveFormat(e.to_string()))?;

    let names: Vec<String> = zip.file_names().map(str::to_owned).collect();
    let root = find_archive_root(&names, expected_root)?;
    let prefix = format!("{root}/");

    let mut files_installed = 0usize;
    let mut skipped = Vec::new();
    for i in 0..zip.len() {
        let mut member = match zip.by_index(i) {
            Ok(m) => m,
            Err(e) => {
                skipped.push((format!("#{i}"), e.to_string()));
                continue;
            }
        };
        let name = member.name().to_owned();
        if member.is_dir() || !name.starts_with(&prefix) {
            continue;
        }
        // enclosed_name rejects members that would escape the target dir.
        let enclosed = match member.enclosed_name().map(Path::to_path_buf) {
            Some(p) => p,
            None => {
                skipped.push((name, "unsafe member path".to_string()));
                continue;
            }
        };
        let rel = match enclosed.strip_prefix(&root) {
            Ok(r) => r.to_path_buf(),
            Err(_) => continue,
        };
        let dest = target_dir.join(rel);

        if let Err(e) = copy_member(&mut member, &dest) {
            log::warn!("extraction error on {name}: {e}");
            skipped.push((name, e.to_string()));
            continue;
        }
        files_installed += 1;
    }

    verify_marker(target_dir, marker)?;

    Ok(InstallReport {
        target: target_dir.to_path_buf(),
        files_installed,
        skipped,
    })
}

fn copy_member(member: &mut zip::read::ZipFile<'_>, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = fs::File::create(dest)?;
    std::io::copy(member, &mut out)?;
    Ok(())
}

/// Pick the archive's logical root: the expected directory name if present
/// among the top-level segments, otherwise the sole top-level directory.
/// Anything else is an ambiguous layout.
fn find_archive_root(names: &[String], expected_root: &str) -> Result<String, SetupError> {
    let mut top_level: Vec<String> = Vec::new();
    for name in names {
        let segment = match name.split_once('/') {
            Some((first, _)) => first,
            // A bare "root/" directory entry still names the root.
            None => name.trim_end_matches('/'),
        };
        if segment.is_empty() {
            continue;
        }
        if segment == expected_root {
            return Ok(expected_root.to_string());
        }
        if !top_level.iter().any(|s| s == segment) && name.contains('/') {
            top_level.push(segment.to_string());
        }
    }
    if top_level.len() == 1 {
        return Ok(top_level.remove(0));
    }
    Err(SetupError::ArchiveLayout(format!(
        "ambiguous archive layout: expected a '{expected_root}' directory, found {} top-level entries",
        top_level.len()
    )))
}

/// Post-extraction invariant: the marker file sits directly under the target
/// directory. The failure text distinguishes a missing directory from a
/// directory that exists but lacks the marker, listing any executable-looking
/// files actually present to aid troubleshooting.
fn verify_marker(target_dir: &Path, marker: &str) -> Result<(), SetupError> {
    if target_dir.join(marker).exists() {
        return Ok(());
    }
    if !target_dir.exists() {
        return Err(SetupError::Verification(format!(
            "target directory {} was not created or is inaccessible",
            target_dir.display()
        )));
    }
    let executables: Vec<String> = fs::read_dir(target_dir)
        .map_err(|e| SetupError::Verification(format!("reading {}: {e}", target_dir.display())))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| looks_executable(p))
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    if executables.is_empty() {
        Err(SetupError::Verification(format!(
            "{} exists but is missing the required file '{marker}'",
            target_dir.display()
        )))
    } else {
        Err(SetupError::Verification(format!(
            "'{marker}' not found in {}; found executables: {}",
            target_dir.display(),
            executables.join(", ")
        )))
    }
}

#[cfg(windows)]
fn looks_executable(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("exe"))
        .unwrap_or(false)
}

#[cfg(unix)]
fn looks_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn sole_top_level_dir_is_flattened_into_target() {
        let archive = build_zip(&[
            ("tools/", b""),
            ("tools/a.bin", b"alpha"),
            ("tools/sub/b.bin", b"beta"),
        ]);
        let target = tempfile::tempdir().unwrap();

        let report = install(&archive, target.path(), "platform-tools", "a.bin").unwrap();
        assert_eq!(report.files_installed, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(fs::read(target.path().join("a.bin")).unwrap(), b"alpha");
        assert_eq!(fs::read(target.path().join("sub/b.bin")).unwrap(), b"beta");
    }

    #[test]
    fn expected_root_wins_over_other_top_level_entries() {
        let archive = build_zip(&[
            ("platform-tools/adb", b"binary"),
            ("extras/readme.txt", b"docs"),
        ]);
        let target = tempfile::tempdir().unwrap();

        let report = install(&archive, target.path(), "platform-tools", "adb").unwrap();
        assert_eq!(report.files_installed, 1);
        assert!(target.path().join("adb").exists());
        assert!(!target.path().join("readme.txt").exists());
    }

    #[test]
    fn two_unrelated_roots_without_expected_is_ambiguous() {
        let archive = build_zip(&[("one/a", b"a"), ("two/b", b"b")]);
        let target = tempfile::tempdir().unwrap();

        let err = install(&archive, target.path(), "platform-tools", "a").unwrap_err();
        match err {
            SetupError::ArchiveLayout(msg) => assert!(msg.contains("ambiguous")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn install_is_idempotent() {
        let archive = build_zip(&[("tools/a.bin", b"alpha"), ("tools/sub/b.bin", b"beta")]);
        let target = tempfile::tempdir().unwrap();

        install(&archive, target.path(), "platform-tools", "a.bin").unwrap();
        let report = install(&archive, target.path(), "platform-tools", "a.bin").unwrap();
        assert_eq!(report.files_installed, 2);
        assert_eq!(fs::read(target.path().join("a.bin")).unwrap(), b"alpha");
        assert_eq!(fs::read(target.path().join("sub/b.bin")).unwrap(), b"beta");
    }

    #[test]
    fn missing_marker_fails_verification() {
        let archive = build_zip(&[("tools/other.bin", b"x")]);
        let target = tempfile::tempdir().unwrap();

        let err = install(&archive, target.path(), "platform-tools", "adb").unwrap_err();
        match err {
            SetupError::Verification(msg) => assert!(msg.contains("adb")),
            other => panic!("unexpected error: {other:?}"),
        }
        // The extracted file stays; only verification failed.
        assert!(target.path().join("other.bin").exists());
    }

    #[test]
    fn garbage_bytes_are_an_archive_format_error() {
        let target = tempfile::tempdir().unwrap();
        let err = install(b"definitely not a zip", target.path(), "platform-tools", "adb")
            .unwrap_err();
        assert!(matches!(err, SetupError::ArchiveFormat(_)));
    }

    #[test]
    fn top_level_files_only_is_ambiguous() {
        let archive = build_zip(&[("loose.bin", b"x"), ("other.bin", b"y")]);
        let target = tempfile::tempdir().unwrap();
        let err = install(&archive, target.path(), "platform-tools", "adb").unwrap_err();
        assert!(matches!(err, SetupError::ArchiveLayout(_)));
    }
}
