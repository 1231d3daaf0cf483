use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// True if `name` resolves to an executable via the OS search path. `which`
/// applies the native resolution rules, so `.exe`/PATHEXT handling on
/// Windows comes for free. A missing executable is a normal `false`.
pub fn in_search_path(name: &str) -> bool {
    lookup(name, env::var_os("PATH"))
}

fn lookup(name: &str, paths: Option<OsString>) -> bool {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    which::which_in(name, paths.as_ref(), cwd).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_name_is_false() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!lookup(
            "no-such-binary-anywhere",
            Some(dir.path().as_os_str().to_owned())
        ));
    }

    #[test]
    fn empty_search_path_is_false() {
        assert!(!lookup("adb", Some(OsString::new())));
    }

    #[test]
    #[cfg(unix)]
    fn executable_on_search_path_is_found() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("fakeadb");
        fs_err::write(&bin, b"#!/bin/sh\n").unwrap();
        let mut perms = fs_err::metadata(&bin).unwrap().permissions();
        perms.set_mode(0o755);
        fs_err::set_permissions(&bin, perms).unwrap();

        assert!(lookup("fakeadb", Some(dir.path().as_os_str().to_owned())));
        // A plain file without the executable bit must not count.
        fs_err::write(dir.path().join("notexec"), b"data").unwrap();
        assert!(!lookup("notexec", Some(dir.path().as_os_str().to_owned())));
    }
}
