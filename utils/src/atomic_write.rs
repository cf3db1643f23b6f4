//! Atomic file write helper (spec.md §4.D `write_file`, §6 "Writes").
//!
//! Writes go to `<path>.tmp` (mode `0600` on Unix) then `rename` onto
//! the target so a reader never observes a partially written file.
//! Grounded on the teacher's `forge-utils::atomic_write`, simplified to
//! the temp-suffix + replace-rename shape spec.md names explicitly
//! rather than the teacher's `NamedTempFile` + no-clobber variant
//! (write_file/apply_diff must be able to overwrite an existing file).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Write `contents` to `path` atomically: write to `path.tmp`, then
/// rename onto `path`. Parent directories are NOT created here; callers
/// that allow creating new directories (spec.md `write_file`) must do
/// so before calling this.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = tmp_path_for(path);

    let write_result = (|| -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(contents)?;
        file.sync_all()
    })();

    if write_result.is_err() {
        let _ = fs::remove_file(&tmp);
        return write_result;
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    Ok(())
}

/// Create parent directories (mode `0755`) for `path` if they don't
/// exist yet (spec.md §4.D `write_file` "Creates parent directories").
pub fn create_parent_dirs(path: &Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    fs::create_dir_all(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(parent, fs::Permissions::from_mode(0o755)).ok();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_file_with_no_tmp_sibling() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        atomic_write(&path, b"hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn create_parent_dirs_makes_missing_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deep/file.txt");
        create_parent_dirs(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
    }
}
