//! Filesystem helpers.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
///
/// Parent directories are created as needed. Readers observe either the
/// previous contents or the new contents, never a partial write.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let persistence = |reason: String| Error::Persistence {
        path: path.to_path_buf(),
        reason,
    };

    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| persistence(format!("create dir: {e}")))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| persistence(format!("temp file: {e}")))?;
    tmp.write_all(data)
        .map_err(|e| persistence(format!("write: {e}")))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| persistence(format!("sync: {e}")))?;
    tmp.persist(path)
        .map_err(|e| persistence(format!("rename: {}", e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        atomic_write(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".vrooli/deployment/report.json");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
