//! Directory walks over a scenario tree.

use crate::filters;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// A file that survived the directory and extension filters.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// POSIX path relative to the walk root.
    pub rel_path: String,
}

impl SourceFile {
    /// File contents, or `None` if the file cannot be read as text.
    pub fn read(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!("Skipping unreadable file {}: {}", self.rel_path, e);
                None
            }
        }
    }

    pub fn basename(&self) -> &str {
        self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path)
    }
}

/// POSIX form of `path` relative to `root`.
pub fn relative_posix(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Files under `root` with one of `extensions`, in deterministic order.
///
/// Non-root directories matching the skip predicate are pruned. When
/// `ignore_docs` is set, files matching the documentation/fixture predicate
/// are dropped. Walk errors on individual entries are skipped.
pub fn source_files(root: &Path, extensions: &[&str], ignore_docs: bool) -> Vec<SourceFile> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            !filters::should_skip_dir(&entry.file_name().to_string_lossy())
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                trace!("Walk error under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !filters::has_extension(entry.path(), extensions) {
            continue;
        }

        let rel_path = relative_posix(root, entry.path());
        if ignore_docs && filters::should_ignore_file(&rel_path) {
            trace!("Ignoring {}", rel_path);
            continue;
        }

        files.push(SourceFile {
            path: entry.path().to_path_buf(),
            rel_path,
        });
    }
    files
}
