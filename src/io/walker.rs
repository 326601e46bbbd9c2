//! File Walker (C1): enumerate source files under a root, applying
//! include/exclude globs, a size cap, and a fixed vendor-directory skip
//! list, producing a finite, non-restartable sequence of [`FileRecord`]s.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use tracing::warn;

use crate::core::errors::Result;
use crate::core::model::FileRecord;
use crate::lang::language_for_extension;

/// Directories skipped unconditionally: version-control metadata,
/// dependency caches, build outputs, virtualenvs, IDE directories.
pub const DEFAULT_VENDOR_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    "target",
    "dist",
    "build",
    "bin",
    "obj",
    ".idea",
    ".vscode",
    ".mypy_cache",
    ".pytest_cache",
];

/// Parameters controlling one walk, per spec §4.1.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub max_file_size: u64,
    pub follow_symlinks: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            include_globs: Vec::new(),
            exclude_globs: Vec::new(),
            exclude_dirs: DEFAULT_VENDOR_DIRS.iter().map(|s| s.to_string()).collect(),
            max_file_size: 1_048_576,
            follow_symlinks: false,
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| crate::core::errors::HardGateError::config(format!("invalid glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| crate::core::errors::HardGateError::config(format!("failed to build glob set: {e}")))
}

/// Walk `root` and return every [`FileRecord`] that survives the exclude
/// set and size cap and either matches an include glob or has a recognized
/// language extension.
///
/// A missing root is a caller error (fatal); an individual unreadable file
/// is skipped with a logged warning rather than failing the whole walk.
pub fn walk_files(root: &Path, options: &WalkOptions) -> Result<Vec<FileRecord>> {
    if !root.exists() {
        return Err(crate::core::errors::HardGateError::invalid_field(
            format!("scan root does not exist: {}", root.display()),
            "root_path",
        ));
    }
    if !root.is_dir() {
        return Err(crate::core::errors::HardGateError::invalid_field(
            format!("scan root is not a directory: {}", root.display()),
            "root_path",
        ));
    }

    let include_set = build_globset(&options.include_globs)?;
    let exclude_set = build_globset(&options.exclude_globs)?;
    let exclude_dirs = &options.exclude_dirs;

    let candidates: Vec<walkdir::DirEntry> = walkdir::WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .into_iter()
        .filter_entry(|entry| {
            if entry.file_type().is_dir() {
                let name = entry.file_name().to_string_lossy();
                !exclude_dirs.iter().any(|d| d == name.as_ref())
            } else {
                true
            }
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .collect();

    let records: Vec<FileRecord> = candidates
        .par_iter()
        .filter_map(|entry| {
            let path = entry.path();
            let relative = path.strip_prefix(root).ok()?.to_string_lossy().replace('\\', "/");

            if exclude_set.is_match(&relative) {
                return None;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %relative, error = %e, "failed to stat file, skipping");
                    return None;
                }
            };
            if metadata.len() > options.max_file_size {
                return None;
            }

            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let language = language_for_extension(&ext);

            let included_explicitly = include_set.is_match(&relative);
            if !included_explicitly && language.is_none() {
                return None;
            }

            let line_count = match std::fs::read(path) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    count_lines(&text)
                }
                Err(e) => {
                    warn!(path = %relative, error = %e, "failed to read file, skipping");
                    return None;
                }
            };

            Some(FileRecord {
                relative_path: relative,
                language,
                size_bytes: metadata.len(),
                line_count,
            })
        })
        .collect();

    Ok(records)
}

fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.lines().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_root_is_fatal() {
        let result = walk_files(Path::new("/does/not/exist/at/all"), &WalkOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn skips_vendor_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/lib.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(2)").unwrap();

        let records = walk_files(dir.path(), &WalkOptions::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative_path, "app.js");
    }

    #[test]
    fn rejects_files_over_size_cap() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("big.py"), "x".repeat(100)).unwrap();

        let options = WalkOptions {
            max_file_size: 10,
            ..WalkOptions::default()
        };
        let records = walk_files(dir.path(), &options).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn include_glob_admits_otherwise_unrecognized_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\nworld\n").unwrap();

        let options = WalkOptions {
            include_globs: vec!["*.txt".to_string()],
            ..WalkOptions::default()
        };
        let records = walk_files(dir.path(), &options).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line_count, 2);
    }
}
