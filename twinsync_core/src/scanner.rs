use crate::filter::{matches_with_parents, NameFilter};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use twinsync_common::{AppConfig, EntryKind, FileEntry, PathFilter, TwinSyncError};

/// Parallel folder scanner using jwalk
pub struct FolderScanner {
    follow_symlinks: bool,
    filter: Arc<dyn PathFilter>,
    gitignore: Option<Gitignore>,
}

impl FolderScanner {
    pub fn new(filter: Arc<dyn PathFilter>, follow_symlinks: bool) -> Self {
        Self {
            follow_symlinks,
            filter,
            gitignore: None,
        }
    }

    /// Scanner excluding the config's ignore patterns
    pub fn from_config(config: &AppConfig) -> Result<Self, TwinSyncError> {
        let filter = NameFilter::exclude_only(&config.ignore_patterns)?;
        Ok(Self::new(Arc::new(filter), config.follow_symlinks))
    }

    /// The filter applied while scanning, to be stored with the comparison
    pub fn filter(&self) -> Arc<dyn PathFilter> {
        Arc::clone(&self.filter)
    }

    /// Load .gitignore patterns from a directory (including nested .gitignore files)
    pub fn load_gitignore(&mut self, root: &Path) -> Result<(), TwinSyncError> {
        let mut builder = GitignoreBuilder::new(root);
        let mut found_any = false;

        for entry in WalkDir::new(root).into_iter().flatten() {
            let path = entry.path();
            if path.file_name() == Some(std::ffi::OsStr::new(".gitignore")) {
                if let Some(e) = builder.add(&path) {
                    debug!("Failed to add .gitignore from {:?}: {}", path, e);
                } else {
                    debug!("Added .gitignore from {:?}", path);
                    found_any = true;
                }
            }
        }

        if found_any {
            self.gitignore = Some(
                builder
                    .build()
                    .map_err(|e| TwinSyncError::Config(format!("Failed to build gitignore: {}", e)))?,
            );
        }
        Ok(())
    }

    pub fn scan(&self, root: &Path) -> Result<Vec<FileEntry>, TwinSyncError> {
        self.scan_with_cancel(root, None)
    }

    /// Lists everything below `root` (the root itself excluded), relative to `root`
    pub fn scan_with_cancel(
        &self,
        root: &Path,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<FileEntry>, TwinSyncError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .skip_hidden(false);

        for entry in walker {
            if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                return Err(TwinSyncError::Cancelled("Scan"));
            }

            let entry = entry.map_err(|e| {
                TwinSyncError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Walk error: {}", e),
                ))
            })?;

            let path = entry.path();
            let relative_path = path
                .strip_prefix(root)
                .map_err(|e| TwinSyncError::Path(e.to_string()))?
                .to_path_buf();

            // Skip the synthetic root entry (empty path)
            if relative_path.as_os_str().is_empty() {
                continue;
            }

            let file_type = entry.file_type();
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Folder
            } else {
                EntryKind::File
            };

            if self.is_excluded(&relative_path, kind == EntryKind::Folder) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| {
                TwinSyncError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Metadata error for {:?}: {}", path, e),
                ))
            })?;

            entries.push(FileEntry {
                path: relative_path,
                kind,
                size: if kind == EntryKind::File { metadata.len() } else { 0 },
                modified: unix_seconds(metadata.modified().unwrap_or(UNIX_EPOCH)),
                fingerprint: fingerprint(&metadata),
                is_followed_symlink: entry.path_is_symlink() && kind != EntryKind::Symlink,
            });
        }

        info!("Scanned {} entries from {:?}", entries.len(), root);
        Ok(entries)
    }

    /// Applies the path filter and .gitignore to a path and its parents
    fn is_excluded(&self, relative_path: &Path, is_dir: bool) -> bool {
        let rel = to_rel_string(relative_path);
        let passes = if is_dir {
            self.filter.pass_dir(&rel)
        } else {
            self.filter.pass_file(&rel)
        };
        if !passes {
            return true;
        }

        let mut current = relative_path;
        while let Some(parent) = current.parent() {
            if !parent.as_os_str().is_empty() && !self.filter.pass_dir(&to_rel_string(parent)) {
                return true;
            }
            current = parent;
        }

        match &self.gitignore {
            Some(gitignore) => matches_with_parents(gitignore, relative_path, is_dir),
            None => false,
        }
    }
}

/// '/'-separated form of a relative path
pub(crate) fn to_rel_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}

#[cfg(unix)]
fn fingerprint(metadata: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn fingerprint(_metadata: &std::fs::Metadata) -> u64 {
    0
}

/// Joins a scanned relative path onto its root
pub(crate) fn full_path(root: &Path, relative: &Path) -> PathBuf {
    root.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use twinsync_common::NullFilter;

    fn scanner_with(patterns: &[&str]) -> FolderScanner {
        let mut config = AppConfig::default();
        config.ignore_patterns = patterns.iter().map(|p| p.to_string()).collect();
        FolderScanner::from_config(&config).unwrap()
    }

    #[test]
    fn test_scanner_basic() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("file1.txt"), b"test").unwrap();
        fs::write(temp.path().join("file2.txt"), b"test").unwrap();
        fs::create_dir(temp.path().join("subdir")).unwrap();
        fs::write(temp.path().join("subdir/file3.txt"), b"test").unwrap();

        let scanner = FolderScanner::new(Arc::new(NullFilter), false);
        let entries = scanner.scan(temp.path()).unwrap();

        // Root directory itself should NOT be included
        assert_eq!(entries.len(), 4, "Expected 4 entries, got {}", entries.len());
        for entry in &entries {
            assert!(!entry.path.as_os_str().is_empty());
        }

        let subdir = entries.iter().find(|e| e.path == Path::new("subdir")).unwrap();
        assert_eq!(subdir.kind, EntryKind::Folder);
        let file = entries.iter().find(|e| e.path == Path::new("subdir/file3.txt")).unwrap();
        assert_eq!(file.kind, EntryKind::File);
        assert_eq!(file.size, 4);
        assert!(file.modified > 0);
    }

    #[test]
    fn test_scanner_ignore_patterns() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("root.txt"), b"test").unwrap();
        fs::write(temp.path().join("root.log"), b"test").unwrap();
        fs::create_dir(temp.path().join("build")).unwrap();
        fs::write(temp.path().join("build/output.txt"), b"test").unwrap();

        let scanner = scanner_with(&["*.log", "build/"]);
        let entries = scanner.scan(temp.path()).unwrap();

        assert!(entries.iter().all(|e| !e.path.to_string_lossy().ends_with(".log")));
        assert!(entries.iter().all(|e| !e.path.starts_with("build")));
        assert!(entries.iter().any(|e| e.path == Path::new("root.txt")));
    }

    #[test]
    fn test_scanner_gitignore() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitignore"), "target/\n*.tmp\n").unwrap();
        fs::create_dir(temp.path().join("target")).unwrap();
        fs::write(temp.path().join("target/app"), b"bin").unwrap();
        fs::write(temp.path().join("scratch.tmp"), b"x").unwrap();
        fs::write(temp.path().join("main.rs"), b"fn main() {}").unwrap();

        let mut scanner = FolderScanner::new(Arc::new(NullFilter), false);
        scanner.load_gitignore(temp.path()).unwrap();
        let entries = scanner.scan(temp.path()).unwrap();

        let names: Vec<String> = entries.iter().map(|e| to_rel_string(&e.path)).collect();
        assert!(names.contains(&"main.rs".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("target")));
        assert!(!names.contains(&"scratch.tmp".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_scanner_reports_symlinks_unfollowed() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        fs::write(temp.path().join("real/a.txt"), b"a").unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("link")).unwrap();

        let scanner = FolderScanner::new(Arc::new(NullFilter), false);
        let entries = scanner.scan(temp.path()).unwrap();

        let link = entries.iter().find(|e| e.path == Path::new("link")).unwrap();
        assert_eq!(link.kind, EntryKind::Symlink);
        assert!(!entries.iter().any(|e| e.path.starts_with("link/")));
    }

    #[test]
    fn test_scanner_cancel() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), b"a").unwrap();

        let scanner = FolderScanner::new(Arc::new(NullFilter), false);
        let cancel = AtomicBool::new(true);
        let result = scanner.scan_with_cancel(temp.path(), Some(&cancel));
        assert!(matches!(result, Err(TwinSyncError::Cancelled(_))));
    }

    #[test]
    fn test_rel_string_uses_forward_slashes() {
        assert_eq!(to_rel_string(Path::new("a").join("b").join("c.txt").as_path()), "a/b/c.txt");
    }
}
