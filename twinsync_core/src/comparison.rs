use crate::hierarchy::{CompareSettings, FolderComparison};
use crate::registry::ObjectId;
use crate::scanner::full_path;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Component, Path};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use twinsync_common::{
    AbstractPath, BaseFolderStatus, Blake3Hash, Category, CompareVariant, EntryKind, FileAttributes,
    FileEntry, FolderAttributes, FolderCategory, LinkAttributes, PlainCategory, Side, SidePair,
    TwinSyncError,
};

const SAME_DATE_DIFFERENT_SIZE: &str = "Files have the same date but a different size";

/// Whether two modification times count as equal
///
/// Times within `tolerance` seconds are equal, and so are times that differ
/// by one of the `ignored_shift_minutes` (within the same tolerance), which
/// covers daylight saving and time zone jumps on FAT volumes.
pub fn same_file_time(a: i64, b: i64, tolerance: i32, ignored_shift_minutes: &[u32]) -> bool {
    let tolerance = u64::from(tolerance.max(0).unsigned_abs());
    let diff = a.abs_diff(b);
    if diff <= tolerance {
        return true;
    }
    ignored_shift_minutes
        .iter()
        .any(|&minutes| diff.abs_diff(u64::from(minutes) * 60) <= tolerance)
}

/// One folder level of a scan result, keyed by item name
#[derive(Default)]
struct Listing<'a> {
    files: BTreeMap<String, &'a FileEntry>,
    symlinks: BTreeMap<String, &'a FileEntry>,
    folders: BTreeMap<String, (Option<&'a FileEntry>, Listing<'a>)>,
}

impl<'a> Listing<'a> {
    fn build(entries: &'a [FileEntry]) -> Self {
        let mut root = Listing::default();
        for entry in entries {
            let names: Vec<String> = entry
                .path
                .components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            let Some((name, parents)) = names.split_last() else {
                continue;
            };

            let mut level = &mut root;
            for parent in parents {
                level = &mut level.folders.entry(parent.clone()).or_default().1;
            }
            match entry.kind {
                EntryKind::File => {
                    level.files.insert(name.clone(), entry);
                }
                EntryKind::Symlink => {
                    level.symlinks.insert(name.clone(), entry);
                }
                EntryKind::Folder => {
                    level.folders.entry(name.clone()).or_default().0 = Some(entry);
                }
            }
        }
        root
    }
}

fn union_keys<'k, V>(left: Option<&'k BTreeMap<String, V>>, right: Option<&'k BTreeMap<String, V>>) -> BTreeSet<&'k str> {
    left.into_iter()
        .chain(right)
        .flat_map(|map| map.keys().map(String::as_str))
        .collect()
}

/// Files of equal size whose content still has to be compared
struct PendingContent<'a> {
    id: ObjectId,
    left: &'a FileEntry,
    right: &'a FileEntry,
}

enum ContentVerdict {
    Equal,
    Different,
    Unreadable(String),
}

/// Builds the comparison tree of one folder pair from two scan results
pub struct ComparisonEngine {
    settings: CompareSettings,
}

impl ComparisonEngine {
    pub fn new(settings: CompareSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CompareSettings {
        &self.settings
    }

    pub fn compare(
        &self,
        tree: &mut FolderComparison,
        left_root: &Path,
        right_root: &Path,
        left_entries: &[FileEntry],
        right_entries: &[FileEntry],
    ) -> Result<ObjectId, TwinSyncError> {
        self.compare_with_cancel(tree, left_root, right_root, left_entries, right_entries, None)
    }

    /// Adds a base folder pair to `tree` and fills it; returns the new root
    pub fn compare_with_cancel(
        &self,
        tree: &mut FolderComparison,
        left_root: &Path,
        right_root: &Path,
        left_entries: &[FileEntry],
        right_entries: &[FileEntry],
        cancel: Option<&AtomicBool>,
    ) -> Result<ObjectId, TwinSyncError> {
        info!(
            "Comparing {} left entries with {} right entries ({})",
            left_entries.len(),
            right_entries.len(),
            self.settings.compare_variant
        );

        let base = tree.add_base_folder_pair(
            SidePair::new(AbstractPath::new(left_root), AbstractPath::new(right_root)),
            SidePair::new(folder_status(left_root), folder_status(right_root)),
            self.settings.clone(),
        );

        let left = Listing::build(left_entries);
        let right = Listing::build(right_entries);
        let mut pending = Vec::new();
        self.merge_level(tree, base, Some(&left), Some(&right), &mut pending, cancel)?;

        if !pending.is_empty() {
            debug!("Comparing content of {} file pairs", pending.len());
            let verdicts = pending
                .par_iter()
                .map(|item| {
                    if is_cancelled(cancel) {
                        return Err(TwinSyncError::Cancelled("Comparison"));
                    }
                    Ok((item.id, compare_content(left_root, right_root, item.left, item.right)))
                })
                .collect::<Result<Vec<_>, TwinSyncError>>()?;

            for (id, verdict) in verdicts {
                match verdict {
                    ContentVerdict::Equal => tree.set_category(id, PlainCategory::Equal),
                    ContentVerdict::Different => tree.set_category(id, PlainCategory::DifferentContent),
                    ContentVerdict::Unreadable(message) => tree.set_category_conflict(id, &message),
                }
            }
        }

        debug!("Comparison tree holds {} nodes", tree.len());
        Ok(base)
    }

    fn merge_level<'a>(
        &self,
        tree: &mut FolderComparison,
        parent: ObjectId,
        left: Option<&'a Listing<'a>>,
        right: Option<&'a Listing<'a>>,
        pending: &mut Vec<PendingContent<'a>>,
        cancel: Option<&AtomicBool>,
    ) -> Result<(), TwinSyncError> {
        if is_cancelled(cancel) {
            return Err(TwinSyncError::Cancelled("Comparison"));
        }

        for name in union_keys(left.map(|l| &l.files), right.map(|r| &r.files)) {
            let l = left.and_then(|l| l.files.get(name)).copied();
            let r = right.and_then(|r| r.files.get(name)).copied();
            match (l, r) {
                (Some(l), Some(r)) => {
                    let (category, conflict) = self.file_category(l, r);
                    let id = tree.add_file(parent, name, file_attributes(l), category, name, file_attributes(r));
                    if let Some(message) = conflict {
                        tree.set_category_conflict(id, message);
                    }
                    if self.settings.compare_variant == CompareVariant::Content && category == Category::Equal {
                        pending.push(PendingContent { id, left: l, right: r });
                    }
                }
                (Some(l), None) => {
                    tree.add_file_on(parent, Side::Left, name, file_attributes(l));
                }
                (None, Some(r)) => {
                    tree.add_file_on(parent, Side::Right, name, file_attributes(r));
                }
                (None, None) => {}
            }
        }

        for name in union_keys(left.map(|l| &l.symlinks), right.map(|r| &r.symlinks)) {
            let l = left.and_then(|l| l.symlinks.get(name)).copied();
            let r = right.and_then(|r| r.symlinks.get(name)).copied();
            match (l, r) {
                (Some(l), Some(r)) => {
                    let (category, conflict) = self.symlink_category(l, r, tree, parent);
                    let id = tree.add_symlink(
                        parent,
                        name,
                        LinkAttributes::new(l.modified),
                        category,
                        name,
                        LinkAttributes::new(r.modified),
                    );
                    if let Some(message) = conflict {
                        tree.set_category_conflict(id, &message);
                    }
                }
                (Some(l), None) => {
                    tree.add_symlink_on(parent, Side::Left, name, LinkAttributes::new(l.modified));
                }
                (None, Some(r)) => {
                    tree.add_symlink_on(parent, Side::Right, name, LinkAttributes::new(r.modified));
                }
                (None, None) => {}
            }
        }

        for name in union_keys(left.map(|l| &l.folders), right.map(|r| &r.folders)) {
            let l = left.and_then(|l| l.folders.get(name));
            let r = right.and_then(|r| r.folders.get(name));
            let id = match (l, r) {
                (Some((l_entry, _)), Some((r_entry, _))) => tree.add_folder(
                    parent,
                    name,
                    folder_attributes(*l_entry),
                    FolderCategory::Equal,
                    name,
                    folder_attributes(*r_entry),
                ),
                (Some((l_entry, _)), None) => tree.add_folder_on(parent, Side::Left, name, folder_attributes(*l_entry)),
                (None, Some((r_entry, _))) => tree.add_folder_on(parent, Side::Right, name, folder_attributes(*r_entry)),
                (None, None) => continue,
            };
            self.merge_level(tree, id, l.map(|(_, listing)| listing), r.map(|(_, listing)| listing), pending, cancel)?;
        }
        Ok(())
    }

    fn file_category(&self, left: &FileEntry, right: &FileEntry) -> (Category, Option<&'static str>) {
        match self.settings.compare_variant {
            CompareVariant::TimeSize => {
                if self.same_time(left.modified, right.modified) {
                    if left.size == right.size {
                        (Category::Equal, None)
                    } else {
                        (Category::Conflict, Some(SAME_DATE_DIFFERENT_SIZE))
                    }
                } else if left.modified > right.modified {
                    (Category::LeftNewer, None)
                } else {
                    (Category::RightNewer, None)
                }
            }
            CompareVariant::Size => {
                if left.size == right.size {
                    (Category::Equal, None)
                } else {
                    (Category::DifferentContent, None)
                }
            }
            // equal sizes are decided later by hashing
            CompareVariant::Content => {
                if left.size == right.size {
                    (Category::Equal, None)
                } else {
                    (Category::DifferentContent, None)
                }
            }
        }
    }

    fn symlink_category(
        &self,
        left: &FileEntry,
        right: &FileEntry,
        tree: &FolderComparison,
        parent: ObjectId,
    ) -> (Category, Option<String>) {
        match self.settings.compare_variant {
            CompareVariant::TimeSize => {
                if self.same_time(left.modified, right.modified) {
                    (Category::Equal, None)
                } else if left.modified > right.modified {
                    (Category::LeftNewer, None)
                } else {
                    (Category::RightNewer, None)
                }
            }
            CompareVariant::Content => {
                let roots = tree
                    .base_of(parent)
                    .and_then(|base| tree.base(base))
                    .map(|base| SidePair::new(base.abstract_path(Side::Left).clone(), base.abstract_path(Side::Right).clone()));
                let Some(roots) = roots else {
                    return (Category::Equal, None);
                };
                let left_target = std::fs::read_link(full_path(roots.left.as_path(), &left.path));
                let right_target = std::fs::read_link(full_path(roots.right.as_path(), &right.path));
                match (left_target, right_target) {
                    (Ok(l), Ok(r)) if l == r => (Category::Equal, None),
                    (Ok(_), Ok(_)) => (Category::DifferentContent, None),
                    (Err(e), _) | (_, Err(e)) => (Category::Conflict, Some(format!("Cannot read link target: {}", e))),
                }
            }
            CompareVariant::Size => (Category::Equal, None),
        }
    }

    fn same_time(&self, a: i64, b: i64) -> bool {
        same_file_time(
            a,
            b,
            self.settings.file_time_tolerance,
            &self.settings.ignored_time_shift_minutes,
        )
    }
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.map_or(false, |flag| flag.load(Ordering::Relaxed))
}

fn folder_status(root: &Path) -> BaseFolderStatus {
    match std::fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => BaseFolderStatus::Existing,
        Ok(_) => BaseFolderStatus::Failure,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BaseFolderStatus::NotExisting,
        Err(_) => BaseFolderStatus::Failure,
    }
}

fn file_attributes(entry: &FileEntry) -> FileAttributes {
    FileAttributes::new(entry.modified, entry.size, entry.fingerprint, entry.is_followed_symlink)
}

fn folder_attributes(entry: Option<&FileEntry>) -> FolderAttributes {
    FolderAttributes::new(entry.map_or(false, |e| e.is_followed_symlink))
}

fn compare_content(left_root: &Path, right_root: &Path, left: &FileEntry, right: &FileEntry) -> ContentVerdict {
    let left_hash = hash_file(&full_path(left_root, &left.path));
    let right_hash = hash_file(&full_path(right_root, &right.path));
    match (left_hash, right_hash) {
        (Ok(l), Ok(r)) if l == r => ContentVerdict::Equal,
        (Ok(l), Ok(r)) => {
            debug!("Content differs for {}: {} vs {}", left.path.display(), l.to_hex(), r.to_hex());
            ContentVerdict::Different
        }
        (Err(e), _) | (_, Err(e)) => ContentVerdict::Unreadable(e.to_string()),
    }
}

/// BLAKE3 hash of a file's content
pub fn hash_file(path: &Path) -> Result<Blake3Hash, TwinSyncError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0; 64 * 1024]; // 64KB buffer

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn entry(path: &str, kind: EntryKind, size: u64, modified: i64) -> FileEntry {
        FileEntry {
            path: PathBuf::from(path),
            kind,
            size,
            modified,
            fingerprint: 0,
            is_followed_symlink: false,
        }
    }

    fn file(path: &str, size: u64, modified: i64) -> FileEntry {
        entry(path, EntryKind::File, size, modified)
    }

    fn category_of(tree: &FolderComparison, base: ObjectId, name: &str) -> Category {
        let container = tree.container(base).unwrap();
        container
            .child_ids()
            .into_iter()
            .filter_map(|id| tree.fs_object(id))
            .find(|obj| obj.item_name_any() == name)
            .map(|obj| obj.category())
            .unwrap()
    }

    #[test]
    fn test_same_file_time() {
        assert!(same_file_time(100, 100, 0, &[]));
        assert!(same_file_time(100, 102, 2, &[]));
        assert!(!same_file_time(100, 103, 2, &[]));
        assert!(same_file_time(0, 3600, 2, &[60]));
        assert!(same_file_time(3601, 0, 2, &[60]));
        assert!(!same_file_time(0, 1800, 2, &[60]));
        assert!(!same_file_time(0, 1, -5, &[]));
    }

    #[test]
    fn test_time_size_categories() {
        let left = vec![
            file("same.txt", 10, 1000),
            file("newer.txt", 10, 2000),
            file("older.txt", 10, 1000),
            file("conflict.txt", 10, 1000),
            file("left_only.txt", 1, 1),
        ];
        let right = vec![
            file("same.txt", 10, 1001),
            file("newer.txt", 10, 1000),
            file("older.txt", 10, 2000),
            file("conflict.txt", 11, 1000),
            file("right_only.txt", 1, 1),
        ];

        let mut tree = FolderComparison::new();
        let engine = ComparisonEngine::new(CompareSettings::default());
        let base = engine
            .compare(&mut tree, Path::new("/nonexistent/l"), Path::new("/nonexistent/r"), &left, &right)
            .unwrap();

        assert_eq!(category_of(&tree, base, "same.txt"), Category::Equal);
        assert_eq!(category_of(&tree, base, "newer.txt"), Category::LeftNewer);
        assert_eq!(category_of(&tree, base, "older.txt"), Category::RightNewer);
        assert_eq!(category_of(&tree, base, "conflict.txt"), Category::Conflict);
        assert_eq!(category_of(&tree, base, "left_only.txt"), Category::LeftOnly);
        assert_eq!(category_of(&tree, base, "right_only.txt"), Category::RightOnly);

        let base_folder = tree.base(base).unwrap();
        assert_eq!(base_folder.folder_status(Side::Left), BaseFolderStatus::NotExisting);
    }

    #[test]
    fn test_nested_folders_are_matched_by_name() {
        let left = vec![
            entry("docs", EntryKind::Folder, 0, 0),
            file("docs/a.txt", 1, 5),
            entry("only_left", EntryKind::Folder, 0, 0),
        ];
        let right = vec![entry("docs", EntryKind::Folder, 0, 0), file("docs/a.txt", 1, 5)];

        let mut tree = FolderComparison::new();
        let engine = ComparisonEngine::new(CompareSettings::default());
        let base = engine.compare(&mut tree, Path::new("/l"), Path::new("/r"), &left, &right).unwrap();

        assert_eq!(category_of(&tree, base, "docs"), Category::Equal);
        assert_eq!(category_of(&tree, base, "only_left"), Category::LeftOnly);

        let docs = tree.container(base).unwrap().folders()[0];
        let docs_file = tree.container(docs).unwrap().files()[0];
        assert_eq!(tree.relative_path(docs_file, Side::Right).unwrap(), "docs/a.txt");
        assert_eq!(tree.fs_object(docs_file).unwrap().category(), Category::Equal);
    }

    #[test]
    fn test_content_comparison_hashes_files() {
        let left_dir = TempDir::new().unwrap();
        let right_dir = TempDir::new().unwrap();
        fs::write(left_dir.path().join("same.bin"), b"abcd").unwrap();
        fs::write(right_dir.path().join("same.bin"), b"abcd").unwrap();
        fs::write(left_dir.path().join("diff.bin"), b"abcd").unwrap();
        fs::write(right_dir.path().join("diff.bin"), b"abce").unwrap();

        let left = vec![file("same.bin", 4, 1), file("diff.bin", 4, 1)];
        let right = vec![file("same.bin", 4, 900), file("diff.bin", 4, 1)];

        let settings = CompareSettings {
            compare_variant: CompareVariant::Content,
            ..CompareSettings::default()
        };
        let mut tree = FolderComparison::new();
        let base = ComparisonEngine::new(settings)
            .compare(&mut tree, left_dir.path(), right_dir.path(), &left, &right)
            .unwrap();

        assert_eq!(category_of(&tree, base, "same.bin"), Category::Equal);
        assert_eq!(category_of(&tree, base, "diff.bin"), Category::DifferentContent);
        assert_eq!(tree.base(base).unwrap().folder_status(Side::Left), BaseFolderStatus::Existing);
    }

    #[test]
    fn test_unreadable_content_becomes_conflict() {
        let left_dir = TempDir::new().unwrap();
        let right_dir = TempDir::new().unwrap();
        fs::write(left_dir.path().join("a"), b"1").unwrap();

        let settings = CompareSettings {
            compare_variant: CompareVariant::Content,
            ..CompareSettings::default()
        };
        let mut tree = FolderComparison::new();
        let base = ComparisonEngine::new(settings)
            .compare(&mut tree, left_dir.path(), right_dir.path(), &[file("a", 1, 1)], &[file("a", 1, 1)])
            .unwrap();

        let id = tree.container(base).unwrap().files()[0];
        let obj = tree.fs_object(id).unwrap();
        assert_eq!(obj.category(), Category::Conflict);
        assert!(obj.category_extra_description().is_some());
    }

    #[test]
    fn test_size_variant() {
        let settings = CompareSettings {
            compare_variant: CompareVariant::Size,
            ..CompareSettings::default()
        };
        let mut tree = FolderComparison::new();
        let base = ComparisonEngine::new(settings)
            .compare(
                &mut tree,
                Path::new("/l"),
                Path::new("/r"),
                &[file("a", 1, 1), file("b", 1, 1)],
                &[file("a", 1, 500), file("b", 2, 1)],
            )
            .unwrap();

        assert_eq!(category_of(&tree, base, "a"), Category::Equal);
        assert_eq!(category_of(&tree, base, "b"), Category::DifferentContent);
    }

    #[test]
    fn test_comparison_cancel() {
        let mut tree = FolderComparison::new();
        let cancel = AtomicBool::new(true);
        let result = ComparisonEngine::new(CompareSettings::default()).compare_with_cancel(
            &mut tree,
            Path::new("/l"),
            Path::new("/r"),
            &[file("a", 1, 1)],
            &[],
            Some(&cancel),
        );
        assert!(matches!(result, Err(TwinSyncError::Cancelled(_))));
    }
}
