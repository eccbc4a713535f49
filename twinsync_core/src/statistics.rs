//! Counting the work a resolved comparison tree implies

use crate::hierarchy::{FilePair, FolderComparison};
use crate::registry::ObjectId;
use crate::visitor::visit_recursively;
use serde::Serialize;
use std::cell::RefCell;
use twinsync_common::{Side, SidePair, SyncOperation};

/// An item the sync engine would skip because its direction is undecided
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictInfo {
    pub rel_path: String,
    pub message: String,
}

/// Work a sync run would perform, summed from the resolved operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatistics {
    create: SidePair<usize>,
    update: SidePair<usize>,
    delete: SidePair<usize>,
    conflicts: Vec<ConflictInfo>,
    bytes_to_process: u64,
    rows_total: usize,
}

impl SyncStatistics {
    pub fn from_root(tree: &FolderComparison, base: ObjectId) -> Self {
        let stats = RefCell::new(Self::default());
        visit_recursively(
            tree,
            base,
            |id, _| stats.borrow_mut().add_item(tree, id, None),
            |id, file| stats.borrow_mut().add_item(tree, id, Some(file)),
            |id, _| stats.borrow_mut().add_item(tree, id, None),
        );
        stats.into_inner()
    }

    /// Statistics over all folder pairs
    pub fn from_tree(tree: &FolderComparison) -> Self {
        tree.bases()
            .iter()
            .map(|&base| Self::from_root(tree, base))
            .fold(Self::default(), |mut total, stats| {
                total.merge(stats);
                total
            })
    }

    fn merge(&mut self, other: SyncStatistics) {
        for side in Side::BOTH {
            self.create[side] += other.create[side];
            self.update[side] += other.update[side];
            self.delete[side] += other.delete[side];
        }
        self.conflicts.extend(other.conflicts);
        self.bytes_to_process += other.bytes_to_process;
        self.rows_total += other.rows_total;
    }

    fn add_item(&mut self, tree: &FolderComparison, id: ObjectId, file: Option<&FilePair>) {
        self.rows_total += 1;
        let Some(op) = tree.sync_operation(id) else {
            return;
        };
        let source_size = |target: Side| file.map_or(0, |file| file.file_size(target.other()));

        match op {
            SyncOperation::CreateLeft
            | SyncOperation::CreateRight
            | SyncOperation::OverwriteLeft
            | SyncOperation::OverwriteRight => {
                let Some(target) = op.target_side() else {
                    return;
                };
                if op.creates_on().is_some() {
                    self.create[target] += 1;
                } else {
                    self.update[target] += 1;
                }
                self.bytes_to_process += source_size(target);
            }
            SyncOperation::DeleteLeft => self.delete.left += 1,
            SyncOperation::DeleteRight => self.delete.right += 1,
            // a move is counted once, at its target
            SyncOperation::MoveLeftTo | SyncOperation::CopyMetadataToLeft => self.update.left += 1,
            SyncOperation::MoveRightTo | SyncOperation::CopyMetadataToRight => self.update.right += 1,
            SyncOperation::MoveLeftFrom | SyncOperation::MoveRightFrom | SyncOperation::DoNothing => {}
            SyncOperation::UnresolvedConflict => self.conflicts.push(ConflictInfo {
                rel_path: tree.relative_path(id, Side::Left).unwrap_or_default(),
                message: tree.sync_op_conflict(id).unwrap_or_default().to_string(),
            }),
        }
    }

    pub fn create_count(&self, side: Side) -> usize {
        self.create[side]
    }

    pub fn update_count(&self, side: Side) -> usize {
        self.update[side]
    }

    pub fn delete_count(&self, side: Side) -> usize {
        self.delete[side]
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    pub fn conflicts(&self) -> &[ConflictInfo] {
        &self.conflicts
    }

    pub fn bytes_to_process(&self) -> u64 {
        self.bytes_to_process
    }

    /// Number of items visited, whether or not they need an action
    pub fn rows_total(&self) -> usize {
        self.rows_total
    }

    /// Number of create, update and delete actions on both sides
    pub fn total_operations(&self) -> usize {
        Side::BOTH
            .iter()
            .map(|&side| self.create[side] + self.update[side] + self.delete[side])
            .sum()
    }

    /// True if a sync run would neither change anything nor hit a conflict
    pub fn is_in_sync(&self) -> bool {
        self.total_operations() == 0 && self.conflicts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::{detect_moved_files, redetermine_sync_directions};
    use crate::hierarchy::CompareSettings;
    use twinsync_common::{
        AbstractPath, Category, FileAttributes, FolderAttributes, SyncConfig, SyncDirection, SyncVariant,
    };

    fn new_tree() -> (FolderComparison, ObjectId) {
        let mut tree = FolderComparison::new();
        let base = tree.add_base_folder_pair(
            SidePair::new(AbstractPath::new("/l"), AbstractPath::new("/r")),
            SidePair::default(),
            CompareSettings::default(),
        );
        (tree, base)
    }

    fn attrs(size: u64, time: i64) -> FileAttributes {
        FileAttributes::new(time, size, 0, false)
    }

    #[test]
    fn test_counts_and_bytes() {
        let (mut tree, base) = new_tree();
        let folder = tree.add_folder_on(base, Side::Left, "new", FolderAttributes::default());
        tree.add_file_on(folder, Side::Left, "a", attrs(100, 1));
        tree.add_file(base, "b", attrs(10, 9), Category::LeftNewer, "b", attrs(20, 1));
        tree.add_file_on(base, Side::Right, "c", attrs(5, 1));
        tree.add_file(base, "d", attrs(1, 1), Category::DifferentContent, "d", attrs(2, 1));
        tree.add_file(base, "e", attrs(1, 1), Category::Equal, "e", attrs(1, 1));

        redetermine_sync_directions(&mut tree, base, &SyncConfig::new(SyncVariant::TwoWay));
        let stats = SyncStatistics::from_root(&tree, base);

        assert_eq!(stats.create_count(Side::Right), 2);
        assert_eq!(stats.create_count(Side::Left), 1);
        assert_eq!(stats.update_count(Side::Right), 1);
        assert_eq!(stats.delete_count(Side::Left), 0);
        assert_eq!(stats.bytes_to_process(), 100 + 10 + 5);
        assert_eq!(stats.conflict_count(), 1);
        assert_eq!(stats.conflicts()[0].rel_path, "d");
        assert_eq!(stats.rows_total(), 6);
        assert_eq!(stats.total_operations(), 4);
        assert!(!stats.is_in_sync());
    }

    #[test]
    fn test_move_counts_once() {
        let (mut tree, base) = new_tree();
        tree.add_file_on(base, Side::Left, "new", attrs(50, 3));
        tree.add_file_on(base, Side::Right, "old", attrs(50, 3));
        detect_moved_files(&mut tree, base);
        redetermine_sync_directions(&mut tree, base, &SyncConfig::new(SyncVariant::Mirror));

        let stats = SyncStatistics::from_tree(&tree);
        assert_eq!(stats.update_count(Side::Right), 1);
        assert_eq!(stats.delete_count(Side::Right), 0);
        assert_eq!(stats.create_count(Side::Right), 0);
        assert_eq!(stats.bytes_to_process(), 0);
    }

    #[test]
    fn test_in_sync_tree() {
        let (mut tree, base) = new_tree();
        let file = tree.add_file_on(base, Side::Left, "a", attrs(1, 1));
        tree.set_sync_dir(file, SyncDirection::None);

        let stats = SyncStatistics::from_root(&tree, base);
        assert!(stats.is_in_sync());
        assert_eq!(stats.rows_total(), 1);
    }
}
