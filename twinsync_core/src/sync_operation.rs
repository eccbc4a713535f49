//! Resolution of categories and directions into concrete sync operations

use crate::hierarchy::{Container, FolderComparison, FolderPair, FsObject, Node};
use crate::registry::ObjectId;
use tracing::warn;
use twinsync_common::{Category, Side, SyncDirection, SyncOperation};

/// Operation of a single item, ignoring children and move links
pub fn isolated_sync_operation(
    category: Category,
    active: bool,
    sync_dir: SyncDirection,
    has_direction_conflict: bool,
) -> SyncOperation {
    if !active {
        return SyncOperation::DoNothing;
    }
    if has_direction_conflict {
        return SyncOperation::UnresolvedConflict;
    }
    let Some(source) = sync_dir.source() else {
        return SyncOperation::DoNothing;
    };
    let target = source.other();

    match category {
        Category::Equal => SyncOperation::DoNothing,
        Category::LeftOnly | Category::RightOnly => {
            let existing = if category == Category::LeftOnly {
                Side::Left
            } else {
                Side::Right
            };
            if source == existing {
                SyncOperation::create_on(target)
            } else {
                SyncOperation::delete_on(target)
            }
        }
        Category::DifferentContent
        | Category::LeftNewer
        | Category::RightNewer
        | Category::Conflict => SyncOperation::overwrite_on(target),
        Category::DifferentMetadata => SyncOperation::copy_metadata_to(target),
    }
}

impl FsObject {
    fn isolated_sync_operation(&self) -> SyncOperation {
        isolated_sync_operation(
            self.category,
            self.active,
            self.sync_dir,
            !self.direction_conflict.is_empty(),
        )
    }
}

impl FolderComparison {
    /// The operation the sync engine would carry out for `id`
    ///
    /// Files take move links into account, folders their children. `None`
    /// for base folders and dead ids.
    pub fn sync_operation(&self, id: ObjectId) -> Option<SyncOperation> {
        match self.nodes.get(id)? {
            Node::Base(_) => None,
            Node::File(file) => Some(self.apply_move_optimization(id, file.obj.isolated_sync_operation())),
            Node::Symlink(symlink) => Some(symlink.obj.isolated_sync_operation()),
            Node::Folder(folder) => Some(
                *folder
                    .sync_op_buffered
                    .get_or_init(|| self.resolve_folder_operation(folder)),
            ),
        }
    }

    /// Operation `id` would get with direction `sync_dir`, as if active and
    /// without conflict; children are not considered
    pub fn test_sync_operation(&self, id: ObjectId, sync_dir: SyncDirection) -> Option<SyncOperation> {
        let node = self.nodes.get(id)?;
        let obj = node.fs_object()?;
        let op = isolated_sync_operation(obj.category, true, sync_dir, false);
        match node {
            Node::File(_) => Some(self.apply_move_optimization(id, op)),
            _ => Some(op),
        }
    }

    pub fn sync_op_conflict(&self, id: ObjectId) -> Option<&str> {
        self.fs_object(id)?.direction_conflict()
    }

    /// Sets the direction and drops any direction conflict
    pub fn set_sync_dir(&mut self, id: ObjectId, sync_dir: SyncDirection) {
        let Some(obj) = self.fs_object_mut(id, "set_sync_dir") else {
            return;
        };
        obj.sync_dir = sync_dir;
        obj.direction_conflict.clear();
        self.notify_sync_cfg_changed(id);
    }

    /// Records why no direction could be chosen; the direction becomes `None`
    pub fn set_sync_dir_conflict(&mut self, id: ObjectId, description: &str) {
        debug_assert!(!description.is_empty(), "direction conflict needs a description");
        let Some(obj) = self.fs_object_mut(id, "set_sync_dir_conflict") else {
            return;
        };
        obj.sync_dir = SyncDirection::None;
        obj.direction_conflict = description.to_string();
        self.notify_sync_cfg_changed(id);
    }

    pub fn set_active(&mut self, id: ObjectId, active: bool) {
        let Some(obj) = self.fs_object_mut(id, "set_active") else {
            return;
        };
        obj.active = active;
        self.notify_sync_cfg_changed(id);
    }

    /// Sets the active flag of an item and everything below it
    pub fn set_active_recursive(&mut self, id: ObjectId, active: bool) {
        self.set_active(id, active);
        if self.folder(id).is_some() {
            crate::visitor::visit_recursively_mut(
                self,
                id,
                |tree, folder| tree.set_active(folder, active),
                |tree, file| tree.set_active(file, active),
                |tree, symlink| tree.set_active(symlink, active),
            );
        }
    }

    /// Links `id` to the file it was moved from or to; `None` unlinks
    ///
    /// The link is enough on one end: the counterpart reports the matching
    /// move as well.
    pub fn set_move_ref(&mut self, id: ObjectId, counterpart: Option<ObjectId>) {
        let Some(Node::File(file)) = self.nodes.get_mut(id) else {
            warn!("set_move_ref: {} is not a live file", id);
            return;
        };
        let previous = std::mem::replace(&mut file.move_ref, counterpart);
        if let Some(previous) = previous {
            if let Some(Node::File(old)) = self.nodes.get_mut(previous) {
                if old.move_back_ref == Some(id) {
                    old.move_back_ref = None;
                }
            }
            self.invalidate_ancestors(previous);
        }
        if let Some(counterpart) = counterpart {
            match self.nodes.get_mut(counterpart) {
                Some(Node::File(target)) => target.move_back_ref = Some(id),
                _ => warn!("set_move_ref: counterpart {} is not a live file", counterpart),
            }
        }
        self.notify_sync_cfg_changed(id);
    }

    /// Links two files to each other as the two ends of one move
    pub fn link_move_pair(&mut self, a: ObjectId, b: ObjectId) {
        self.set_move_ref(a, Some(b));
        self.set_move_ref(b, Some(a));
    }

    pub fn move_ref(&self, id: ObjectId) -> Option<ObjectId> {
        self.file(id)?.move_ref
    }

    /// The live file paired with `id` by a move link held on either end
    pub fn move_counterpart(&self, id: ObjectId) -> Option<ObjectId> {
        let Some(Node::File(file)) = self.nodes.get(id) else {
            return None;
        };
        let own = file
            .move_ref
            .filter(|&other| other != id && matches!(self.nodes.get(other), Some(Node::File(_))));
        own.or_else(|| {
            file.move_back_ref.filter(|&other| {
                other != id && matches!(self.nodes.get(other), Some(Node::File(referrer)) if referrer.move_ref == Some(id))
            })
        })
    }

    /// Drops the move links held by and pointing at `id`
    pub(crate) fn detach_move_links(&mut self, id: ObjectId) {
        let counterpart = self.move_counterpart(id);
        if let Some(Node::File(file)) = self.nodes.get_mut(id) {
            file.move_ref = None;
            file.move_back_ref = None;
        }
        if let Some(counterpart) = counterpart {
            if let Some(Node::File(other)) = self.nodes.get_mut(counterpart) {
                if other.move_ref == Some(id) {
                    other.move_ref = None;
                }
                if other.move_back_ref == Some(id) {
                    other.move_back_ref = None;
                }
            }
            self.invalidate_ancestors(counterpart);
        }
    }

    fn apply_move_optimization(&self, id: ObjectId, op: SyncOperation) -> SyncOperation {
        let Some(counterpart_id) = self.move_counterpart(id) else {
            return op;
        };
        let Some(Node::File(counterpart)) = self.nodes.get(counterpart_id) else {
            return op;
        };

        let counterpart_op = counterpart.obj.isolated_sync_operation();
        for side in Side::BOTH {
            if op == SyncOperation::create_on(side) && counterpart_op == SyncOperation::delete_on(side) {
                return SyncOperation::move_to(side);
            }
            if op == SyncOperation::delete_on(side) && counterpart_op == SyncOperation::create_on(side) {
                return SyncOperation::move_from(side);
            }
        }
        op
    }

    fn resolve_folder_operation(&self, folder: &FolderPair) -> SyncOperation {
        let op = folder.obj.isolated_sync_operation();
        match op {
            SyncOperation::CreateLeft
            | SyncOperation::CreateRight
            | SyncOperation::OverwriteLeft
            | SyncOperation::OverwriteRight
            | SyncOperation::CopyMetadataToLeft
            | SyncOperation::CopyMetadataToRight
            | SyncOperation::MoveLeftFrom
            | SyncOperation::MoveLeftTo
            | SyncOperation::MoveRightFrom
            | SyncOperation::MoveRightTo => op,
            SyncOperation::DeleteLeft
            | SyncOperation::DeleteRight
            | SyncOperation::DoNothing
            | SyncOperation::UnresolvedConflict => {
                let Some(missing) = Side::BOTH.into_iter().find(|&side| folder.obj.is_empty(side)) else {
                    return op;
                };

                // a child needs the folder to exist on the missing side
                if self.any_child(&folder.container, |_, child_op| child_op.creates_on() == Some(missing)) {
                    return SyncOperation::create_on(missing);
                }

                // a child that stays blocks deleting the folder
                if let Some(side) = op.target_side().filter(|&side| op == SyncOperation::delete_on(side)) {
                    if self.any_child(&folder.container, |child, child_op| {
                        !child.is_pair_empty() && !child_op.removes_from(side)
                    }) {
                        return SyncOperation::DoNothing;
                    }
                }
                op
            }
        }
    }

    fn any_child(&self, container: &Container, predicate: impl Fn(&FsObject, SyncOperation) -> bool) -> bool {
        container.child_ids().into_iter().any(|child| {
            match (self.fs_object(child), self.sync_operation(child)) {
                (Some(obj), Some(op)) => predicate(obj, op),
                _ => false,
            }
        })
    }
}
