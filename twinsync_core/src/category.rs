//! Category maintenance: setting categories, logical removal and post-sync updates

use crate::hierarchy::{FolderComparison, Node};
use crate::registry::ObjectId;
use tracing::warn;
use twinsync_common::{
    Category, FileAttributes, FolderAttributes, LinkAttributes, PlainCategory, Side, SidePair,
    SyncDirection,
};

impl FolderComparison {
    pub fn set_category(&mut self, id: ObjectId, category: PlainCategory) {
        if self.folder(id).is_some() && category != PlainCategory::Equal {
            warn!("set_category: folder {} only takes plain category Equal, got {:?}", id, category);
            return;
        }
        let Some(obj) = self.fs_object_mut(id, "set_category") else {
            return;
        };
        obj.category = category.into();
        obj.category_descr.clear();
        self.notify_sync_cfg_changed(id);
    }

    pub fn set_category_conflict(&mut self, id: ObjectId, description: &str) {
        debug_assert!(!description.is_empty(), "conflict needs a description");
        self.set_described_category(id, Category::Conflict, description, "set_category_conflict");
    }

    pub fn set_category_diff_metadata(&mut self, id: ObjectId, description: &str) {
        debug_assert!(!description.is_empty(), "metadata difference needs a description");
        self.set_described_category(
            id,
            Category::DifferentMetadata,
            description,
            "set_category_diff_metadata",
        );
    }

    fn set_described_category(&mut self, id: ObjectId, category: Category, description: &str, operation: &str) {
        let Some(obj) = self.fs_object_mut(id, operation) else {
            return;
        };
        obj.category = category;
        obj.category_descr = description.to_string();
        self.notify_sync_cfg_changed(id);
    }

    /// Marks the item as gone on `side`
    ///
    /// Folders take their whole subtree with them. The node stays registered
    /// until [`prune_empty`](Self::prune_empty) runs.
    pub fn remove_object(&mut self, id: ObjectId, side: Side) {
        if let Some(children) = self.folder(id).map(|folder| folder.container.child_ids()) {
            for child in children {
                self.remove_object(child, side);
            }
        }

        let Some(node) = self.nodes.get_mut(id) else {
            warn!("remove_object: {} is not a live item", id);
            return;
        };
        match node {
            Node::File(file) => file.attrs[side] = FileAttributes::default(),
            Node::Symlink(symlink) => symlink.attrs[side] = LinkAttributes::default(),
            Node::Folder(folder) => folder.attrs[side] = FolderAttributes::default(),
            Node::Base(_) => {
                warn!("remove_object: {} is a base folder", id);
                return;
            }
        }
        let Some(obj) = node.fs_object_mut() else {
            return;
        };

        let old_name = obj.item_name(side).to_string();
        obj.item_names[side].clear();
        obj.category = if obj.is_empty(side.other()) {
            Category::Equal
        } else {
            Category::only_on(side.other())
        };
        obj.sync_dir = SyncDirection::None;
        obj.direction_conflict.clear();

        self.notify_sync_cfg_changed(id);
        self.propagate_changed_item_name(id, side, &old_name);
    }

    /// Records that both sides now hold the same item named `item_name`
    pub fn set_synced(&mut self, id: ObjectId, item_name: &str) {
        let Some(obj) = self.fs_object_mut(id, "set_synced") else {
            return;
        };
        debug_assert!(!obj.is_pair_empty(), "set_synced on a pair-empty item");

        let old_names = SidePair::new(
            obj.item_name(Side::Left).to_string(),
            obj.item_name(Side::Right).to_string(),
        );
        obj.item_names = SidePair::new(item_name.to_string(), item_name.to_string());
        obj.category = Category::Equal;
        obj.category_descr.clear();
        obj.sync_dir = SyncDirection::None;
        obj.direction_conflict.clear();

        self.notify_sync_cfg_changed(id);
        for side in Side::BOTH {
            self.propagate_changed_item_name(id, side, &old_names[side]);
        }
    }

    /// Post-sync update of a file copied to `target`
    pub fn set_file_synced_to(
        &mut self,
        id: ObjectId,
        target: Side,
        item_name: &str,
        target_attrs: FileAttributes,
        source_attrs: FileAttributes,
    ) {
        let Some(Node::File(file)) = self.nodes.get_mut(id) else {
            warn!("set_file_synced_to: {} is not a live file", id);
            return;
        };
        file.attrs[target] = target_attrs;
        file.attrs[target.other()] = source_attrs;
        self.detach_move_links(id);
        self.set_synced(id, item_name);
    }

    pub fn set_symlink_synced_to(
        &mut self,
        id: ObjectId,
        target: Side,
        item_name: &str,
        target_mod_time: i64,
        source_mod_time: i64,
    ) {
        let Some(Node::Symlink(symlink)) = self.nodes.get_mut(id) else {
            warn!("set_symlink_synced_to: {} is not a live symlink", id);
            return;
        };
        symlink.attrs[target] = LinkAttributes::new(target_mod_time);
        symlink.attrs[target.other()] = LinkAttributes::new(source_mod_time);
        self.set_synced(id, item_name);
    }

    pub fn set_folder_synced_to(
        &mut self,
        id: ObjectId,
        target: Side,
        item_name: &str,
        target_is_symlink: bool,
        source_is_symlink: bool,
    ) {
        let Some(Node::Folder(folder)) = self.nodes.get_mut(id) else {
            warn!("set_folder_synced_to: {} is not a live folder", id);
            return;
        };
        folder.attrs[target] = FolderAttributes::new(target_is_symlink);
        folder.attrs[target.other()] = FolderAttributes::new(source_is_symlink);
        self.set_synced(id, item_name);
    }

    /// Forgets the file identity on `side`, e.g. after the file was replaced
    pub fn clear_file_print(&mut self, id: ObjectId, side: Side) {
        match self.nodes.get_mut(id) {
            Some(Node::File(file)) => file.attrs[side].fingerprint = 0,
            _ => warn!("clear_file_print: {} is not a live file", id),
        }
    }
}
