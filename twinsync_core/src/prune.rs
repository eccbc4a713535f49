//! Physical removal of items that are gone on both sides

use crate::hierarchy::{FolderComparison, Node};
use crate::registry::ObjectId;
use std::collections::HashSet;
use tracing::debug;

impl FolderComparison {
    /// Frees every pair-empty item below the container `id`
    ///
    /// Returns the number of freed nodes, subtrees included. Ids of freed
    /// nodes stop resolving.
    pub fn prune_empty(&mut self, id: ObjectId) -> usize {
        let removed = self.prune_rec(id);
        if removed > 0 {
            debug!("Pruned {} pair-empty items below {}", removed, id);
        }
        removed
    }

    /// Runs [`prune_empty`](Self::prune_empty) on every base folder
    pub fn prune_all_empty(&mut self) -> usize {
        self.bases().to_vec().into_iter().map(|base| self.prune_empty(base)).sum()
    }

    fn prune_rec(&mut self, id: ObjectId) -> usize {
        let Some(container) = self.container(id) else {
            return 0;
        };
        let mut removed = 0;
        for folder in container.folders.clone() {
            removed += self.prune_rec(folder);
        }

        let Some(container) = self.container(id) else {
            return removed;
        };
        let empty: HashSet<ObjectId> = container
            .child_ids()
            .into_iter()
            .filter(|&child| self.fs_object(child).map_or(false, |obj| obj.is_pair_empty()))
            .collect();
        if empty.is_empty() {
            return removed;
        }

        if let Some(container) = self.nodes.get_mut(id).and_then(Node::container_mut) {
            container.files.retain(|child| !empty.contains(child));
            container.symlinks.retain(|child| !empty.contains(child));
            container.folders.retain(|child| !empty.contains(child));
        }
        for child in empty {
            removed += self.free_subtree(child);
        }
        self.notify_sync_cfg_changed(id);
        removed
    }

    fn free_subtree(&mut self, id: ObjectId) -> usize {
        let Some(node) = self.nodes.remove(id) else {
            return 0;
        };
        match node {
            Node::Folder(folder) => {
                1 + folder
                    .container
                    .child_ids()
                    .into_iter()
                    .map(|child| self.free_subtree(child))
                    .sum::<usize>()
            }
            Node::File(file) => {
                for counterpart in [file.move_ref, file.move_back_ref].into_iter().flatten() {
                    self.invalidate_ancestors(counterpart);
                }
                1
            }
            Node::Symlink(_) | Node::Base(_) => 1,
        }
    }
}
