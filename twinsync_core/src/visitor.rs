//! Traversal helpers
//!
//! Every level is visited files first, then symlinks, then each folder
//! followed by its own subtree.

use crate::hierarchy::{Container, FilePair, FolderComparison, FolderPair, Node, SymlinkPair};
use crate::registry::ObjectId;

/// Calls exactly one of the callbacks for `id`; `None` for base folders and dead ids
pub fn visit_fs_object<'a, R>(
    tree: &'a FolderComparison,
    id: ObjectId,
    on_folder: impl FnOnce(ObjectId, &'a FolderPair) -> R,
    on_file: impl FnOnce(ObjectId, &'a FilePair) -> R,
    on_symlink: impl FnOnce(ObjectId, &'a SymlinkPair) -> R,
) -> Option<R> {
    match tree.node(id)? {
        Node::Folder(folder) => Some(on_folder(id, folder)),
        Node::File(file) => Some(on_file(id, file)),
        Node::Symlink(symlink) => Some(on_symlink(id, symlink)),
        Node::Base(_) => None,
    }
}

/// Visits everything below the container `id` (a base folder or a folder)
pub fn visit_recursively<'a>(
    tree: &'a FolderComparison,
    id: ObjectId,
    mut on_folder: impl FnMut(ObjectId, &'a FolderPair),
    mut on_file: impl FnMut(ObjectId, &'a FilePair),
    mut on_symlink: impl FnMut(ObjectId, &'a SymlinkPair),
) {
    if let Some(container) = tree.container(id) {
        walk(tree, container, &mut on_folder, &mut on_file, &mut on_symlink);
    }
}

/// Like [`visit_recursively`], but includes `id` itself
pub fn visit_fs_object_recursively<'a>(
    tree: &'a FolderComparison,
    id: ObjectId,
    mut on_folder: impl FnMut(ObjectId, &'a FolderPair),
    mut on_file: impl FnMut(ObjectId, &'a FilePair),
    mut on_symlink: impl FnMut(ObjectId, &'a SymlinkPair),
) {
    match tree.node(id) {
        Some(Node::Folder(folder)) => {
            on_folder(id, folder);
            walk(tree, &folder.container, &mut on_folder, &mut on_file, &mut on_symlink);
        }
        Some(Node::File(file)) => on_file(id, file),
        Some(Node::Symlink(symlink)) => on_symlink(id, symlink),
        Some(Node::Base(base)) => walk(tree, &base.container, &mut on_folder, &mut on_file, &mut on_symlink),
        None => {}
    }
}

fn walk<'a, D, F, S>(
    tree: &'a FolderComparison,
    container: &'a Container,
    on_folder: &mut D,
    on_file: &mut F,
    on_symlink: &mut S,
) where
    D: FnMut(ObjectId, &'a FolderPair),
    F: FnMut(ObjectId, &'a FilePair),
    S: FnMut(ObjectId, &'a SymlinkPair),
{
    for &id in &container.files {
        if let Some(file) = tree.file(id) {
            on_file(id, file);
        }
    }
    for &id in &container.symlinks {
        if let Some(symlink) = tree.symlink(id) {
            on_symlink(id, symlink);
        }
    }
    for &id in &container.folders {
        if let Some(folder) = tree.folder(id) {
            on_folder(id, folder);
            walk(tree, &folder.container, on_folder, on_file, on_symlink);
        }
    }
}

/// Mutable traversal below the container `id`
///
/// Callbacks get the tree back and may change names, categories, directions
/// or mark items removed. Child lists are read once per level, so children
/// added during the walk are not visited.
pub fn visit_recursively_mut(
    tree: &mut FolderComparison,
    id: ObjectId,
    mut on_folder: impl FnMut(&mut FolderComparison, ObjectId),
    mut on_file: impl FnMut(&mut FolderComparison, ObjectId),
    mut on_symlink: impl FnMut(&mut FolderComparison, ObjectId),
) {
    walk_mut(tree, id, &mut on_folder, &mut on_file, &mut on_symlink);
}

fn walk_mut<D, F, S>(tree: &mut FolderComparison, id: ObjectId, on_folder: &mut D, on_file: &mut F, on_symlink: &mut S)
where
    D: FnMut(&mut FolderComparison, ObjectId),
    F: FnMut(&mut FolderComparison, ObjectId),
    S: FnMut(&mut FolderComparison, ObjectId),
{
    let Some(container) = tree.container(id) else {
        return;
    };
    let files = container.files.clone();
    let symlinks = container.symlinks.clone();
    let folders = container.folders.clone();

    for file in files {
        if tree.contains(file) {
            on_file(tree, file);
        }
    }
    for symlink in symlinks {
        if tree.contains(symlink) {
            on_symlink(tree, symlink);
        }
    }
    for folder in folders {
        if tree.contains(folder) {
            on_folder(tree, folder);
            walk_mut(tree, folder, on_folder, on_file, on_symlink);
        }
    }
}
