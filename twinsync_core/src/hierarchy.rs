//! The comparison tree
//!
//! A [`FolderComparison`] owns every node of every compared folder pair in one
//! [`Registry`]. Nodes never hold references to each other, only [`ObjectId`]s,
//! so parent links, move links and externally held ids stay safe across any
//! structural change: a removed node's id just stops resolving.
//!
//! ```text
//!   BaseFolderPair ── Container ──┬── FilePair     (FsObject + file attributes)
//!                                 ├── SymlinkPair  (FsObject + link attributes)
//!                                 └── FolderPair   (FsObject + Container + folder attributes)
//! ```

use crate::registry::{ObjectId, Registry};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};
use twinsync_common::{
    AbstractPath, BaseFolderStatus, Category, CompareVariant, FileAttributes, FolderAttributes,
    FolderCategory, LinkAttributes, NullFilter, PathFilter, SessionId, Side, SidePair,
    SyncDirection, SyncOperation, DEFAULT_FILE_TIME_TOLERANCE,
};

/// Settings a folder pair was compared with; fixed for the lifetime of its root
#[derive(Debug, Clone)]
pub struct CompareSettings {
    /// Shared with whoever scanned the folders, never copied
    pub filter: Arc<dyn PathFilter>,
    pub compare_variant: CompareVariant,
    pub file_time_tolerance: i32,
    pub ignored_time_shift_minutes: Vec<u32>,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            filter: Arc::new(NullFilter),
            compare_variant: CompareVariant::default(),
            file_time_tolerance: DEFAULT_FILE_TIME_TOLERANCE,
            ignored_time_shift_minutes: Vec::new(),
        }
    }
}

/// State shared by files, symlinks and folders
#[derive(Debug, Clone)]
pub struct FsObject {
    /// An empty name means "does not exist on this side"
    pub(crate) item_names: SidePair<String>,
    pub(crate) category: Category,
    /// Only meaningful for `Conflict` and `DifferentMetadata`
    pub(crate) category_descr: String,
    pub(crate) sync_dir: SyncDirection,
    /// Non-empty only while `sync_dir == None`
    pub(crate) direction_conflict: String,
    pub(crate) active: bool,
    pub(crate) parent: ObjectId,
}

impl FsObject {
    fn new(item_names: SidePair<String>, category: Category, parent: ObjectId) -> Self {
        Self {
            item_names,
            category,
            category_descr: String::new(),
            sync_dir: SyncDirection::None,
            direction_conflict: String::new(),
            active: true,
            parent,
        }
    }

    pub fn is_empty(&self, side: Side) -> bool {
        self.item_names[side].is_empty()
    }

    pub fn is_pair_empty(&self) -> bool {
        self.is_empty(Side::Left) && self.is_empty(Side::Right)
    }

    /// Name on `side`, or the other side's name if the item does not exist there
    pub fn item_name(&self, side: Side) -> &str {
        let name = &self.item_names[side];
        if !name.is_empty() {
            return name;
        }
        &self.item_names[side.other()]
    }

    pub fn item_name_any(&self) -> &str {
        self.item_name(Side::Left)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Description attached to a `Conflict` or `DifferentMetadata` category
    pub fn category_extra_description(&self) -> Option<&str> {
        match self.category {
            Category::Conflict | Category::DifferentMetadata => Some(self.category_descr.as_str()),
            _ => None,
        }
    }

    pub fn sync_dir(&self) -> SyncDirection {
        self.sync_dir
    }

    /// Why no direction could be determined, if that is the case
    pub fn direction_conflict(&self) -> Option<&str> {
        if self.direction_conflict.is_empty() {
            None
        } else {
            Some(&self.direction_conflict)
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn parent(&self) -> ObjectId {
        self.parent
    }

    fn flip(&mut self) {
        self.item_names.swap();
        self.category = self.category.flipped();
    }
}

/// Child lists and cached relative paths of a folder or base folder
#[derive(Debug, Clone)]
pub struct Container {
    pub(crate) files: Vec<ObjectId>,
    pub(crate) symlinks: Vec<ObjectId>,
    pub(crate) folders: Vec<ObjectId>,
    /// '/'-separated, relative to the base folder, empty for the base itself
    pub(crate) rel_paths: SidePair<String>,
    pub(crate) base: ObjectId,
}

impl Container {
    fn new(rel_paths: SidePair<String>, base: ObjectId) -> Self {
        Self {
            files: Vec::new(),
            symlinks: Vec::new(),
            folders: Vec::new(),
            rel_paths,
            base,
        }
    }

    pub fn files(&self) -> &[ObjectId] {
        &self.files
    }

    pub fn symlinks(&self) -> &[ObjectId] {
        &self.symlinks
    }

    pub fn folders(&self) -> &[ObjectId] {
        &self.folders
    }

    pub fn relative_path(&self, side: Side) -> &str {
        &self.rel_paths[side]
    }

    pub fn base(&self) -> ObjectId {
        self.base
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.symlinks.is_empty() && self.folders.is_empty()
    }

    /// Files, then symlinks, then folders
    pub fn child_ids(&self) -> Vec<ObjectId> {
        self.files
            .iter()
            .chain(&self.symlinks)
            .chain(&self.folders)
            .copied()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FilePair {
    pub(crate) obj: FsObject,
    pub(crate) attrs: SidePair<FileAttributes>,
    /// Counterpart of a detected rename
    pub(crate) move_ref: Option<ObjectId>,
    /// Last file whose move link was pointed at this one
    pub(crate) move_back_ref: Option<ObjectId>,
}

impl FilePair {
    pub fn obj(&self) -> &FsObject {
        &self.obj
    }

    pub fn attributes(&self, side: Side) -> FileAttributes {
        self.attrs[side]
    }

    pub fn mod_time(&self, side: Side) -> i64 {
        self.attrs[side].mod_time
    }

    pub fn file_size(&self, side: Side) -> u64 {
        self.attrs[side].file_size
    }

    pub fn fingerprint(&self, side: Side) -> u64 {
        self.attrs[side].fingerprint
    }

    pub fn is_followed_symlink(&self, side: Side) -> bool {
        self.attrs[side].is_followed_symlink
    }

    pub fn move_ref(&self) -> Option<ObjectId> {
        self.move_ref
    }
}

/// A symbolic link that is never dereferenced
#[derive(Debug, Clone)]
pub struct SymlinkPair {
    pub(crate) obj: FsObject,
    pub(crate) attrs: SidePair<LinkAttributes>,
}

impl SymlinkPair {
    pub fn obj(&self) -> &FsObject {
        &self.obj
    }

    /// Write time of the link itself, not its target
    pub fn mod_time(&self, side: Side) -> i64 {
        self.attrs[side].mod_time
    }
}

#[derive(Debug)]
pub struct FolderPair {
    pub(crate) obj: FsObject,
    pub(crate) container: Container,
    pub(crate) attrs: SidePair<FolderAttributes>,
    /// Depends on all descendants; reset by `notify_sync_cfg_changed`
    pub(crate) sync_op_buffered: OnceLock<SyncOperation>,
}

impl FolderPair {
    pub fn obj(&self) -> &FsObject {
        &self.obj
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn folder_category(&self) -> FolderCategory {
        FolderCategory::from_category(self.obj.category).unwrap_or(FolderCategory::Conflict)
    }

    pub fn is_followed_symlink(&self, side: Side) -> bool {
        self.attrs[side].is_followed_symlink
    }
}

/// Root of one compared folder pair
#[derive(Debug)]
pub struct BaseFolderPair {
    pub(crate) container: Container,
    pub(crate) folder_paths: SidePair<AbstractPath>,
    pub(crate) folder_status: SidePair<BaseFolderStatus>,
    pub(crate) settings: CompareSettings,
}

impl BaseFolderPair {
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn abstract_path(&self, side: Side) -> &AbstractPath {
        &self.folder_paths[side]
    }

    /// Status at the time of comparison, unless updated since
    pub fn folder_status(&self, side: Side) -> BaseFolderStatus {
        self.folder_status[side]
    }

    pub fn settings(&self) -> &CompareSettings {
        &self.settings
    }

    pub fn filter(&self) -> &dyn PathFilter {
        self.settings.filter.as_ref()
    }

    pub fn compare_variant(&self) -> CompareVariant {
        self.settings.compare_variant
    }

    pub fn file_time_tolerance(&self) -> i32 {
        self.settings.file_time_tolerance
    }

    pub fn ignored_time_shift(&self) -> &[u32] {
        &self.settings.ignored_time_shift_minutes
    }
}

#[derive(Debug)]
pub enum Node {
    Base(BaseFolderPair),
    Folder(FolderPair),
    File(FilePair),
    Symlink(SymlinkPair),
}

impl Node {
    /// `None` for base folders
    pub fn fs_object(&self) -> Option<&FsObject> {
        match self {
            Node::Base(_) => None,
            Node::Folder(folder) => Some(&folder.obj),
            Node::File(file) => Some(&file.obj),
            Node::Symlink(symlink) => Some(&symlink.obj),
        }
    }

    pub(crate) fn fs_object_mut(&mut self) -> Option<&mut FsObject> {
        match self {
            Node::Base(_) => None,
            Node::Folder(folder) => Some(&mut folder.obj),
            Node::File(file) => Some(&mut file.obj),
            Node::Symlink(symlink) => Some(&mut symlink.obj),
        }
    }

    /// `None` for files and symlinks
    pub fn container(&self) -> Option<&Container> {
        match self {
            Node::Base(base) => Some(&base.container),
            Node::Folder(folder) => Some(&folder.container),
            Node::File(_) | Node::Symlink(_) => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut Container> {
        match self {
            Node::Base(base) => Some(&mut base.container),
            Node::Folder(folder) => Some(&mut folder.container),
            Node::File(_) | Node::Symlink(_) => None,
        }
    }
}

fn append_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// All compared folder pairs of one comparison run
#[derive(Debug)]
pub struct FolderComparison {
    session: SessionId,
    pub(crate) nodes: Registry<Node>,
    bases: Vec<ObjectId>,
}

impl Default for FolderComparison {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderComparison {
    pub fn new() -> Self {
        Self {
            session: SessionId::new(),
            nodes: Registry::new(),
            bases: Vec::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    /// Root ids, in the order the folder pairs were added
    pub fn bases(&self) -> &[ObjectId] {
        &self.bases
    }

    /// Number of live nodes, roots included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains(id)
    }

    /// Resolves an id; `None` once the node has been pruned
    pub fn node(&self, id: ObjectId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn fs_object(&self, id: ObjectId) -> Option<&FsObject> {
        self.nodes.get(id)?.fs_object()
    }

    pub fn container(&self, id: ObjectId) -> Option<&Container> {
        self.nodes.get(id)?.container()
    }

    pub fn file(&self, id: ObjectId) -> Option<&FilePair> {
        match self.nodes.get(id)? {
            Node::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn folder(&self, id: ObjectId) -> Option<&FolderPair> {
        match self.nodes.get(id)? {
            Node::Folder(folder) => Some(folder),
            _ => None,
        }
    }

    pub fn symlink(&self, id: ObjectId) -> Option<&SymlinkPair> {
        match self.nodes.get(id)? {
            Node::Symlink(symlink) => Some(symlink),
            _ => None,
        }
    }

    pub fn base(&self, id: ObjectId) -> Option<&BaseFolderPair> {
        match self.nodes.get(id)? {
            Node::Base(base) => Some(base),
            _ => None,
        }
    }

    /// Root the node belongs to
    pub fn base_of(&self, id: ObjectId) -> Option<ObjectId> {
        match self.nodes.get(id)? {
            Node::Base(_) => Some(id),
            Node::Folder(folder) => Some(folder.container.base),
            Node::File(file) => self.container(file.obj.parent).map(Container::base),
            Node::Symlink(symlink) => self.container(symlink.obj.parent).map(Container::base),
        }
    }

    /// Path relative to the base folder ('/'-separated); valid even if the item
    /// does not exist on `side`
    pub fn relative_path(&self, id: ObjectId, side: Side) -> Option<String> {
        match self.nodes.get(id)? {
            Node::Base(base) => Some(base.container.rel_paths[side].clone()),
            Node::Folder(folder) => Some(folder.container.rel_paths[side].clone()),
            Node::File(file) => self.child_path(&file.obj, side),
            Node::Symlink(symlink) => self.child_path(&symlink.obj, side),
        }
    }

    pub fn abstract_path(&self, id: ObjectId, side: Side) -> Option<AbstractPath> {
        let base = self.base(self.base_of(id)?)?;
        let rel_path = self.relative_path(id, side)?;
        Some(base.folder_paths[side].append_rel_path(&rel_path))
    }

    fn child_path(&self, obj: &FsObject, side: Side) -> Option<String> {
        let parent = self.container(obj.parent)?;
        Some(append_path(&parent.rel_paths[side], obj.item_name(side)))
    }

    // ------------------------------------------------------------------
    // population

    pub fn add_base_folder_pair(
        &mut self,
        folder_paths: SidePair<AbstractPath>,
        folder_status: SidePair<BaseFolderStatus>,
        settings: CompareSettings,
    ) -> ObjectId {
        let id = self.nodes.next_id();
        let inserted = self.nodes.insert(Node::Base(BaseFolderPair {
            container: Container::new(SidePair::default(), id),
            folder_paths,
            folder_status,
            settings,
        }));
        debug_assert_eq!(id, inserted);
        self.bases.push(id);
        id
    }

    /// Adds a folder existing on both sides (or neither, with empty names)
    pub fn add_folder(
        &mut self,
        parent: ObjectId,
        name_left: &str,
        attr_left: FolderAttributes,
        category: FolderCategory,
        name_right: &str,
        attr_right: FolderAttributes,
    ) -> ObjectId {
        let names = SidePair::new(name_left.to_string(), name_right.to_string());
        let attrs = SidePair::new(attr_left, attr_right);
        self.insert_folder(parent, names, category.into(), attrs)
    }

    /// Adds a folder existing on `side` only
    pub fn add_folder_on(
        &mut self,
        parent: ObjectId,
        side: Side,
        name: &str,
        attr: FolderAttributes,
    ) -> ObjectId {
        let names = SidePair::one_sided(side, name.to_string());
        let attrs = SidePair::one_sided(side, attr);
        self.insert_folder(parent, names, Category::only_on(side), attrs)
    }

    pub fn add_file(
        &mut self,
        parent: ObjectId,
        name_left: &str,
        attr_left: FileAttributes,
        category: Category,
        name_right: &str,
        attr_right: FileAttributes,
    ) -> ObjectId {
        let obj = FsObject::new(
            SidePair::new(name_left.to_string(), name_right.to_string()),
            category,
            parent,
        );
        self.attach(
            parent,
            Node::File(FilePair {
                obj,
                attrs: SidePair::new(attr_left, attr_right),
                move_ref: None,
                move_back_ref: None,
            }),
        )
    }

    pub fn add_file_on(&mut self, parent: ObjectId, side: Side, name: &str, attr: FileAttributes) -> ObjectId {
        let obj = FsObject::new(SidePair::one_sided(side, name.to_string()), Category::only_on(side), parent);
        self.attach(
            parent,
            Node::File(FilePair {
                obj,
                attrs: SidePair::one_sided(side, attr),
                move_ref: None,
                move_back_ref: None,
            }),
        )
    }

    pub fn add_symlink(
        &mut self,
        parent: ObjectId,
        name_left: &str,
        attr_left: LinkAttributes,
        category: Category,
        name_right: &str,
        attr_right: LinkAttributes,
    ) -> ObjectId {
        let obj = FsObject::new(
            SidePair::new(name_left.to_string(), name_right.to_string()),
            category,
            parent,
        );
        self.attach(
            parent,
            Node::Symlink(SymlinkPair {
                obj,
                attrs: SidePair::new(attr_left, attr_right),
            }),
        )
    }

    pub fn add_symlink_on(&mut self, parent: ObjectId, side: Side, name: &str, attr: LinkAttributes) -> ObjectId {
        let obj = FsObject::new(SidePair::one_sided(side, name.to_string()), Category::only_on(side), parent);
        self.attach(
            parent,
            Node::Symlink(SymlinkPair {
                obj,
                attrs: SidePair::one_sided(side, attr),
            }),
        )
    }

    fn insert_folder(
        &mut self,
        parent: ObjectId,
        names: SidePair<String>,
        category: Category,
        attrs: SidePair<FolderAttributes>,
    ) -> ObjectId {
        let Some(parent_container) = self.container(parent) else {
            panic!("cannot add a folder below {parent}: not a live container");
        };
        let obj = FsObject::new(names, category, parent);
        let rel_paths = SidePair::new(
            append_path(&parent_container.rel_paths.left, obj.item_name(Side::Left)),
            append_path(&parent_container.rel_paths.right, obj.item_name(Side::Right)),
        );
        let container = Container::new(rel_paths, parent_container.base);

        self.attach(
            parent,
            Node::Folder(FolderPair {
                obj,
                container,
                attrs,
                sync_op_buffered: OnceLock::new(),
            }),
        )
    }

    fn attach(&mut self, parent: ObjectId, node: Node) -> ObjectId {
        if self.container(parent).is_none() {
            panic!("cannot add an item below {parent}: not a live container");
        }
        let is_file = matches!(node, Node::File(_));
        let is_symlink = matches!(node, Node::Symlink(_));
        let id = self.nodes.insert(node);

        if let Some(container) = self.nodes.get_mut(parent).and_then(Node::container_mut) {
            if is_file {
                container.files.push(id);
            } else if is_symlink {
                container.symlinks.push(id);
            } else {
                container.folders.push(id);
            }
        }
        self.notify_sync_cfg_changed(parent);
        id
    }

    // ------------------------------------------------------------------
    // maintenance

    /// Updates a base folder's status, e.g. after the folder was created
    pub fn set_folder_status(&mut self, base: ObjectId, side: Side, status: BaseFolderStatus) {
        match self.nodes.get_mut(base) {
            Some(Node::Base(base)) => base.folder_status[side] = status,
            _ => warn!("set_folder_status: {} is not a live base folder", base),
        }
    }

    /// Exchanges left and right for a whole folder pair
    ///
    /// Names, attributes, relative paths, categories, base paths and base
    /// statuses are swapped. Stored sync directions are left untouched.
    pub fn flip(&mut self, base: ObjectId) {
        match self.nodes.get_mut(base) {
            Some(Node::Base(base_folder)) => {
                base_folder.folder_paths.swap();
                base_folder.folder_status.swap();
            }
            _ => {
                warn!("flip: {} is not a live base folder", base);
                return;
            }
        }
        self.flip_container(base);
        debug!("Flipped folder pair {}", base);
    }

    pub fn flip_all(&mut self) {
        for base in self.bases.clone() {
            self.flip(base);
        }
    }

    fn flip_container(&mut self, id: ObjectId) {
        let children = match self.nodes.get_mut(id).and_then(Node::container_mut) {
            Some(container) => {
                container.rel_paths.swap();
                container.child_ids()
            }
            None => return,
        };

        for child in children {
            let is_folder = match self.nodes.get_mut(child) {
                Some(Node::File(file)) => {
                    file.obj.flip();
                    file.attrs.swap();
                    false
                }
                Some(Node::Symlink(symlink)) => {
                    symlink.obj.flip();
                    symlink.attrs.swap();
                    false
                }
                Some(Node::Folder(folder)) => {
                    folder.obj.flip();
                    folder.attrs.swap();
                    folder.sync_op_buffered.take();
                    true
                }
                Some(Node::Base(_)) | None => false,
            };
            if is_folder {
                self.flip_container(child);
            }
        }
    }

    /// Invalidates every buffered folder operation that may depend on `id`
    ///
    /// Walks from `id` up to its root. For files with a move counterpart the
    /// counterpart's ancestors are invalidated as well, whichever end holds
    /// the link.
    pub(crate) fn notify_sync_cfg_changed(&mut self, id: ObjectId) {
        if let Some(counterpart) = self.move_counterpart(id) {
            self.invalidate_ancestors(counterpart);
        }
        self.invalidate_ancestors(id);
    }

    pub(crate) fn invalidate_ancestors(&mut self, mut id: ObjectId) {
        loop {
            id = match self.nodes.get_mut(id) {
                Some(Node::Folder(folder)) => {
                    folder.sync_op_buffered.take();
                    folder.obj.parent
                }
                Some(Node::File(file)) => file.obj.parent,
                Some(Node::Symlink(symlink)) => symlink.obj.parent,
                Some(Node::Base(_)) | None => return,
            };
        }
    }

    /// Keeps cached folder paths in sync after a name on `side` changed
    pub(crate) fn propagate_changed_item_name(&mut self, id: ObjectId, side: Side, old_name: &str) {
        let Some(Node::Folder(folder)) = self.nodes.get(id) else {
            return;
        };
        // both sides may just have been removed
        if folder.obj.is_pair_empty() {
            return;
        }
        if folder.obj.item_name(side) != old_name {
            self.update_rel_paths_recursion(id, side);
        }
    }

    fn update_rel_paths_recursion(&mut self, folder_id: ObjectId, side: Side) {
        let Some(Node::Folder(folder)) = self.nodes.get(folder_id) else {
            return;
        };
        let parent_path = self
            .container(folder.obj.parent)
            .map(|parent| parent.rel_paths[side].clone())
            .unwrap_or_default();
        let rel_path = append_path(&parent_path, folder.obj.item_name(side));
        let subfolders = folder.container.folders.clone();

        if let Some(Node::Folder(folder)) = self.nodes.get_mut(folder_id) {
            folder.container.rel_paths[side] = rel_path;
        }
        for subfolder in subfolders {
            self.update_rel_paths_recursion(subfolder, side);
        }
    }

    pub(crate) fn fs_object_mut(&mut self, id: ObjectId, operation: &str) -> Option<&mut FsObject> {
        let obj = self.nodes.get_mut(id).and_then(Node::fs_object_mut);
        if obj.is_none() {
            warn!("{}: {} is not a live item", operation, id);
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_base() -> (FolderComparison, ObjectId) {
        let mut tree = FolderComparison::new();
        let base = tree.add_base_folder_pair(
            SidePair::new(AbstractPath::new("/left"), AbstractPath::new("/right")),
            SidePair::new(BaseFolderStatus::Existing, BaseFolderStatus::NotExisting),
            CompareSettings::default(),
        );
        (tree, base)
    }

    #[test]
    fn test_relative_paths() {
        let (mut tree, base) = tree_with_base();
        let docs = tree.add_folder(base, "Docs", FolderAttributes::default(), FolderCategory::Equal, "docs", FolderAttributes::default());
        let file = tree.add_file_on(docs, Side::Left, "a.txt", FileAttributes::new(10, 1, 0, false));
        let link = tree.add_symlink_on(docs, Side::Right, "ln", LinkAttributes::new(3));

        assert_eq!(tree.relative_path(base, Side::Left).unwrap(), "");
        assert_eq!(tree.relative_path(docs, Side::Left).unwrap(), "Docs");
        assert_eq!(tree.relative_path(docs, Side::Right).unwrap(), "docs");
        assert_eq!(tree.relative_path(file, Side::Right).unwrap(), "docs/a.txt");
        assert_eq!(tree.relative_path(link, Side::Left).unwrap(), "Docs/ln");
        assert_eq!(
            tree.abstract_path(file, Side::Left).unwrap(),
            AbstractPath::new("/left/Docs/a.txt")
        );
    }

    #[test]
    fn test_children_are_listed_by_kind() {
        let (mut tree, base) = tree_with_base();
        let file = tree.add_file_on(base, Side::Left, "f", FileAttributes::default());
        let folder = tree.add_folder_on(base, Side::Right, "d", FolderAttributes::default());
        let link = tree.add_symlink_on(base, Side::Left, "l", LinkAttributes::default());

        let container = tree.container(base).unwrap();
        assert_eq!(container.files(), &[file]);
        assert_eq!(container.folders(), &[folder]);
        assert_eq!(container.symlinks(), &[link]);
        assert_eq!(container.child_ids(), vec![file, link, folder]);
        assert_eq!(tree.base_of(file), Some(base));
        assert_eq!(tree.base_of(folder), Some(base));
        assert_eq!(tree.fs_object(file).unwrap().parent(), base);
    }

    #[test]
    fn test_one_sided_constructors() {
        let (mut tree, base) = tree_with_base();
        let file = tree.add_file_on(base, Side::Right, "b.txt", FileAttributes::new(5, 7, 42, false));
        let file = tree.file(file).unwrap();

        assert_eq!(file.obj().category(), Category::RightOnly);
        assert!(file.obj().is_empty(Side::Left));
        assert_eq!(file.obj().item_name(Side::Left), "b.txt");
        assert_eq!(file.file_size(Side::Right), 7);
        assert_eq!(file.attributes(Side::Left), FileAttributes::default());
        assert!(file.obj().is_active());
        assert_eq!(file.obj().sync_dir(), SyncDirection::None);
    }

    #[test]
    fn test_flip_swaps_base_and_items() {
        let (mut tree, base) = tree_with_base();
        let sub = tree.add_folder_on(base, Side::Left, "sub", FolderAttributes::new(true));
        let file = tree.add_file(
            sub,
            "x",
            FileAttributes::new(20, 1, 0, false),
            Category::LeftNewer,
            "x",
            FileAttributes::new(10, 1, 0, false),
        );

        tree.flip(base);

        let base_folder = tree.base(base).unwrap();
        assert_eq!(base_folder.abstract_path(Side::Left), &AbstractPath::new("/right"));
        assert_eq!(base_folder.folder_status(Side::Right), BaseFolderStatus::Existing);

        let sub_folder = tree.folder(sub).unwrap();
        assert_eq!(sub_folder.folder_category(), FolderCategory::RightOnly);
        assert!(sub_folder.is_followed_symlink(Side::Right));
        assert!(sub_folder.obj().is_empty(Side::Left));

        let file = tree.file(file).unwrap();
        assert_eq!(file.obj().category(), Category::RightNewer);
        assert_eq!(file.mod_time(Side::Right), 20);
    }

    #[test]
    fn test_set_folder_status() {
        let (mut tree, base) = tree_with_base();
        tree.set_folder_status(base, Side::Right, BaseFolderStatus::Existing);
        assert_eq!(tree.base(base).unwrap().folder_status(Side::Right), BaseFolderStatus::Existing);
    }

    #[test]
    #[should_panic]
    fn test_adding_below_a_file_panics() {
        let (mut tree, base) = tree_with_base();
        let file = tree.add_file_on(base, Side::Left, "f", FileAttributes::default());
        tree.add_file_on(file, Side::Left, "g", FileAttributes::default());
    }
}
