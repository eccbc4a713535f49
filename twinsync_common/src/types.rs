use crate::Side;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Opaque per-file identity supplied by the filesystem layer (0 = unavailable)
pub type FingerPrint = u64;

/// Kind of a scanned filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Folder,
    Symlink,
}

/// A scanned entry, relative to the root it was found under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    /// Seconds since the Unix epoch
    pub modified: i64,
    pub fingerprint: FingerPrint,
    pub is_followed_symlink: bool,
}

/// Per-side attributes of a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileAttributes {
    /// Seconds since the Unix epoch
    pub mod_time: i64,
    pub file_size: u64,
    pub fingerprint: FingerPrint,
    pub is_followed_symlink: bool,
}

impl FileAttributes {
    pub fn new(mod_time: i64, file_size: u64, fingerprint: FingerPrint, is_followed_symlink: bool) -> Self {
        Self {
            mod_time,
            file_size,
            fingerprint,
            is_followed_symlink,
        }
    }
}

/// Per-side attributes of a symlink (the link itself, never its target)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkAttributes {
    pub mod_time: i64,
}

impl LinkAttributes {
    pub fn new(mod_time: i64) -> Self {
        Self { mod_time }
    }
}

/// Per-side attributes of a folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderAttributes {
    pub is_followed_symlink: bool,
}

impl FolderAttributes {
    pub fn new(is_followed_symlink: bool) -> Self {
        Self { is_followed_symlink }
    }
}

/// How two files are decided to be equal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareVariant {
    #[default]
    TimeSize,
    Content,
    Size,
}

impl fmt::Display for CompareVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareVariant::TimeSize => write!(f, "time and size"),
            CompareVariant::Content => write!(f, "content"),
            CompareVariant::Size => write!(f, "size"),
        }
    }
}

/// Difference state of a paired item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Equal,
    DifferentContent,
    DifferentMetadata,
    LeftOnly,
    RightOnly,
    LeftNewer,
    RightNewer,
    Conflict,
}

impl Category {
    /// Category as seen with left and right exchanged
    pub fn flipped(self) -> Category {
        match self {
            Category::LeftOnly => Category::RightOnly,
            Category::RightOnly => Category::LeftOnly,
            Category::LeftNewer => Category::RightNewer,
            Category::RightNewer => Category::LeftNewer,
            Category::Equal
            | Category::DifferentContent
            | Category::DifferentMetadata
            | Category::Conflict => self,
        }
    }

    /// Category of an item that exists on `side` only
    pub fn only_on(side: Side) -> Category {
        match side {
            Side::Left => Category::LeftOnly,
            Side::Right => Category::RightOnly,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::Equal => "Both sides are equal",
            Category::DifferentContent => "Items have different content",
            Category::DifferentMetadata => "Items have different attributes",
            Category::LeftOnly => "Item exists on left side only",
            Category::RightOnly => "Item exists on right side only",
            Category::LeftNewer => "Left side is newer",
            Category::RightNewer => "Right side is newer",
            Category::Conflict => "Conflict/item cannot be categorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Category::Equal => "equal",
            Category::DifferentContent => "different",
            Category::DifferentMetadata => "metadata",
            Category::LeftOnly => "left-only",
            Category::RightOnly => "right-only",
            Category::LeftNewer => "left-newer",
            Category::RightNewer => "right-newer",
            Category::Conflict => "conflict",
        };
        f.write_str(text)
    }
}

/// The categories that can be assigned without a description or a name change
///
/// `Conflict` and `DifferentMetadata` carry a description, `LeftOnly`/`RightOnly`
/// follow from which names are present; none of those can be expressed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlainCategory {
    Equal,
    DifferentContent,
    LeftNewer,
    RightNewer,
}

impl From<PlainCategory> for Category {
    fn from(category: PlainCategory) -> Self {
        match category {
            PlainCategory::Equal => Category::Equal,
            PlainCategory::DifferentContent => Category::DifferentContent,
            PlainCategory::LeftNewer => Category::LeftNewer,
            PlainCategory::RightNewer => Category::RightNewer,
        }
    }
}

/// The subset of [`Category`] that is meaningful for folders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderCategory {
    Equal,
    LeftOnly,
    RightOnly,
    DifferentMetadata,
    Conflict,
}

impl From<FolderCategory> for Category {
    fn from(category: FolderCategory) -> Self {
        match category {
            FolderCategory::Equal => Category::Equal,
            FolderCategory::LeftOnly => Category::LeftOnly,
            FolderCategory::RightOnly => Category::RightOnly,
            FolderCategory::DifferentMetadata => Category::DifferentMetadata,
            FolderCategory::Conflict => Category::Conflict,
        }
    }
}

impl FolderCategory {
    /// Narrows a category; content and time categories have no folder meaning
    pub fn from_category(category: Category) -> Option<FolderCategory> {
        match category {
            Category::Equal => Some(FolderCategory::Equal),
            Category::LeftOnly => Some(FolderCategory::LeftOnly),
            Category::RightOnly => Some(FolderCategory::RightOnly),
            Category::DifferentMetadata => Some(FolderCategory::DifferentMetadata),
            Category::Conflict => Some(FolderCategory::Conflict),
            Category::DifferentContent | Category::LeftNewer | Category::RightNewer => None,
        }
    }
}

/// Which side's state should overwrite the other
///
/// `Left` means the left side wins and its state is written to the right side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncDirection {
    #[default]
    None,
    Left,
    Right,
}

impl SyncDirection {
    /// The side whose data is copied, if any
    pub fn source(self) -> Option<Side> {
        match self {
            SyncDirection::None => None,
            SyncDirection::Left => Some(Side::Left),
            SyncDirection::Right => Some(Side::Right),
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::None => write!(f, "none"),
            SyncDirection::Left => write!(f, "left"),
            SyncDirection::Right => write!(f, "right"),
        }
    }
}

/// The concrete action resolved for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncOperation {
    CreateLeft,
    CreateRight,
    DeleteLeft,
    DeleteRight,
    /// Source of a rename on the left side (the old name disappears)
    MoveLeftFrom,
    /// Target of a rename on the left side (the new name appears)
    MoveLeftTo,
    MoveRightFrom,
    MoveRightTo,
    OverwriteLeft,
    OverwriteRight,
    CopyMetadataToLeft,
    CopyMetadataToRight,
    DoNothing,
    UnresolvedConflict,
}

impl SyncOperation {
    pub fn create_on(side: Side) -> SyncOperation {
        match side {
            Side::Left => SyncOperation::CreateLeft,
            Side::Right => SyncOperation::CreateRight,
        }
    }

    pub fn delete_on(side: Side) -> SyncOperation {
        match side {
            Side::Left => SyncOperation::DeleteLeft,
            Side::Right => SyncOperation::DeleteRight,
        }
    }

    pub fn overwrite_on(side: Side) -> SyncOperation {
        match side {
            Side::Left => SyncOperation::OverwriteLeft,
            Side::Right => SyncOperation::OverwriteRight,
        }
    }

    pub fn copy_metadata_to(side: Side) -> SyncOperation {
        match side {
            Side::Left => SyncOperation::CopyMetadataToLeft,
            Side::Right => SyncOperation::CopyMetadataToRight,
        }
    }

    pub fn move_from(side: Side) -> SyncOperation {
        match side {
            Side::Left => SyncOperation::MoveLeftFrom,
            Side::Right => SyncOperation::MoveRightFrom,
        }
    }

    pub fn move_to(side: Side) -> SyncOperation {
        match side {
            Side::Left => SyncOperation::MoveLeftTo,
            Side::Right => SyncOperation::MoveRightTo,
        }
    }

    /// The side that gets modified, if any
    pub fn target_side(self) -> Option<Side> {
        match self {
            SyncOperation::CreateLeft
            | SyncOperation::DeleteLeft
            | SyncOperation::MoveLeftFrom
            | SyncOperation::MoveLeftTo
            | SyncOperation::OverwriteLeft
            | SyncOperation::CopyMetadataToLeft => Some(Side::Left),
            SyncOperation::CreateRight
            | SyncOperation::DeleteRight
            | SyncOperation::MoveRightFrom
            | SyncOperation::MoveRightTo
            | SyncOperation::OverwriteRight
            | SyncOperation::CopyMetadataToRight => Some(Side::Right),
            SyncOperation::DoNothing | SyncOperation::UnresolvedConflict => None,
        }
    }

    /// Side on which a new item appears
    pub fn creates_on(self) -> Option<Side> {
        match self {
            SyncOperation::CreateLeft | SyncOperation::MoveLeftTo => Some(Side::Left),
            SyncOperation::CreateRight | SyncOperation::MoveRightTo => Some(Side::Right),
            _ => None,
        }
    }

    /// Whether the item is deleted or moved away on `side`
    pub fn removes_from(self, side: Side) -> bool {
        self == SyncOperation::delete_on(side)
            || self == SyncOperation::move_from(side)
            || self == SyncOperation::move_to(side)
    }

    pub fn is_move(self) -> bool {
        matches!(
            self,
            SyncOperation::MoveLeftFrom
                | SyncOperation::MoveLeftTo
                | SyncOperation::MoveRightFrom
                | SyncOperation::MoveRightTo
        )
    }

    /// Anything the execution engine would have to carry out
    pub fn requires_action(self) -> bool {
        self.target_side().is_some()
    }

    pub fn description(self) -> &'static str {
        match self {
            SyncOperation::CreateLeft => "Copy new item to left",
            SyncOperation::CreateRight => "Copy new item to right",
            SyncOperation::DeleteLeft => "Delete left item",
            SyncOperation::DeleteRight => "Delete right item",
            SyncOperation::MoveLeftFrom | SyncOperation::MoveLeftTo => "Move file on left",
            SyncOperation::MoveRightFrom | SyncOperation::MoveRightTo => "Move file on right",
            SyncOperation::OverwriteLeft => "Update left item",
            SyncOperation::OverwriteRight => "Update right item",
            SyncOperation::CopyMetadataToLeft => "Update attributes on left",
            SyncOperation::CopyMetadataToRight => "Update attributes on right",
            SyncOperation::DoNothing => "Do nothing",
            SyncOperation::UnresolvedConflict => "Conflict/item cannot be categorized",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyncOperation::CreateLeft => "create-left",
            SyncOperation::CreateRight => "create-right",
            SyncOperation::DeleteLeft => "delete-left",
            SyncOperation::DeleteRight => "delete-right",
            SyncOperation::MoveLeftFrom => "move-left-from",
            SyncOperation::MoveLeftTo => "move-left-to",
            SyncOperation::MoveRightFrom => "move-right-from",
            SyncOperation::MoveRightTo => "move-right-to",
            SyncOperation::OverwriteLeft => "overwrite-left",
            SyncOperation::OverwriteRight => "overwrite-right",
            SyncOperation::CopyMetadataToLeft => "metadata-left",
            SyncOperation::CopyMetadataToRight => "metadata-right",
            SyncOperation::DoNothing => "nothing",
            SyncOperation::UnresolvedConflict => "conflict",
        };
        f.write_str(text)
    }
}

/// Existence of a base folder at the time of comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseFolderStatus {
    #[default]
    Existing,
    NotExisting,
    Failure,
}

/// Opaque path handle for one side of a folder pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbstractPath(PathBuf);

impl AbstractPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Appends a '/'-separated relative path
    pub fn append_rel_path(&self, rel_path: &str) -> AbstractPath {
        let mut path = self.0.clone();
        for component in rel_path.split('/').filter(|c| !c.is_empty()) {
            path.push(component);
        }
        AbstractPath(path)
    }
}

impl fmt::Display for AbstractPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Identifies one comparison run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// BLAKE3 hash value (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blake3Hash(pub [u8; 32]);

impl Blake3Hash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<blake3::Hash> for Blake3Hash {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_flip_is_involution() {
        let all = [
            Category::Equal,
            Category::DifferentContent,
            Category::DifferentMetadata,
            Category::LeftOnly,
            Category::RightOnly,
            Category::LeftNewer,
            Category::RightNewer,
            Category::Conflict,
        ];
        for category in all {
            assert_eq!(category.flipped().flipped(), category);
        }
        assert_eq!(Category::LeftOnly.flipped(), Category::RightOnly);
        assert_eq!(Category::RightNewer.flipped(), Category::LeftNewer);
        assert_eq!(Category::Conflict.flipped(), Category::Conflict);
    }

    #[test]
    fn test_operation_sides() {
        assert_eq!(SyncOperation::CreateRight.creates_on(), Some(Side::Right));
        assert_eq!(SyncOperation::MoveLeftTo.creates_on(), Some(Side::Left));
        assert_eq!(SyncOperation::OverwriteLeft.creates_on(), None);
        assert!(SyncOperation::MoveRightFrom.removes_from(Side::Right));
        assert!(!SyncOperation::DeleteRight.removes_from(Side::Left));
        assert!(!SyncOperation::DoNothing.requires_action());
        assert!(!SyncOperation::UnresolvedConflict.requires_action());
    }

    #[test]
    fn test_folder_category_narrowing() {
        assert_eq!(FolderCategory::from_category(Category::LeftOnly), Some(FolderCategory::LeftOnly));
        assert_eq!(FolderCategory::from_category(Category::LeftNewer), None);
        assert_eq!(Category::from(FolderCategory::Conflict), Category::Conflict);
    }

    #[test]
    fn test_hash_hex_display() {
        let hash = Blake3Hash::from(blake3::hash(b"abc"));
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, blake3::hash(b"abc").to_hex().as_str());
        assert!(hex.starts_with("6437b3ac"));
    }

    #[test]
    fn test_append_rel_path() {
        let base = AbstractPath::new("/data/left");
        let path = base.append_rel_path("sub/file.txt");
        assert_eq!(path.as_path(), Path::new("/data/left/sub/file.txt"));
        assert_eq!(base.append_rel_path("").as_path(), Path::new("/data/left"));
    }
}
