pub mod registry;
pub mod hierarchy;
mod category;
pub mod sync_operation;
pub mod visitor;
mod prune;
pub mod filter;
pub mod scanner;
pub mod comparison;
pub mod direction;
pub mod statistics;

pub use registry::{ObjectId, Registry};
pub use hierarchy::{
    BaseFolderPair, CompareSettings, Container, FilePair, FolderComparison, FolderPair, FsObject,
    Node, SymlinkPair,
};
pub use sync_operation::isolated_sync_operation;
pub use visitor::{visit_fs_object, visit_fs_object_recursively, visit_recursively, visit_recursively_mut};
pub use filter::NameFilter;
pub use scanner::FolderScanner;
pub use comparison::{same_file_time, ComparisonEngine};
pub use direction::{detect_moved_files, redetermine_sync_directions};
pub use statistics::{ConflictInfo, SyncStatistics};
