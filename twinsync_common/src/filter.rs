use std::fmt;

/// Decides which items take part in a comparison
///
/// Paths are relative to the base folder and '/'-separated. A filter is
/// evaluated by whoever populates the comparison tree; the tree only keeps a
/// shared reference so that later consumers know which view of the folders it
/// represents.
pub trait PathFilter: Send + Sync + fmt::Debug {
    fn pass_file(&self, rel_path: &str) -> bool;

    /// `false` excludes the folder and everything below it
    fn pass_dir(&self, rel_path: &str) -> bool;

    /// True if the filter passes everything
    fn is_null(&self) -> bool {
        false
    }
}

/// Filter that lets every item through
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFilter;

impl PathFilter for NullFilter {
    fn pass_file(&self, _rel_path: &str) -> bool {
        true
    }

    fn pass_dir(&self, _rel_path: &str) -> bool {
        true
    }

    fn is_null(&self) -> bool {
        true
    }
}
