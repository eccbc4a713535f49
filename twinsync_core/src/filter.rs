use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use tracing::debug;
use twinsync_common::{PathFilter, TwinSyncError};

/// Include/exclude filter using gitignore-style patterns
///
/// An item passes if it matches an include pattern (or no include patterns
/// are configured) and neither it nor any of its parent folders matches an
/// exclude pattern. Folders are only subject to the exclude list, since an
/// excluded-by-include folder may still contain included files.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Option<Gitignore>,
    exclude: Option<Gitignore>,
}

impl NameFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, TwinSyncError> {
        Ok(Self {
            include: build_matcher(include)?,
            exclude: build_matcher(exclude)?,
        })
    }

    pub fn exclude_only(exclude: &[String]) -> Result<Self, TwinSyncError> {
        Self::new(&[], exclude)
    }

    fn is_excluded(&self, rel_path: &str, is_dir: bool) -> bool {
        let Some(exclude) = &self.exclude else {
            return false;
        };
        matches_with_parents(exclude, Path::new(rel_path), is_dir)
    }
}

fn build_matcher(patterns: &[String]) -> Result<Option<Gitignore>, TwinSyncError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new("");
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| TwinSyncError::Config(format!("Invalid filter pattern '{}': {}", pattern, e)))?;
    }
    let matcher = builder
        .build()
        .map_err(|e| TwinSyncError::Config(format!("Failed to build filter: {}", e)))?;
    debug!("Built filter with {} patterns", patterns.len());
    Ok(Some(matcher))
}

/// Checks a path and all of its parent folders
pub(crate) fn matches_with_parents(matcher: &Gitignore, path: &Path, is_dir: bool) -> bool {
    if matcher.matched(path, is_dir).is_ignore() {
        return true;
    }

    let mut current = path;
    while let Some(parent) = current.parent() {
        if !parent.as_os_str().is_empty() && matcher.matched(parent, true).is_ignore() {
            return true;
        }
        current = parent;
    }
    false
}

impl PathFilter for NameFilter {
    fn pass_file(&self, rel_path: &str) -> bool {
        if self.is_excluded(rel_path, false) {
            return false;
        }
        match &self.include {
            Some(include) => matches_with_parents(include, Path::new(rel_path), false),
            None => true,
        }
    }

    fn pass_dir(&self, rel_path: &str) -> bool {
        !self.is_excluded(rel_path, true)
    }

    fn is_null(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }
}
