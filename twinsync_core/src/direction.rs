//! Direction assignment and move detection
//!
//! Both run after a comparison and only go through the tree's public
//! setters, so buffered folder operations stay coherent.

use crate::hierarchy::FolderComparison;
use crate::registry::ObjectId;
use crate::visitor::{visit_recursively, visit_recursively_mut};
use std::collections::HashMap;
use tracing::{debug, info};
use twinsync_common::{Category, DirectionSet, Side, SyncConfig, SyncDirection};

/// Sets every item's direction below `base` from its category
///
/// Items that differ but get no direction from `config` are marked with a
/// direction conflict instead, so that they show up as unresolved.
pub fn redetermine_sync_directions(tree: &mut FolderComparison, base: ObjectId, config: &SyncConfig) {
    let directions = config.directions();
    visit_recursively_mut(
        tree,
        base,
        |tree, id| apply_direction(tree, id, &directions),
        |tree, id| apply_direction(tree, id, &directions),
        |tree, id| apply_direction(tree, id, &directions),
    );
    debug!("Assigned sync directions below {} ({:?})", base, config.variant);
}

fn apply_direction(tree: &mut FolderComparison, id: ObjectId, directions: &DirectionSet) {
    let Some(obj) = tree.fs_object(id) else {
        return;
    };
    let category = obj.category();
    let direction = match category {
        Category::Equal => SyncDirection::None,
        Category::LeftOnly => directions.left_only,
        Category::RightOnly => directions.right_only,
        Category::LeftNewer => directions.left_newer,
        Category::RightNewer => directions.right_newer,
        Category::DifferentContent | Category::DifferentMetadata => directions.different,
        Category::Conflict => directions.conflict,
    };

    let needs_decision = matches!(
        category,
        Category::DifferentContent | Category::DifferentMetadata | Category::Conflict
    );
    if direction == SyncDirection::None && needs_decision {
        let reason = obj
            .category_extra_description()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| category.description());
        let message = format!("Cannot determine sync direction: {}", reason);
        tree.set_sync_dir_conflict(id, &message);
    } else {
        tree.set_sync_dir(id, direction);
    }
}

/// Links one-sided files below `base` that look like the two ends of a rename
///
/// A left-only and a right-only file are paired when they are the only
/// candidates sharing the same size and modification time. Empty files are
/// never paired. Returns the number of linked pairs.
pub fn detect_moved_files(tree: &mut FolderComparison, base: ObjectId) -> usize {
    let mut left_only: HashMap<(u64, i64), Vec<ObjectId>> = HashMap::new();
    let mut right_only: HashMap<(u64, i64), Vec<ObjectId>> = HashMap::new();

    visit_recursively(
        tree,
        base,
        |_, _| {},
        |id, file| {
            let (side, candidates) = match file.obj().category() {
                Category::LeftOnly => (Side::Left, &mut left_only),
                Category::RightOnly => (Side::Right, &mut right_only),
                _ => return,
            };
            let size = file.file_size(side);
            if size > 0 {
                candidates.entry((size, file.mod_time(side))).or_default().push(id);
            }
        },
        |_, _| {},
    );

    let mut pairs: Vec<(ObjectId, ObjectId)> = left_only
        .iter()
        .filter_map(|(key, lefts)| match (lefts.as_slice(), right_only.get(key).map(Vec::as_slice)) {
            ([left], Some([right])) => Some((*left, *right)),
            _ => None,
        })
        .collect();
    pairs.sort();

    for &(left, right) in &pairs {
        tree.link_move_pair(left, right);
    }
    if !pairs.is_empty() {
        info!("Detected {} moved files", pairs.len());
    }
    pairs.len()
}
