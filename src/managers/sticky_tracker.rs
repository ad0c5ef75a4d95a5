//! Sticky line tracking.
//!
//! Keeps mark lines aligned with buffer edits. Each edit replaces lines
//! `start_line..=end_line` with `inserted_lines` new line breaks:
//!
//! - marks at or before `start_line` stay put;
//! - marks after `end_line` shift by the edit's line delta;
//! - marks strictly inside the replaced span survive only if the replacement
//!   still reaches their line, otherwise they are dropped;
//! - a mark whose shifted line would go negative is dropped.
//!
//! This is a heuristic. Content moved non-contiguously (cut here, paste
//! there) does not carry its marks along.

use std::collections::BTreeMap;

use tracing::debug;

use crate::managers::bookmark_tree::BookmarkTree;
use crate::types::events::EditDelta;

/// What an edit batch did to one file's marks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StickyOutcome {
    pub moved: usize,
    pub removed: usize,
}

impl StickyOutcome {
    pub fn changed(&self) -> bool {
        self.moved > 0 || self.removed > 0
    }
}

/// Applies one edit to a numbers map.
pub fn adjust_numbers(numbers: &mut BTreeMap<u8, u32>, edit: &EditDelta) -> StickyOutcome {
    let delta = edit.line_delta();
    let mut outcome = StickyOutcome::default();

    numbers.retain(|_, line| {
        if *line <= edit.start_line {
            return true;
        }
        if *line <= edit.end_line {
            // Inside the replaced span.
            if *line - edit.start_line <= edit.inserted_lines {
                return true;
            }
            outcome.removed += 1;
            return false;
        }
        if delta == 0 {
            return true;
        }
        let shifted = i64::from(*line) + delta;
        match u32::try_from(shifted) {
            Ok(new_line) => {
                *line = new_line;
                outcome.moved += 1;
                true
            }
            Err(_) => {
                outcome.removed += 1;
                false
            }
        }
    });

    outcome
}

/// Applies `edits`, in order, to the bookmark for `file_path`. Removes the
/// bookmark node if no marks survive.
pub fn apply_edits(tree: &mut BookmarkTree, file_path: &str, edits: &[EditDelta]) -> StickyOutcome {
    let outcome = tree.update_bookmark(file_path, |bookmark| {
        let mut total = StickyOutcome::default();
        for edit in edits {
            let step = adjust_numbers(&mut bookmark.numbers, edit);
            total.moved += step.moved;
            total.removed += step.removed;
        }
        if total.changed() {
            bookmark.touch();
        }
        total
    });

    let outcome = outcome.unwrap_or_default();
    if outcome.changed() {
        debug!(
            "Sticky tracking in {}: {} moved, {} removed",
            file_path, outcome.moved, outcome.removed
        );
    }
    outcome
}
