//! The document outline (bookmark) tree.

use std::collections::HashMap;

use crate::document::PageId;

/// Sentinel parent id for top-level outline entries.
pub(crate) const OUTLINE_ROOT: i32 = -1;

#[derive(Debug, Clone)]
pub(crate) struct OutlineItem {
    pub(crate) title: String,
    pub(crate) dest: PageId,
}

/// All outline entries plus the parent/children relationships needed to
/// wire up `/Prev`, `/Next`, `/First` and `/Last` at write time. Sibling
/// order is insertion order.
#[derive(Debug, Default)]
pub(crate) struct OutlineData {
    pub(crate) items: Vec<OutlineItem>,
    pub(crate) parent: HashMap<i32, i32>,
    pub(crate) children: HashMap<i32, Vec<i32>>,
}

impl OutlineData {
    pub(crate) fn add(&mut self, title: String, dest: PageId, parent: Option<i32>) -> i32 {
        let cur_id = self.items.len() as i32;
        let par_id = parent.unwrap_or(OUTLINE_ROOT);
        self.parent.insert(cur_id, par_id);
        self.children.entry(par_id).or_default().push(cur_id);
        self.items.push(OutlineItem { title, dest });
        cur_id
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
