//! Per-font glyph subsetting.
//!
//! Every font is split into subsets of at most 256 glyphs, because each
//! subset is embedded as its own single-byte-encoded font object. Codepoints
//! are assigned a `(subset, local glyph id)` pair in call order, and the
//! assignment is stable for the lifetime of the document.

use std::collections::HashMap;

pub(crate) const MAX_SUBSET_SIZE: usize = 256;

const SPACE: u32 = ' ' as u32;
const PADDING_ATTEMPTS: u32 = 100;

/// The location of a codepoint within the subsets of one font.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SubsetGlyph {
    /// The subset the codepoint lives in.
    pub subset: usize,
    /// The glyph id within that subset.
    pub glyph_id: usize,
}

#[derive(Debug)]
pub(crate) struct FontSubsetter {
    subsets: Vec<Vec<u32>>,
    assigned: HashMap<u32, SubsetGlyph>,
}

impl FontSubsetter {
    pub(crate) fn new() -> Self {
        FontSubsetter {
            subsets: vec![Vec::new()],
            assigned: HashMap::new(),
        }
    }

    /// Return the existing slot for the codepoint, or assign the next free
    /// one. Opens a new subset when the last one is full.
    pub(crate) fn get_glyph_subset(&mut self, codepoint: u32) -> SubsetGlyph {
        if let Some(existing) = self.assigned.get(&codepoint) {
            return *existing;
        }
        if self.subsets.last().map(Vec::len) == Some(MAX_SUBSET_SIZE) {
            self.subsets.push(Vec::new());
        }
        let subset = self.subsets.len() - 1;
        let last = self.subsets.last_mut().unwrap();
        let slot = SubsetGlyph {
            subset,
            glyph_id: last.len(),
        };
        last.push(codepoint);
        self.assigned.insert(codepoint, slot);
        slot
    }

    /// Append the codepoint to the last subset without consulting the
    /// assignment map. Used for space padding only.
    pub(crate) fn unchecked_insert_glyph_to_last_subset(&mut self, codepoint: u32) {
        self.subsets
            .last_mut()
            .unwrap()
            .push(codepoint);
    }

    pub(crate) fn num_subsets(&self) -> usize {
        self.subsets.len()
    }

    pub(crate) fn subset(&self, index: usize) -> &[u32] {
        &self.subsets[index]
    }

    /// Pad the last subset so that glyph id 32 is the space codepoint.
    ///
    /// Subsets whose last chunk already holds more than 32 glyphs are left
    /// alone. Aborts when padding cannot complete, since the document would
    /// otherwise contain text that renders with the wrong glyphs.
    pub(crate) fn pad_last_subset_until_space(&mut self) {
        let subset_id = self.num_subsets() - 1;
        if self.subset(subset_id).len() > SPACE as usize {
            return;
        }
        let mut padding_succeeded = false;
        for i in 0..PADDING_ATTEMPTS {
            if self.subset(subset_id).len() == SPACE as usize {
                padding_succeeded = true;
                break;
            }
            let cur_glyph_codepoint = '!' as u32 + i;
            self.get_glyph_subset(cur_glyph_codepoint);
        }
        if !padding_succeeded {
            panic!("font subset padding failed");
        }
        self.unchecked_insert_glyph_to_last_subset(SPACE);
        assert_eq!(self.subset(subset_id).len(), SPACE as usize + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_stable() {
        let mut subsetter = FontSubsetter::new();
        let first = subsetter.get_glyph_subset('H' as u32);
        let second = subsetter.get_glyph_subset('i' as u32);
        assert_eq!(first, SubsetGlyph { subset: 0, glyph_id: 0 });
        assert_eq!(second, SubsetGlyph { subset: 0, glyph_id: 1 });
        assert_eq!(subsetter.get_glyph_subset('H' as u32), first);
        assert_eq!(subsetter.get_glyph_subset('i' as u32), second);
    }

    #[test]
    fn full_subset_opens_a_new_one() {
        let mut subsetter = FontSubsetter::new();
        for cp in 0..MAX_SUBSET_SIZE as u32 {
            subsetter.get_glyph_subset(0x4E00 + cp);
        }
        assert_eq!(subsetter.num_subsets(), 1);
        let overflow = subsetter.get_glyph_subset(0x9999);
        assert_eq!(overflow, SubsetGlyph { subset: 1, glyph_id: 0 });
        assert_eq!(subsetter.num_subsets(), 2);
        // The first subset is untouched and still resolves its glyphs.
        assert_eq!(
            subsetter.get_glyph_subset(0x4E00),
            SubsetGlyph { subset: 0, glyph_id: 0 }
        );
    }

    #[test]
    fn unchecked_insert_bypasses_dedup() {
        let mut subsetter = FontSubsetter::new();
        subsetter.get_glyph_subset(' ' as u32);
        subsetter.unchecked_insert_glyph_to_last_subset(' ' as u32);
        assert_eq!(subsetter.subset(0), &[' ' as u32, ' ' as u32]);
    }

    #[test]
    fn padding_puts_space_at_32() {
        let mut subsetter = FontSubsetter::new();
        subsetter.get_glyph_subset('H' as u32);
        subsetter.get_glyph_subset('i' as u32);
        subsetter.pad_last_subset_until_space();
        let subset = subsetter.subset(0);
        assert_eq!(subset.len(), 33);
        assert_eq!(subset[32], ' ' as u32);
    }

    #[test]
    fn padding_skips_codepoints_already_present() {
        let mut subsetter = FontSubsetter::new();
        subsetter.get_glyph_subset('!' as u32);
        subsetter.get_glyph_subset('#' as u32);
        subsetter.pad_last_subset_until_space();
        let subset = subsetter.subset(0);
        assert_eq!(subset.len(), 33);
        assert_eq!(subset[32], ' ' as u32);
        // No codepoint may appear twice among the padded glyphs.
        let mut sorted = subset[..32].to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 32);
    }

    #[test]
    fn large_last_subset_is_left_alone() {
        let mut subsetter = FontSubsetter::new();
        for cp in 0..40u32 {
            subsetter.get_glyph_subset(0x4E00 + cp);
        }
        subsetter.pad_last_subset_until_space();
        assert_eq!(subsetter.subset(0).len(), 40);
    }
}
