//! Per-context resource bookkeeping.
//!
//! Content streams refer to document objects through short names like `/F0`
//! or `/Im2`. Names are handed out per draw context at first use, in
//! first-use order, so that operator text can be emitted immediately while
//! the matching `/Resources` dictionary is only assembled at finalization.

use std::collections::HashMap;
use std::hash::Hash;

use crate::document::{
    FormXObjectId, GraphicsStateId, IccColorSpaceId, ImageId, LabId, OptionalContentGroupId,
    PatternId, SeparationId, ShadingId, TransparencyGroupId,
};
use crate::document::{BuiltinFontId, FontId};

/// A non-device colorspace referenced from a content stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ColorspaceRef {
    Icc(IccColorSpaceId),
    Lab(LabId),
    Separation(SeparationId),
    /// The `All` separation of a CMYK document.
    All,
}

/// Maps ids of one resource class to `/‹prefix›‹n›` names in first-use order.
#[derive(Debug)]
pub(crate) struct ResourceMapper<T> {
    prefix: &'static str,
    forward: Vec<T>,
    backward: HashMap<T, usize>,
}

impl<T: Copy + Eq + Hash> ResourceMapper<T> {
    pub(crate) fn new(prefix: &'static str) -> Self {
        ResourceMapper {
            prefix,
            forward: Vec::new(),
            backward: HashMap::new(),
        }
    }

    fn remap(&mut self, id: T) -> usize {
        let forward = &mut self.forward;
        *self.backward.entry(id).or_insert_with(|| {
            let num = forward.len();
            forward.push(id);
            num
        })
    }

    pub(crate) fn remap_with_name(&mut self, id: T) -> String {
        let num = self.remap(id);
        format!("{}{}", self.prefix, num)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (String, T)> + '_ {
        self.forward
            .iter()
            .enumerate()
            .map(|(num, id)| (format!("{}{}", self.prefix, num), *id))
    }
}

/// All resource classes one draw context can reference.
#[derive(Debug)]
pub(crate) struct ResourceSet {
    pub(crate) subset_fonts: ResourceMapper<(FontId, usize)>,
    pub(crate) builtin_fonts: ResourceMapper<BuiltinFontId>,
    pub(crate) images: ResourceMapper<ImageId>,
    pub(crate) form_xobjects: ResourceMapper<FormXObjectId>,
    pub(crate) transparency_groups: ResourceMapper<TransparencyGroupId>,
    pub(crate) gstates: ResourceMapper<GraphicsStateId>,
    pub(crate) patterns: ResourceMapper<PatternId>,
    pub(crate) shadings: ResourceMapper<ShadingId>,
    pub(crate) colorspaces: ResourceMapper<ColorspaceRef>,
    pub(crate) ocgs: ResourceMapper<OptionalContentGroupId>,
}

impl ResourceSet {
    pub(crate) fn new() -> Self {
        ResourceSet {
            subset_fonts: ResourceMapper::new("F"),
            builtin_fonts: ResourceMapper::new("BF"),
            images: ResourceMapper::new("Im"),
            form_xobjects: ResourceMapper::new("FX"),
            transparency_groups: ResourceMapper::new("TG"),
            gstates: ResourceMapper::new("GS"),
            patterns: ResourceMapper::new("Pat"),
            shadings: ResourceMapper::new("Sh"),
            colorspaces: ResourceMapper::new("CS"),
            ocgs: ResourceMapper::new("oc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_first_use_order() {
        let mut mapper = ResourceMapper::new("Im");
        assert_eq!(mapper.remap_with_name(ImageId(7)), "Im0");
        assert_eq!(mapper.remap_with_name(ImageId(2)), "Im1");
        assert_eq!(mapper.remap_with_name(ImageId(7)), "Im0");
        let entries: Vec<_> = mapper.entries().collect();
        assert_eq!(entries, vec![("Im0".to_string(), ImageId(7)), ("Im1".to_string(), ImageId(2))]);
    }
}
