//! The indirect-object table.
//!
//! Objects are appended in the order their numbers are handed out; index 0
//! is a sentinel so that table positions equal PDF object numbers. Most
//! objects are stored fully serialized. The `Delayed*` variants are
//! placeholders for objects that depend on information only complete at
//! write time (page count, sibling object numbers, finished subsets,
//! structure topology); they are resolved in ascending id order during the
//! final write.

use crate::document::{
    AnnotationId, FontId, FormWidgetId, FormXObjectId, PageProperties, StructureItemId,
};
use crate::geom::Rect;
use crate::interactive::annotation::Annotation;
use crate::interchange::navigation::Transition;

#[derive(Debug)]
pub(crate) struct FullObject {
    pub(crate) dictionary: String,
    pub(crate) stream: Option<Vec<u8>>,
}

#[derive(Debug)]
pub(crate) struct DeflateStreamObject {
    /// The dictionary without its closing delimiter; `/Length` and
    /// `/Filter` are appended once the stream has been compressed.
    pub(crate) unclosed_dictionary: String,
    pub(crate) stream: Vec<u8>,
}

#[derive(Debug)]
pub(crate) struct DelayedPage {
    pub(crate) page_num: usize,
    pub(crate) mediabox: Rect,
    pub(crate) custom_props: PageProperties,
    pub(crate) used_form_widgets: Vec<FormWidgetId>,
    pub(crate) used_annotations: Vec<AnnotationId>,
    pub(crate) transition: Option<Transition>,
    pub(crate) subnav_root: Option<usize>,
    pub(crate) structparents: Option<i32>,
}

#[derive(Debug)]
pub(crate) struct DelayedCheckboxWidget {
    pub(crate) id: FormWidgetId,
    pub(crate) rect: Rect,
    pub(crate) on_state: FormXObjectId,
    pub(crate) off_state: FormXObjectId,
    pub(crate) partial_name: String,
}

#[derive(Debug)]
pub(crate) enum PdfObject {
    /// Sentinel at index 0; never written.
    DummyIndexZero,
    /// A fully serialized object.
    Full(FullObject),
    /// A stream that is deflated when the file is written.
    DeflateStream(DeflateStreamObject),
    DelayedPage(DelayedPage),
    DelayedPages,
    DelayedSubsetFontData {
        fid: FontId,
        subset: usize,
    },
    DelayedSubsetFontDescriptor {
        fid: FontId,
        subfont_data_obj: usize,
        subset: usize,
    },
    DelayedSubsetCMap {
        fid: FontId,
        subset: usize,
    },
    DelayedSubsetFont {
        fid: FontId,
        subfont_descriptor_obj: usize,
        subfont_cmap_obj: usize,
        subset: usize,
    },
    DelayedAnnotation {
        id: AnnotationId,
        annotation: Annotation,
    },
    DelayedCheckboxWidget(DelayedCheckboxWidget),
    DelayedStructItem {
        id: StructureItemId,
    },
}

impl PdfObject {
    pub(crate) fn full(dictionary: String) -> Self {
        PdfObject::Full(FullObject {
            dictionary,
            stream: None,
        })
    }

    pub(crate) fn full_with_stream(dictionary: String, stream: Vec<u8>) -> Self {
        PdfObject::Full(FullObject {
            dictionary,
            stream: Some(stream),
        })
    }

    pub(crate) fn deflate_stream(unclosed_dictionary: String, stream: Vec<u8>) -> Self {
        PdfObject::DeflateStream(DeflateStreamObject {
            unclosed_dictionary,
            stream,
        })
    }
}
