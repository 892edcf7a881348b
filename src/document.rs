//! Creating new PDF documents.
//!
//! A [`Document`] owns the indirect-object table and every registry (fonts,
//! images, colorspaces, structure items, …). Content is produced in
//! [`DrawContext`]s handed out by the document and installed back into the
//! object table when a page, pattern, form XObject or transparency group is
//! finalized. [`Document::finish`] resolves all delayed objects and returns
//! the serialized file.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::content::{DrawContext, DrawContextType};
use crate::error::{Error, Result};
use crate::geom::Rect;
use crate::graphics::color::{
    check_units, Colorspace, DeviceCmykColor, LabColorSpace,
};
use crate::graphics::ext_g_state::GraphicsState;
use crate::graphics::image::{
    ImageColorspace, ImageInfo, ImageInterpolation, JpgImage, RasterImage,
};
use crate::graphics::shading::{serialize_shade4, serialize_shade6, mesh_shading_dict};
use crate::graphics::shading::{FunctionType2, Shading};
use crate::interactive::annotation::{Annotation, AnnotationKind};
use crate::interchange::embed::EmbeddedFileObject;
use crate::interchange::navigation::SubPageNavigation;
use crate::interchange::outline::OutlineData;
use crate::interchange::tagging::{
    RolemapEntry, StructItem, StructItemKind, StructureType, StructureUsage,
};
use crate::object::{DelayedCheckboxWidget, DelayedPage, PdfObject};
use crate::resource::{ColorspaceRef, ResourceSet};
use crate::text::font::Font;
use crate::text::{BuiltinFont, FontSubsetter, SubsetGlyph};
use crate::util::{pdf_meta_string, pdf_string_literal, DateTime};
use crate::Data;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(0);

/// The object number of the `/Info` dictionary; it is always created first.
pub(crate) const INFO_OBJECT: usize = 1;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);
    };
}

id_type!(
    /// Identifies a page of a document.
    PageId
);
id_type!(
    /// Identifies a loaded font.
    FontId
);
id_type!(
    /// Identifies a builtin Type1 font materialized in a document.
    BuiltinFontId
);
id_type!(
    /// Identifies an embedded image.
    ImageId
);
id_type!(
    /// Identifies a registered ICC-based colorspace.
    IccColorSpaceId
);
id_type!(
    /// Identifies a Lab colorspace.
    LabId
);
id_type!(
    /// Identifies a separation colorspace.
    SeparationId
);
id_type!(
    /// Identifies an extended graphics state.
    GraphicsStateId
);
id_type!(
    /// Identifies an interpolation function.
    FunctionId
);
id_type!(
    /// Identifies a shading.
    ShadingId
);
id_type!(
    /// Identifies a tiling pattern.
    PatternId
);
id_type!(
    /// Identifies a form XObject.
    FormXObjectId
);
id_type!(
    /// Identifies a transparency group.
    TransparencyGroupId
);
id_type!(
    /// Identifies an optional-content group.
    OptionalContentGroupId
);
id_type!(
    /// Identifies an outline entry.
    OutlineId
);
id_type!(
    /// Identifies a structure item of the tagged-PDF tree.
    StructureItemId
);
id_type!(
    /// Identifies a custom structure role.
    RoleId
);
id_type!(
    /// Identifies an annotation.
    AnnotationId
);
id_type!(
    /// Identifies a form widget.
    FormWidgetId
);
id_type!(
    /// Identifies an embedded file.
    EmbeddedFileId
);

/// The standard the document declares conformance with through its output
/// intent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IntentSubtype {
    /// PDF/X (prepress exchange).
    PdfX,
    /// PDF/A (archival).
    PdfA,
    /// PDF/E (engineering).
    PdfE,
}

impl IntentSubtype {
    pub(crate) fn name(self) -> &'static str {
        match self {
            IntentSubtype::PdfX => "/GTS_PDFX",
            IntentSubtype::PdfA => "/GTS_PDFA",
            IntentSubtype::PdfE => "/ISO_PDFE",
        }
    }
}

/// Per-page property overrides. Unset boxes are omitted from the page
/// dictionary; an unset media box falls back to the context's size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageProperties {
    /// The media box.
    pub media_box: Option<Rect>,
    /// The crop box.
    pub crop_box: Option<Rect>,
    /// The bleed box.
    pub bleed_box: Option<Rect>,
    /// The trim box.
    pub trim_box: Option<Rect>,
    /// The art box.
    pub art_box: Option<Rect>,
}

/// Settings that should be applied when creating a PDF document.
#[derive(Debug, Clone)]
pub struct SerializeSettings {
    /// The document title, written to `/Info`.
    pub title: String,
    /// The document author, written to `/Info`.
    pub author: String,
    /// The creating application, written to `/Info`.
    pub creator: String,
    /// The document language, written to the catalog.
    pub lang: String,
    /// The colorspace of the page transparency group.
    ///
    /// `DeviceCmyk` requires a CMYK ICC profile.
    pub output_colorspace: Colorspace,
    /// The conformance standard to declare, if any. Requires an output
    /// profile and an intent condition identifier.
    pub subtype: Option<IntentSubtype>,
    /// The output condition identifier of the output intent.
    pub intent_condition_identifier: String,
    /// Whether page content streams are deflated. Leads to significantly
    /// smaller files.
    pub compress_streams: bool,
    /// Whether the document declares itself as tagged.
    pub is_tagged: bool,
    /// The creation and modification date written to `/Info`.
    pub creation_date: Option<DateTime>,
    /// An ICC profile for RGB output.
    pub rgb_profile: Option<Vec<u8>>,
    /// An ICC profile for grayscale output.
    pub gray_profile: Option<Vec<u8>>,
    /// An ICC profile for CMYK output.
    pub cmyk_profile: Option<Vec<u8>>,
}

impl Default for SerializeSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            creator: String::new(),
            lang: String::new(),
            output_colorspace: Colorspace::DeviceRgb,
            subtype: None,
            intent_condition_identifier: String::new(),
            compress_streams: true,
            is_tagged: false,
            creation_date: None,
            rgb_profile: None,
            gray_profile: None,
            cmyk_profile: None,
        }
    }
}

/// An optional-content group, i.e. a togglable layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalContentGroup {
    /// The name displayed in the viewer's layer list.
    pub name: String,
}

impl OptionalContentGroup {
    /// Create a group with the given display name.
    pub fn new(name: String) -> Self {
        OptionalContentGroup { name }
    }
}

/// The objects making up one embedded subset font.
#[derive(Debug, Copy, Clone)]
pub(crate) struct SubsetFontObjects {
    pub(crate) data_obj: usize,
    pub(crate) descriptor_obj: usize,
    pub(crate) cmap_obj: usize,
    pub(crate) font_obj: usize,
}

#[derive(Debug)]
pub(crate) struct LoadedFont {
    pub(crate) font: Font,
    pub(crate) subsets: FontSubsetter,
    /// One entry per subset, allocated when the subset is opened.
    pub(crate) subset_objects: Vec<SubsetFontObjects>,
}

/// The objects making up one finished page.
#[derive(Debug, Copy, Clone)]
pub(crate) struct PageOffsets {
    pub(crate) resource_num: usize,
    pub(crate) commands_num: usize,
    pub(crate) page_obj_num: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct IccInfo {
    pub(crate) stream_num: usize,
    pub(crate) object_num: usize,
    pub(crate) num_channels: i32,
}

/// A PDF document under construction.
pub struct Document {
    pub(crate) id: u64,
    pub(crate) settings: SerializeSettings,
    pub(crate) objects: Vec<PdfObject>,
    pub(crate) pages: Vec<PageOffsets>,
    pub(crate) pages_object: usize,
    pub(crate) page_group_object: usize,
    pub(crate) output_profile: Option<IccColorSpaceId>,
    pub(crate) output_intent_object: Option<usize>,
    pub(crate) icc_profiles: Vec<IccInfo>,
    pub(crate) fonts: Vec<LoadedFont>,
    pub(crate) builtin_font_objects: Vec<usize>,
    builtin_fonts: HashMap<BuiltinFont, BuiltinFontId>,
    pub(crate) image_infos: Vec<ImageInfo>,
    pub(crate) separation_objects: Vec<usize>,
    pub(crate) form_xobjects: Vec<usize>,
    pub(crate) transparency_groups: Vec<usize>,
    pub(crate) ocg_objects: Vec<usize>,
    pub(crate) form_widgets: Vec<usize>,
    pub(crate) annotations: Vec<usize>,
    pub(crate) embedded_files: Vec<EmbeddedFileObject>,
    pub(crate) outlines: OutlineData,
    pub(crate) structure_items: Vec<StructItem>,
    pub(crate) rolemap: Vec<RolemapEntry>,
    pub(crate) form_use: HashMap<FormWidgetId, usize>,
    pub(crate) annotation_use: HashMap<AnnotationId, usize>,
    pub(crate) structure_use: HashMap<StructureItemId, StructureUsage>,
    pub(crate) structure_parent_tree_items: Vec<Vec<StructureItemId>>,
    pub(crate) structure_parent_tree_object: Option<usize>,
    pub(crate) structure_root_object: Option<usize>,
}

impl Document {
    /// Create a new document with default settings.
    pub fn new() -> Self {
        // Default settings cannot fail the init checks.
        Self::new_with(SerializeSettings::default()).expect("default settings are valid")
    }

    /// Create a new document with specific settings.
    pub fn new_with(settings: SerializeSettings) -> Result<Self> {
        let mut doc = Document {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            settings,
            objects: Vec::new(),
            pages: Vec::new(),
            pages_object: 0,
            page_group_object: 0,
            output_profile: None,
            output_intent_object: None,
            icc_profiles: Vec::new(),
            fonts: Vec::new(),
            builtin_font_objects: Vec::new(),
            builtin_fonts: HashMap::new(),
            image_infos: Vec::new(),
            separation_objects: Vec::new(),
            form_xobjects: Vec::new(),
            transparency_groups: Vec::new(),
            ocg_objects: Vec::new(),
            form_widgets: Vec::new(),
            annotations: Vec::new(),
            embedded_files: Vec::new(),
            outlines: OutlineData::default(),
            structure_items: Vec::new(),
            rolemap: Vec::new(),
            form_use: HashMap::new(),
            annotation_use: HashMap::new(),
            structure_use: HashMap::new(),
            structure_parent_tree_items: Vec::new(),
            structure_parent_tree_object: None,
            structure_root_object: None,
        };
        doc.init()?;
        Ok(doc)
    }

    fn init(&mut self) -> Result<()> {
        // PDF object numbering starts at 1, so keep a sentinel at index 0
        // to make table positions and object numbers coincide.
        self.objects.push(PdfObject::DummyIndexZero);
        self.generate_info_object();
        if self.settings.output_colorspace == Colorspace::DeviceCmyk {
            self.create_separation(
                "All",
                DeviceCmykColor {
                    c: 1.0,
                    m: 1.0,
                    y: 1.0,
                    k: 1.0,
                },
            )?;
        }
        match self.settings.output_colorspace {
            Colorspace::DeviceRgb => {
                if let Some(profile) = self.settings.rgb_profile.clone() {
                    self.output_profile = Some(self.store_icc_profile(&profile, 3));
                }
            }
            Colorspace::DeviceGray => {
                if let Some(profile) = self.settings.gray_profile.clone() {
                    self.output_profile = Some(self.store_icc_profile(&profile, 1));
                }
            }
            Colorspace::DeviceCmyk => {
                let profile = self
                    .settings
                    .cmyk_profile
                    .clone()
                    .ok_or(Error::OutputProfileMissing)?;
                self.output_profile = Some(self.store_icc_profile(&profile, 4));
            }
        }
        self.page_group_object = self.create_page_group();
        self.objects.push(PdfObject::DelayedPages);
        self.pages_object = self.objects.len() - 1;
        if self.settings.subtype.is_some() {
            if self.output_profile.is_none() {
                return Err(Error::OutputProfileMissing);
            }
            if self.settings.intent_condition_identifier.is_empty() {
                return Err(Error::MissingIntentIdentifier);
            }
            self.create_output_intent();
        }
        Ok(())
    }

    pub(crate) fn add_object(&mut self, object: PdfObject) -> usize {
        let object_num = self.objects.len();
        self.objects.push(object);
        object_num
    }

    pub(crate) fn check_same_document(&self, doc_id: u64) -> Result<()> {
        if doc_id != self.id {
            return Err(Error::IncorrectDocumentForObject);
        }
        Ok(())
    }

    fn generate_info_object(&mut self) {
        let mut dict = String::from("<<\n");
        if !self.settings.title.is_empty() {
            let _ = writeln!(dict, "  /Title {}", pdf_meta_string(&self.settings.title));
        }
        if !self.settings.author.is_empty() {
            let _ = writeln!(dict, "  /Author {}", pdf_meta_string(&self.settings.author));
        }
        if !self.settings.creator.is_empty() {
            let _ = writeln!(dict, "  /Creator {}", pdf_meta_string(&self.settings.creator));
        }
        let _ = writeln!(
            dict,
            "  /Producer (vellum {})",
            env!("CARGO_PKG_VERSION")
        );
        if let Some(date) = self.settings.creation_date {
            let _ = writeln!(dict, "  /CreationDate {}", date.to_pdf_date());
            let _ = writeln!(dict, "  /ModDate {}", date.to_pdf_date());
        }
        dict.push_str("  /Trapped /False\n");
        if self.settings.subtype == Some(IntentSubtype::PdfX) {
            dict.push_str("  /GTS_PDFXVersion (PDF/X-3:2003)\n");
        }
        dict.push_str(">>\n");
        self.add_object(PdfObject::full(dict));
    }

    fn create_page_group(&mut self) -> usize {
        let buf = format!(
            "<<\n  /S /Transparency\n  /CS {}\n>>\n",
            self.settings.output_colorspace.name()
        );
        self.add_object(PdfObject::full(buf))
    }

    fn create_output_intent(&mut self) {
        let profile = self
            .output_profile
            .expect("output intent requires a stored profile");
        let buf = format!(
            "<<\n  /Type /OutputIntent\n  /S {}\n  /OutputConditionIdentifier {}\n  \
             /DestOutputProfile {} 0 R\n>>\n",
            self.settings
                .subtype
                .expect("output intent requires a subtype")
                .name(),
            pdf_string_literal(&self.settings.intent_condition_identifier),
            self.icc_profiles[profile.0].stream_num,
        );
        self.output_intent_object = Some(self.add_object(PdfObject::full(buf)));
    }
}

/// Draw context creation and finalization.
impl Document {
    /// Create a draw context for a new page.
    ///
    /// Panics if `width` or `height` are not positive finite numbers.
    pub fn new_page_context(&self, width: f32, height: f32) -> DrawContext {
        let bbox = Rect::from_xywh(0.0, 0.0, width, height).unwrap();
        DrawContext::new(self.id, DrawContextType::Page, bbox)
    }

    /// Create a draw context for the cell of a colored tiling pattern.
    ///
    /// Panics if `width` or `height` are not positive finite numbers.
    pub fn new_color_pattern_context(&self, width: f32, height: f32) -> DrawContext {
        let bbox = Rect::from_xywh(0.0, 0.0, width, height).unwrap();
        DrawContext::new(self.id, DrawContextType::ColorTilingPattern, bbox)
    }

    /// Create a draw context for a form XObject.
    ///
    /// Panics if `width` or `height` are not positive finite numbers.
    pub fn new_form_xobject_context(&self, width: f32, height: f32) -> DrawContext {
        let bbox = Rect::from_xywh(0.0, 0.0, width, height).unwrap();
        DrawContext::new(self.id, DrawContextType::FormXObject, bbox)
    }

    /// Create a draw context for a transparency group.
    ///
    /// Panics if `width` or `height` are not positive finite numbers.
    pub fn new_transparency_group_context(&self, width: f32, height: f32) -> DrawContext {
        let bbox = Rect::from_xywh(0.0, 0.0, width, height).unwrap();
        DrawContext::new(self.id, DrawContextType::TransparencyGroup, bbox)
    }

    fn check_finalizable(&self, ctx: &DrawContext, expected: DrawContextType) -> Result<()> {
        self.check_same_document(ctx.doc_id)?;
        if ctx.draw_context_type() != expected {
            return Err(Error::InvalidDrawContextType);
        }
        if ctx.marked_content_depth() != 0 {
            return Err(Error::UnclosedMarkedContent);
        }
        if ctx.has_unclosed_state() {
            return Err(Error::DrawStateEndMismatch);
        }
        Ok(())
    }

    /// Finalize a page context and append the page to the document.
    pub fn add_page(&mut self, ctx: DrawContext) -> Result<PageId> {
        self.check_finalizable(&ctx, DrawContextType::Page)?;
        for w in &ctx.used_widgets {
            if w.0 >= self.form_widgets.len() {
                return Err(Error::IndexOutOfBounds);
            }
            if self.form_use.contains_key(w) {
                return Err(Error::AnnotationReuse);
            }
        }
        for a in &ctx.used_annotations {
            if a.0 >= self.annotations.len() {
                return Err(Error::IndexOutOfBounds);
            }
            if self.annotation_use.contains_key(a) {
                return Err(Error::AnnotationReuse);
            }
        }
        for s in &ctx.used_structures {
            if s.0 >= self.structure_items.len() {
                return Err(Error::IndexOutOfBounds);
            }
            if self.structure_use.contains_key(s) {
                return Err(Error::StructureReuse);
            }
        }

        let resource_dict = self.build_resource_dict(&ctx.resources)?;
        let resource_num = self.add_object(PdfObject::full(resource_dict));
        let command_stream = ctx.commands;
        let commands_num = if self.settings.compress_streams {
            self.add_object(PdfObject::deflate_stream(
                String::from("<<\n"),
                command_stream.into_bytes(),
            ))
        } else {
            let dict = format!("<<\n  /Length {}\n>>\n", command_stream.len());
            self.add_object(PdfObject::full_with_stream(
                dict,
                command_stream.into_bytes(),
            ))
        };

        let subnav_root = if ctx.sub_navigations.is_empty() {
            None
        } else {
            Some(self.create_subnavigation(&ctx.sub_navigations)?)
        };
        let structparents = if ctx.used_structures.is_empty() {
            None
        } else {
            let id = self.structure_parent_tree_items.len() as i32;
            self.structure_parent_tree_items
                .push(ctx.used_structures.clone());
            Some(id)
        };

        let page_num = self.pages.len();
        let mediabox = ctx.custom_props.media_box.unwrap_or(ctx.bbox);
        let page = DelayedPage {
            page_num,
            mediabox,
            custom_props: ctx.custom_props,
            used_form_widgets: ctx.used_widgets.iter().copied().collect(),
            used_annotations: ctx.used_annotations.iter().copied().collect(),
            transition: ctx.transition,
            subnav_root,
            structparents,
        };
        let page_object_num = self.add_object(PdfObject::DelayedPage(page));
        for w in &ctx.used_widgets {
            self.form_use.insert(*w, page_object_num);
        }
        for a in &ctx.used_annotations {
            self.annotation_use.insert(*a, page_object_num);
        }
        for (mcid, s) in ctx.used_structures.iter().enumerate() {
            self.structure_use.insert(
                *s,
                StructureUsage {
                    page_num,
                    mcid: mcid as i32,
                },
            );
        }
        self.pages.push(PageOffsets {
            resource_num,
            commands_num,
            page_obj_num: page_object_num,
        });
        Ok(PageId(page_num))
    }

    /// Finalize a tiling pattern context into a pattern object.
    pub fn add_pattern(&mut self, ctx: DrawContext) -> Result<PatternId> {
        self.check_finalizable(&ctx, DrawContextType::ColorTilingPattern)?;
        let resources = self.build_resource_dict(&ctx.resources)?;
        let commands = ctx.commands;
        let dict = format!(
            "<<\n  /Type /Pattern\n  /PatternType 1\n  /PaintType 1\n  /TilingType 1\n  \
             /BBox [ {} {} {} {} ]\n  /XStep {}\n  /YStep {}\n  /Resources {}  /Length {}\n>>\n",
            crate::util::fmt_fixed(0.0),
            crate::util::fmt_fixed(0.0),
            crate::util::fmt_fixed(ctx.bbox.width()),
            crate::util::fmt_fixed(ctx.bbox.height()),
            crate::util::fmt_fixed(ctx.bbox.width()),
            crate::util::fmt_fixed(ctx.bbox.height()),
            resources,
            commands.len(),
        );
        let obj = self.add_object(PdfObject::full_with_stream(dict, commands.into_bytes()));
        Ok(PatternId(obj))
    }

    /// Finalize a form XObject context.
    pub fn add_form_xobject(&mut self, ctx: DrawContext) -> Result<FormXObjectId> {
        self.check_finalizable(&ctx, DrawContextType::FormXObject)?;
        let resources = self.build_resource_dict(&ctx.resources)?;
        let commands = ctx.commands;
        let dict = format!(
            "<<\n  /Type /XObject\n  /Subtype /Form\n  /BBox [ {} {} {} {} ]\n  \
             /Resources {}  /Length {}\n>>\n",
            crate::util::fmt_fixed(ctx.bbox.left()),
            crate::util::fmt_fixed(ctx.bbox.top()),
            crate::util::fmt_fixed(ctx.bbox.right()),
            crate::util::fmt_fixed(ctx.bbox.bottom()),
            resources,
            commands.len(),
        );
        let obj = self.add_object(PdfObject::full_with_stream(dict, commands.into_bytes()));
        self.form_xobjects.push(obj);
        Ok(FormXObjectId(self.form_xobjects.len() - 1))
    }

    /// Finalize a transparency group context.
    pub fn add_transparency_group(&mut self, ctx: DrawContext) -> Result<TransparencyGroupId> {
        self.check_finalizable(&ctx, DrawContextType::TransparencyGroup)?;
        let resources = self.build_resource_dict(&ctx.resources)?;
        let mut group = String::from("  /Group <<\n    /S /Transparency\n");
        if let Some(props) = &ctx.transparency_props {
            if let Some(cs) = props.colorspace {
                let _ = writeln!(group, "    /CS {}", cs.name());
            }
            if let Some(isolated) = props.isolated {
                let _ = writeln!(group, "    /I {isolated}");
            }
            if let Some(knockout) = props.knockout {
                let _ = writeln!(group, "    /K {knockout}");
            }
        }
        group.push_str("  >>\n");
        let commands = ctx.commands;
        let dict = format!(
            "<<\n  /Type /XObject\n  /Subtype /Form\n  /BBox [ {} {} {} {} ]\n{}  \
             /Resources {}  /Length {}\n>>\n",
            crate::util::fmt_fixed(ctx.bbox.left()),
            crate::util::fmt_fixed(ctx.bbox.top()),
            crate::util::fmt_fixed(ctx.bbox.right()),
            crate::util::fmt_fixed(ctx.bbox.bottom()),
            group,
            resources,
            commands.len(),
        );
        let obj = self.add_object(PdfObject::full_with_stream(dict, commands.into_bytes()));
        self.transparency_groups.push(obj);
        Ok(TransparencyGroupId(self.transparency_groups.len() - 1))
    }

    /// Build the `/Resources` dictionary for a finalized context, mapping
    /// every first-use name to its indirect object.
    pub(crate) fn build_resource_dict(&self, res: &ResourceSet) -> Result<String> {
        let mut buf = String::from("<<\n");
        if !(res.subset_fonts.is_empty() && res.builtin_fonts.is_empty()) {
            buf.push_str("  /Font <<\n");
            for (name, (fid, subset)) in res.subset_fonts.entries() {
                let font = self.fonts.get(fid.0).ok_or(Error::IndexOutOfBounds)?;
                let objs = font
                    .subset_objects
                    .get(subset)
                    .ok_or(Error::IndexOutOfBounds)?;
                let _ = writeln!(buf, "    /{} {} 0 R", name, objs.font_obj);
            }
            for (name, bid) in res.builtin_fonts.entries() {
                let obj = self
                    .builtin_font_objects
                    .get(bid.0)
                    .ok_or(Error::IndexOutOfBounds)?;
                let _ = writeln!(buf, "    /{} {} 0 R", name, obj);
            }
            buf.push_str("  >>\n");
        }
        if !(res.images.is_empty()
            && res.form_xobjects.is_empty()
            && res.transparency_groups.is_empty())
        {
            buf.push_str("  /XObject <<\n");
            for (name, id) in res.images.entries() {
                let info = self.image_infos.get(id.0).ok_or(Error::IndexOutOfBounds)?;
                let _ = writeln!(buf, "    /{} {} 0 R", name, info.obj);
            }
            for (name, id) in res.form_xobjects.entries() {
                let obj = self.form_xobjects.get(id.0).ok_or(Error::IndexOutOfBounds)?;
                let _ = writeln!(buf, "    /{} {} 0 R", name, obj);
            }
            for (name, id) in res.transparency_groups.entries() {
                let obj = self
                    .transparency_groups
                    .get(id.0)
                    .ok_or(Error::IndexOutOfBounds)?;
                let _ = writeln!(buf, "    /{} {} 0 R", name, obj);
            }
            buf.push_str("  >>\n");
        }
        if !res.gstates.is_empty() {
            buf.push_str("  /ExtGState <<\n");
            for (name, id) in res.gstates.entries() {
                self.check_object_number(id.0)?;
                let _ = writeln!(buf, "    /{} {} 0 R", name, id.0);
            }
            buf.push_str("  >>\n");
        }
        if !res.patterns.is_empty() {
            buf.push_str("  /Pattern <<\n");
            for (name, id) in res.patterns.entries() {
                self.check_object_number(id.0)?;
                let _ = writeln!(buf, "    /{} {} 0 R", name, id.0);
            }
            buf.push_str("  >>\n");
        }
        if !res.shadings.is_empty() {
            buf.push_str("  /Shading <<\n");
            for (name, id) in res.shadings.entries() {
                self.check_object_number(id.0)?;
                let _ = writeln!(buf, "    /{} {} 0 R", name, id.0);
            }
            buf.push_str("  >>\n");
        }
        if !res.colorspaces.is_empty() {
            buf.push_str("  /ColorSpace <<\n");
            for (name, cs) in res.colorspaces.entries() {
                let obj = match cs {
                    ColorspaceRef::Icc(id) => {
                        self.icc_profiles
                            .get(id.0)
                            .ok_or(Error::IndexOutOfBounds)?
                            .object_num
                    }
                    ColorspaceRef::Lab(id) => {
                        self.check_object_number(id.0)?;
                        id.0
                    }
                    ColorspaceRef::Separation(id) => *self
                        .separation_objects
                        .get(id.0)
                        .ok_or(Error::IndexOutOfBounds)?,
                    ColorspaceRef::All => *self
                        .separation_objects
                        .first()
                        .ok_or(Error::IndexOutOfBounds)?,
                };
                let _ = writeln!(buf, "    /{} {} 0 R", name, obj);
            }
            buf.push_str("  >>\n");
        }
        if !res.ocgs.is_empty() {
            buf.push_str("  /Properties <<\n");
            for (name, id) in res.ocgs.entries() {
                let obj = self.ocg_objects.get(id.0).ok_or(Error::IndexOutOfBounds)?;
                let _ = writeln!(buf, "    /{} {} 0 R", name, obj);
            }
            buf.push_str("  >>\n");
        }
        buf.push_str(">>\n");
        Ok(buf)
    }

    fn check_object_number(&self, num: usize) -> Result<()> {
        if num == 0 || num >= self.objects.len() {
            return Err(Error::IndexOutOfBounds);
        }
        Ok(())
    }

    fn ocg_object_number(&self, id: OptionalContentGroupId) -> Result<usize> {
        self.ocg_objects
            .get(id.0)
            .copied()
            .ok_or(Error::IndexOutOfBounds)
    }

    /// Build the navigation node chain for sub-page navigation. The nodes
    /// reference each other by future object numbers, so their insertion
    /// order must not change.
    fn create_subnavigation(&mut self, subnav: &[SubPageNavigation]) -> Result<usize> {
        let root_obj = self.objects.len();
        {
            let mut rootbuf = String::from(
                "<<\n  /Type /NavNode\n  /NA <<\n    /S /SetOCGState\n    /State [ /OFF\n",
            );
            for i in subnav {
                let _ = writeln!(rootbuf, "      {} 0 R", self.ocg_object_number(i.id)?);
            }
            rootbuf.push_str("    ]\n  >>\n");
            let _ = writeln!(rootbuf, "  /Next {} 0 R", root_obj + 1);
            rootbuf.push_str("  /PA <<\n    /S /SetOCGState\n    /State [ /ON\n");
            for i in subnav {
                let _ = writeln!(rootbuf, "      {} 0 R", self.ocg_object_number(i.id)?);
            }
            rootbuf.push_str("    ]\n  >>\n");
            let _ = writeln!(rootbuf, "  /Prev {} 0 R", root_obj + 1 + subnav.len());
            rootbuf.push_str(">>\n");
            self.add_object(PdfObject::full(rootbuf));
        }
        let first_obj = self.objects.len();
        for (i, sn) in subnav.iter().enumerate() {
            let mut buf = String::from("<<\n  /Type /NavNode\n");
            buf.push_str("  /NA <<\n");
            let _ = writeln!(
                buf,
                "    /S /SetOCGState\n    /State [ /ON {} 0 R ]",
                self.ocg_object_number(sn.id)?
            );
            if let Some(tr) = &sn.transition {
                buf.push_str("    /Next <<\n      /S /Trans\n      /Trans <<\n");
                tr.write_dict_entries(&mut buf, "        ");
                buf.push_str("      >>\n    >>\n");
            }
            buf.push_str("  >>\n");
            let _ = writeln!(buf, "  /Next {} 0 R", first_obj + i + 1);
            if i > 0 {
                let _ = writeln!(
                    buf,
                    "  /PA <<\n    /S /SetOCGState\n    /State [ /OFF {} 0 R ]\n  >>",
                    self.ocg_object_number(subnav[i - 1].id)?
                );
                let _ = writeln!(buf, "  /Prev {} 0 R", first_obj + i - 1);
            }
            buf.push_str(">>\n");
            self.add_object(PdfObject::full(buf));
        }
        let terminal = format!(
            "<<\n  /Type /NavNode\n  /PA <<\n    /S /SetOCGState\n    \
             /State [ /OFF {} 0 R ]\n  >>\n  /Prev {} 0 R\n>>\n",
            self.ocg_object_number(subnav[subnav.len() - 1].id)?,
            first_obj + subnav.len() - 1,
        );
        self.add_object(PdfObject::full(terminal));
        Ok(root_obj)
    }
}

/// Colorspaces and color sources.
impl Document {
    /// Register an ICC profile as an ICC-based colorspace. Profiles with
    /// identical bytes share one colorspace.
    ///
    /// The channel count is supplied by the caller; this crate does not
    /// parse profile data.
    pub fn load_icc_profile(&mut self, contents: &[u8], num_channels: i32) -> Result<IccColorSpaceId> {
        if contents.is_empty() {
            return Err(Error::UnsupportedFormat);
        }
        if let Some(existing) = self.find_icc_profile(contents) {
            if self.icc_profiles[existing.0].num_channels != num_channels {
                return Err(Error::ColorspaceMismatch);
            }
            return Ok(existing);
        }
        Ok(self.store_icc_profile(contents, num_channels))
    }

    fn find_icc_profile(&self, contents: &[u8]) -> Option<IccColorSpaceId> {
        self.icc_profiles
            .iter()
            .position(|info| match &self.objects[info.stream_num] {
                PdfObject::DeflateStream(stream) => stream.stream == contents,
                _ => false,
            })
            .map(IccColorSpaceId)
    }

    pub(crate) fn store_icc_profile(&mut self, contents: &[u8], num_channels: i32) -> IccColorSpaceId {
        debug_assert!(self.find_icc_profile(contents).is_none());
        let buf = format!("<<\n  /N {num_channels}\n");
        let stream_num = self.add_object(PdfObject::deflate_stream(buf, contents.to_vec()));
        let object_num =
            self.add_object(PdfObject::full(format!("[ /ICCBased {stream_num} 0 R ]\n")));
        self.icc_profiles.push(IccInfo {
            stream_num,
            object_num,
            num_channels,
        });
        IccColorSpaceId(self.icc_profiles.len() - 1)
    }

    /// Create a separation colorspace with a CMYK fallback rendering.
    pub fn create_separation(
        &mut self,
        name: &str,
        fallback: DeviceCmykColor,
    ) -> Result<SeparationId> {
        if name.starts_with('/') {
            return Err(Error::SlashStart);
        }
        check_units(&[fallback.c, fallback.m, fallback.y, fallback.k])?;
        let stream = format!(
            "{{ dup {} mul\nexch {} exch dup {} mul\nexch {} mul\n}}\n",
            fallback.c, fallback.m, fallback.y, fallback.k,
        );
        let buf = format!(
            "<<\n  /FunctionType 4\n  /Domain [ 0.0 1.0 ]\n  \
             /Range [ 0.0 1.0 0.0 1.0 0.0 1.0 0.0 1.0 ]\n  /Length {}\n>>\n",
            stream.len(),
        );
        let fn_num = self.add_object(PdfObject::full_with_stream(buf, stream.into_bytes()));
        let cs = format!(
            "[\n  /Separation\n    /{}\n    /DeviceCMYK\n    {} 0 R\n]\n",
            name, fn_num,
        );
        let obj = self.add_object(PdfObject::full(cs));
        self.separation_objects.push(obj);
        Ok(SeparationId(self.separation_objects.len() - 1))
    }

    /// Create a Lab colorspace.
    pub fn add_lab_colorspace(&mut self, lab: LabColorSpace) -> LabId {
        let buf = format!(
            "[ /Lab\n  <<\n    /WhitePoint [ {} {} {} ]\n    /Range [ {} {} {} {} ]\n  >>\n]\n",
            crate::util::fmt_fixed(lab.xw),
            crate::util::fmt_fixed(lab.yw),
            crate::util::fmt_fixed(lab.zw),
            crate::util::fmt_fixed(lab.amin),
            crate::util::fmt_fixed(lab.amax),
            crate::util::fmt_fixed(lab.bmin),
            crate::util::fmt_fixed(lab.bmax),
        );
        LabId(self.add_object(PdfObject::full(buf)))
    }

    /// Register an extended graphics state.
    pub fn add_graphics_state(&mut self, state: &GraphicsState) -> GraphicsStateId {
        GraphicsStateId(self.add_object(PdfObject::full(state.to_dict())))
    }

    /// Register a type 2 interpolation function.
    pub fn add_function(&mut self, func: &FunctionType2) -> Result<FunctionId> {
        let dict = func.to_dict()?;
        Ok(FunctionId(self.add_object(PdfObject::full(dict))))
    }

    /// Register a shading of any supported type.
    pub fn add_shading(&mut self, shading: impl Into<Shading>) -> Result<ShadingId> {
        let obj = match shading.into() {
            Shading::Axial(shade) => {
                self.check_object_number(shade.function.0)?;
                self.add_object(PdfObject::full(shade.to_dict()))
            }
            Shading::Radial(shade) => {
                self.check_object_number(shade.function.0)?;
                self.add_object(PdfObject::full(shade.to_dict()))
            }
            Shading::FreeForm(shade) => {
                let serialized = serialize_shade4(&shade)?;
                let dict = mesh_shading_dict(
                    4,
                    shade.colorspace,
                    serialized.len(),
                    shade.minx,
                    shade.miny,
                    shade.maxx,
                    shade.maxy,
                );
                self.add_object(PdfObject::full_with_stream(dict, serialized))
            }
            Shading::Coons(shade) => {
                let serialized = serialize_shade6(&shade)?;
                let dict = mesh_shading_dict(
                    6,
                    shade.colorspace,
                    serialized.len(),
                    shade.minx,
                    shade.miny,
                    shade.maxx,
                    shade.maxy,
                );
                self.add_object(PdfObject::full_with_stream(dict, serialized))
            }
        };
        Ok(ShadingId(obj))
    }

    /// Register an optional-content group.
    pub fn add_optional_content_group(
        &mut self,
        group: &OptionalContentGroup,
    ) -> OptionalContentGroupId {
        let buf = format!(
            "<<\n  /Type /OCG\n  /Name {}\n>>\n",
            pdf_string_literal(&group.name)
        );
        let obj = self.add_object(PdfObject::full(buf));
        self.ocg_objects.push(obj);
        OptionalContentGroupId(self.ocg_objects.len() - 1)
    }
}

/// Fonts and text.
impl Document {
    /// Load a TrueType font from raw file bytes.
    pub fn load_font(&mut self, data: impl Into<Data>) -> Result<FontId> {
        let font = Font::new(data.into(), 0)?;
        let fid = FontId(self.fonts.len());
        self.fonts.push(LoadedFont {
            font,
            subsets: FontSubsetter::new(),
            subset_objects: Vec::new(),
        });
        self.allocate_subset_objects(fid, 0);
        Ok(fid)
    }

    /// Reserve the four delayed objects backing one subset font: the font
    /// program, the descriptor, the ToUnicode CMap and the font dictionary.
    fn allocate_subset_objects(&mut self, fid: FontId, subset: usize) {
        let data_obj = self.add_object(PdfObject::DelayedSubsetFontData { fid, subset });
        let descriptor_obj = self.add_object(PdfObject::DelayedSubsetFontDescriptor {
            fid,
            subfont_data_obj: data_obj,
            subset,
        });
        let cmap_obj = self.add_object(PdfObject::DelayedSubsetCMap { fid, subset });
        let font_obj = self.add_object(PdfObject::DelayedSubsetFont {
            fid,
            subfont_descriptor_obj: descriptor_obj,
            subfont_cmap_obj: cmap_obj,
            subset,
        });
        self.fonts[fid.0].subset_objects.push(SubsetFontObjects {
            data_obj,
            descriptor_obj,
            cmap_obj,
            font_obj,
        });
    }

    /// Resolve a codepoint to its stable subset slot, assigning one on
    /// first use.
    pub fn get_subset_glyph(&mut self, fid: FontId, codepoint: u32) -> Result<SubsetGlyph> {
        let font = self.fonts.get_mut(fid.0).ok_or(Error::IndexOutOfBounds)?;
        if font.font.glyph_index(codepoint).is_none() {
            return Err(Error::MissingGlyph);
        }
        let before = font.subsets.num_subsets();
        let slot = font.subsets.get_glyph_subset(codepoint);
        if font.subsets.num_subsets() > before {
            self.allocate_subset_objects(fid, slot.subset);
        }
        Ok(slot)
    }

    /// The horizontal advance of a codepoint at the given size, if the
    /// font maps it.
    pub fn glyph_advance(&self, fid: FontId, pointsize: f32, codepoint: u32) -> Option<f32> {
        let font = &self.fonts.get(fid.0)?.font;
        let gid = font.glyph_index(codepoint)?;
        let advance = font.advance_width(gid)?;
        Some(advance / font.units_per_em() * pointsize)
    }

    /// The id of a builtin font, materializing its font dictionary on
    /// first use.
    pub fn get_builtin_font_id(&mut self, font: BuiltinFont) -> BuiltinFontId {
        if let Some(existing) = self.builtin_fonts.get(&font) {
            return *existing;
        }
        let dict = format!(
            "<<\n  /Type /Font\n  /Subtype /Type1\n  /BaseFont /{}\n>>\n",
            font.base_font()
        );
        let obj = self.add_object(PdfObject::full(dict));
        self.builtin_font_objects.push(obj);
        let id = BuiltinFontId(self.builtin_font_objects.len() - 1);
        self.builtin_fonts.insert(font, id);
        id
    }

    /// Pad every font's last subset so that glyph id 32 renders as a
    /// space. Called once during finalization.
    pub(crate) fn pad_subset_fonts(&mut self) {
        for font in &mut self.fonts {
            font.subsets.pad_last_subset_until_space();
        }
    }
}

/// Images.
impl Document {
    /// Embed a decoded raster image.
    pub fn add_image(&mut self, image: RasterImage) -> Result<ImageId> {
        self.add_image_inner(image, false)
    }

    /// Embed a 1-bit grayscale image as a stencil mask.
    pub fn add_mask_image(&mut self, image: RasterImage) -> Result<ImageId> {
        if image.metadata.colorspace != Colorspace::DeviceGray || image.metadata.pixel_depth != 1 {
            return Err(Error::UnsupportedFormat);
        }
        let md = image.metadata.clone();
        self.add_image_object(
            md.width,
            md.height,
            md.pixel_depth,
            md.interpolation,
            ImageColorspace::Device(md.colorspace),
            None,
            true,
            &image.pixels,
        )
    }

    fn add_image_inner(&mut self, image: RasterImage, is_mask: bool) -> Result<ImageId> {
        let md = image.metadata.clone();
        if md.width == 0 || md.height == 0 {
            return Err(Error::InvalidImageSize);
        }
        if image.pixels.is_empty() {
            return Err(Error::MissingPixels);
        }
        if is_mask && !image.alpha.is_empty() {
            return Err(Error::MaskAndAlpha);
        }
        let smask_id = if image.alpha.is_empty() {
            None
        } else {
            let alpha_obj = self.add_image_object(
                md.width,
                md.height,
                md.alpha_depth,
                md.interpolation,
                ImageColorspace::Device(Colorspace::DeviceGray),
                None,
                false,
                &image.alpha,
            )?;
            Some(self.image_infos[alpha_obj.0].obj)
        };
        if !image.icc_profile.is_empty() {
            let icc_id =
                self.load_icc_profile(&image.icc_profile, md.colorspace.num_channels())?;
            return self.add_image_object(
                md.width,
                md.height,
                md.pixel_depth,
                md.interpolation,
                ImageColorspace::Icc(icc_id),
                smask_id,
                is_mask,
                &image.pixels,
            );
        }
        if md.colorspace == Colorspace::DeviceGray {
            // Grayscale images are always passed through directly.
            return self.add_image_object(
                md.width,
                md.height,
                md.pixel_depth,
                md.interpolation,
                ImageColorspace::Device(md.colorspace),
                smask_id,
                is_mask,
                &image.pixels,
            );
        }
        // Cross-colorspace conversion is not performed; a CMYK document
        // accepts only CMYK (or tagged) pixel data.
        if self.settings.output_colorspace == Colorspace::DeviceCmyk {
            if self.settings.cmyk_profile.is_none() {
                return Err(Error::NoCmykProfile);
            }
            if md.colorspace != Colorspace::DeviceCmyk {
                return Err(Error::UnsupportedFormat);
            }
        }
        self.add_image_object(
            md.width,
            md.height,
            md.pixel_depth,
            md.interpolation,
            ImageColorspace::Device(md.colorspace),
            smask_id,
            is_mask,
            &image.pixels,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn add_image_object(
        &mut self,
        w: u32,
        h: u32,
        bits_per_component: i32,
        interpolate: ImageInterpolation,
        colorspace: ImageColorspace,
        smask_id: Option<usize>,
        is_mask: bool,
        uncompressed_bytes: &[u8],
    ) -> Result<ImageId> {
        let compressed = crate::util::flate_compress(uncompressed_bytes);
        let mut buf = format!(
            "<<\n  /Type /XObject\n  /Subtype /Image\n  /Width {}\n  /Height {}\n  \
             /BitsPerComponent {}\n  /Length {}\n  /Filter /FlateDecode\n",
            w,
            h,
            bits_per_component,
            compressed.len(),
        );
        match interpolate {
            ImageInterpolation::Auto => {}
            ImageInterpolation::Pixelated => buf.push_str("  /Interpolate false\n"),
            ImageInterpolation::Smooth => buf.push_str("  /Interpolate true\n"),
        }
        // An image may only have an ImageMask or a ColorSpace key, not both.
        if is_mask {
            buf.push_str("  /ImageMask true\n");
        } else {
            match colorspace {
                ImageColorspace::Device(cs) => {
                    let _ = writeln!(buf, "  /ColorSpace {}", cs.name());
                }
                ImageColorspace::Icc(id) => {
                    let icc_obj = self
                        .icc_profiles
                        .get(id.0)
                        .ok_or(Error::IndexOutOfBounds)?
                        .object_num;
                    let _ = writeln!(buf, "  /ColorSpace {} 0 R", icc_obj);
                }
            }
        }
        if let Some(smask) = smask_id {
            let _ = writeln!(buf, "  /SMask {} 0 R", smask);
        }
        buf.push_str(">>\n");
        let obj = self.add_object(PdfObject::full_with_stream(buf, compressed));
        self.image_infos.push(ImageInfo {
            width: w,
            height: h,
            obj,
        });
        Ok(ImageId(self.image_infos.len() - 1))
    }

    /// Embed a JPEG file without re-encoding it.
    pub fn embed_jpg(
        &mut self,
        jpg: JpgImage,
        interpolate: ImageInterpolation,
    ) -> Result<ImageId> {
        if jpg.width == 0 || jpg.height == 0 {
            return Err(Error::InvalidImageSize);
        }
        if jpg.data.is_empty() {
            return Err(Error::MissingPixels);
        }
        let mut buf = format!(
            "<<\n  /Type /XObject\n  /Subtype /Image\n  /ColorSpace /DeviceRGB\n  \
             /Width {}\n  /Height {}\n  /BitsPerComponent 8\n  /Length {}\n  \
             /Filter /DCTDecode\n",
            jpg.width,
            jpg.height,
            jpg.data.len(),
        );
        match interpolate {
            ImageInterpolation::Auto => {}
            ImageInterpolation::Pixelated => buf.push_str("  /Interpolate false\n"),
            ImageInterpolation::Smooth => buf.push_str("  /Interpolate true\n"),
        }
        buf.push_str(">>\n");
        let obj = self.add_object(PdfObject::full_with_stream(buf, jpg.data));
        self.image_infos.push(ImageInfo {
            width: jpg.width,
            height: jpg.height,
            obj,
        });
        Ok(ImageId(self.image_infos.len() - 1))
    }
}

/// Interchange features.
impl Document {
    /// Add an outline entry pointing at a page, optionally nested under an
    /// earlier entry.
    pub fn add_outline(
        &mut self,
        title: &str,
        dest: PageId,
        parent: Option<OutlineId>,
    ) -> Result<OutlineId> {
        let parent = match parent {
            Some(p) => {
                if p.0 >= self.outlines.items.len() {
                    return Err(Error::IndexOutOfBounds);
                }
                Some(p.0 as i32)
            }
            None => None,
        };
        let id = self.outlines.add(title.to_string(), dest, parent);
        Ok(OutlineId(id as usize))
    }

    /// Add a structure item tagged with a builtin structure type.
    pub fn add_structure_item(
        &mut self,
        stype: StructureType,
        parent: Option<StructureItemId>,
    ) -> Result<StructureItemId> {
        self.add_structure_item_inner(StructItemKind::Builtin(stype), parent)
    }

    /// Add a structure item tagged with a custom role.
    pub fn add_structure_item_with_role(
        &mut self,
        role: RoleId,
        parent: Option<StructureItemId>,
    ) -> Result<StructureItemId> {
        if role.0 >= self.rolemap.len() {
            return Err(Error::IndexOutOfBounds);
        }
        self.add_structure_item_inner(StructItemKind::Role(role), parent)
    }

    fn add_structure_item_inner(
        &mut self,
        kind: StructItemKind,
        parent: Option<StructureItemId>,
    ) -> Result<StructureItemId> {
        if let Some(parent) = parent {
            if parent.0 >= self.structure_items.len() {
                return Err(Error::IndexOutOfBounds);
            }
        }
        let id = StructureItemId(self.structure_items.len());
        let obj_id = self.add_object(PdfObject::DelayedStructItem { id });
        self.structure_items.push(StructItem {
            obj_id,
            kind,
            parent,
        });
        Ok(id)
    }

    /// Map a custom role name onto a builtin structure type.
    pub fn add_rolemap_entry(&mut self, name: &str, builtin: StructureType) -> Result<RoleId> {
        if name.is_empty() || name.starts_with('/') {
            return Err(Error::SlashStart);
        }
        if self.rolemap.iter().any(|entry| entry.name == name) {
            return Err(Error::RoleAlreadyDefined);
        }
        self.rolemap.push(RolemapEntry {
            name: name.to_string(),
            builtin,
        });
        Ok(RoleId(self.rolemap.len() - 1))
    }

    pub(crate) fn structure_item_tag(&self, sid: StructureItemId) -> Result<String> {
        let item = self
            .structure_items
            .get(sid.0)
            .ok_or(Error::IndexOutOfBounds)?;
        Ok(match item.kind {
            StructItemKind::Builtin(stype) => stype.name().to_string(),
            StructItemKind::Role(role) => self.rolemap[role.0].name.clone(),
        })
    }

    /// Embed a file, producing an entry for the document's name dictionary.
    pub fn embed_file(&mut self, filename: &str, contents: &[u8]) -> Result<EmbeddedFileId> {
        let dict = format!(
            "<<\n  /Type /EmbeddedFile\n  /Length {}\n>>\n",
            contents.len()
        );
        let fileobj_id = self.add_object(PdfObject::full_with_stream(dict, contents.to_vec()));
        let filespec = format!(
            "<<\n  /Type /Filespec\n  /F {}\n  /EF << /F {} 0 R >>\n>>\n",
            pdf_string_literal(filename),
            fileobj_id,
        );
        let filespec_obj = self.add_object(PdfObject::full(filespec));
        self.embedded_files.push(EmbeddedFileObject { filespec_obj });
        Ok(EmbeddedFileId(self.embedded_files.len() - 1))
    }

    /// Register an annotation. Its rectangle is required; the annotation is
    /// attached to a page with [`DrawContext::annotate`].
    pub fn create_annotation(&mut self, annotation: Annotation) -> Result<AnnotationId> {
        if annotation.rect.is_none() {
            return Err(Error::AnnotationMissingRect);
        }
        if let AnnotationKind::FileAttachment { file } = &annotation.kind {
            if file.0 >= self.embedded_files.len() {
                return Err(Error::IndexOutOfBounds);
            }
        }
        let id = AnnotationId(self.annotations.len());
        let obj_id = self.add_object(PdfObject::DelayedAnnotation { id, annotation });
        self.annotations.push(obj_id);
        Ok(id)
    }

    /// Register a checkbox form widget whose on and off appearances are
    /// form XObjects.
    pub fn create_form_checkbox(
        &mut self,
        rect: Rect,
        onstate: FormXObjectId,
        offstate: FormXObjectId,
        partial_name: &str,
    ) -> Result<FormWidgetId> {
        if onstate.0 >= self.form_xobjects.len() || offstate.0 >= self.form_xobjects.len() {
            return Err(Error::IndexOutOfBounds);
        }
        let id = FormWidgetId(self.form_widgets.len());
        let obj_id = self.add_object(PdfObject::DelayedCheckboxWidget(DelayedCheckboxWidget {
            id,
            rect,
            on_state: onstate,
            off_state: offstate,
            partial_name: partial_name.to_string(),
        }));
        self.form_widgets.push(obj_id);
        Ok(id)
    }

    /// The number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The pixel dimensions of an embedded image.
    pub fn image_size(&self, image: ImageId) -> Option<(u32, u32)> {
        let info = self.image_infos.get(image.0)?;
        Some((info.width, info.height))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::color::Color;

    #[test]
    fn icc_profiles_are_deduplicated() {
        let mut doc = Document::new();
        let profile = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let a = doc.load_icc_profile(&profile, 3).unwrap();
        let b = doc.load_icc_profile(&profile, 3).unwrap();
        assert_eq!(a, b);
        let c = doc.load_icc_profile(&[9u8, 9, 9], 3).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn cmyk_output_requires_profile() {
        let settings = SerializeSettings {
            output_colorspace: Colorspace::DeviceCmyk,
            ..Default::default()
        };
        assert!(matches!(
            Document::new_with(settings),
            Err(Error::OutputProfileMissing)
        ));
    }

    #[test]
    fn intent_requires_identifier() {
        let settings = SerializeSettings {
            subtype: Some(IntentSubtype::PdfX),
            rgb_profile: Some(vec![0u8; 16]),
            ..Default::default()
        };
        assert!(matches!(
            Document::new_with(settings),
            Err(Error::MissingIntentIdentifier)
        ));
    }

    #[test]
    fn pattern_requires_matching_context_type() {
        let mut doc = Document::new();
        let ctx = doc.new_page_context(10.0, 10.0);
        assert!(matches!(
            doc.add_pattern(ctx),
            Err(Error::InvalidDrawContextType)
        ));
    }

    #[test]
    fn contexts_are_bound_to_their_document() {
        let doc_a = Document::new();
        let mut doc_b = Document::new();
        let ctx = doc_a.new_page_context(10.0, 10.0);
        assert!(matches!(
            doc_b.add_page(ctx),
            Err(Error::IncorrectDocumentForObject)
        ));
    }

    #[test]
    fn unbalanced_context_cannot_become_a_page() {
        let mut doc = Document::new();
        let mut ctx = doc.new_page_context(10.0, 10.0);
        ctx.cmd_q();
        assert!(matches!(
            doc.add_page(ctx),
            Err(Error::DrawStateEndMismatch)
        ));
    }

    #[test]
    fn open_marked_content_cannot_become_a_page() {
        let mut doc = Document::new();
        let mut ctx = doc.new_page_context(10.0, 10.0);
        ctx.cmd_BMC("Artifact").unwrap();
        assert!(matches!(
            doc.add_page(ctx),
            Err(Error::UnclosedMarkedContent)
        ));
    }

    #[test]
    fn annotations_attach_to_at_most_one_page() {
        let mut doc = Document::new();
        let annotation = Annotation::new_text_annotation("note".to_string())
            .with_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap());
        let aid = doc.create_annotation(annotation).unwrap();

        let mut first = doc.new_page_context(100.0, 100.0);
        first.annotate(aid).unwrap();
        doc.add_page(first).unwrap();

        let mut second = doc.new_page_context(100.0, 100.0);
        second.annotate(aid).unwrap();
        assert!(matches!(doc.add_page(second), Err(Error::AnnotationReuse)));
    }

    #[test]
    fn structure_items_attach_to_at_most_one_page() {
        let mut doc = Document::new();
        let root = doc.add_structure_item(StructureType::Document, None).unwrap();
        let para = doc.add_structure_item(StructureType::P, Some(root)).unwrap();

        let mut first = doc.new_page_context(100.0, 100.0);
        first.cmd_BDC_struct(&doc, para).unwrap();
        first.cmd_EMC().unwrap();
        doc.add_page(first).unwrap();

        let mut second = doc.new_page_context(100.0, 100.0);
        second.cmd_BDC_struct(&doc, para).unwrap();
        second.cmd_EMC().unwrap();
        assert!(matches!(doc.add_page(second), Err(Error::StructureReuse)));
    }

    #[test]
    fn missing_annotation_rect_is_rejected() {
        let mut doc = Document::new();
        let annotation = Annotation::new_text_annotation("note".to_string());
        assert!(matches!(
            doc.create_annotation(annotation),
            Err(Error::AnnotationMissingRect)
        ));
    }

    #[test]
    fn rolemap_rejects_duplicates_and_slashes() {
        let mut doc = Document::new();
        doc.add_rolemap_entry("Datetime", StructureType::Span).unwrap();
        assert!(matches!(
            doc.add_rolemap_entry("Datetime", StructureType::Part),
            Err(Error::RoleAlreadyDefined)
        ));
        assert!(matches!(
            doc.add_rolemap_entry("/Bad", StructureType::Span),
            Err(Error::SlashStart)
        ));
    }

    #[test]
    fn mask_image_must_be_one_bit_gray() {
        let mut doc = Document::new();
        let image = RasterImage {
            metadata: crate::graphics::image::ImageMetadata {
                width: 4,
                height: 4,
                pixel_depth: 8,
                alpha_depth: 0,
                interpolation: ImageInterpolation::Auto,
                colorspace: Colorspace::DeviceRgb,
            },
            pixels: vec![0u8; 48],
            alpha: Vec::new(),
            icc_profile: Vec::new(),
        };
        assert!(matches!(
            doc.add_mask_image(image),
            Err(Error::UnsupportedFormat)
        ));
    }

    #[test]
    fn separation_color_round_trips_through_context() {
        let mut doc = Document::new();
        let sep = doc
            .create_separation("Gold", DeviceCmykColor { c: 0.0, m: 0.2, y: 0.8, k: 0.1 })
            .unwrap();
        let mut ctx = doc.new_page_context(10.0, 10.0);
        ctx.set_nonstroke_color(&Color::Separation(
            crate::graphics::color::SeparationColor { id: sep, value: 0.5 },
        ))
        .unwrap();
        assert_eq!(ctx.command_stream(), "/CS0 cs\n0.5 scn\n");
        doc.add_page(ctx).unwrap();
    }
}
