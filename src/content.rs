//! A low-level abstraction over a single content stream.
//!
//! A [`DrawContext`] accumulates PDF operators as indented UTF-8 text while
//! tracking a stack of open drawing states (save/restore pairs, text
//! objects, marked-content sequences) and the resources the stream refers
//! to. Methods named `cmd_*` map one-to-one to the PDF operator of the same
//! name, in the order of Annex A of the PDF specification.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::ops::{Deref, DerefMut};

use float_cmp::approx_eq;

use crate::document::{
    AnnotationId, Document, FontId, FormWidgetId, FormXObjectId, GraphicsStateId, ImageId,
    OptionalContentGroupId, PageProperties, ShadingId, StructureItemId, TransparencyGroupId,
};
use crate::error::{Error, Result};
use crate::geom::Rect;
use crate::graphics::color::{check_unit, check_units, Color};
use crate::graphics::ext_g_state::{LineCap, LineJoin, RenderingIntent};
use crate::interchange::navigation::{SubPageNavigation, Transition};
use crate::resource::{ColorspaceRef, ResourceSet};
use crate::text::{BuiltinFont, PdfGlyph};

/// What a draw context's content stream will become.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawContextType {
    /// A page content stream.
    Page,
    /// The cell of a colored tiling pattern.
    ColorTilingPattern,
    /// A reusable form XObject.
    FormXObject,
    /// A transparency group XObject.
    TransparencyGroup,
}

/// Properties of a transparency group XObject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransparencyGroupProperties {
    /// The blending colorspace of the group.
    pub colorspace: Option<crate::graphics::color::Colorspace>,
    /// Whether the group is isolated.
    pub isolated: Option<bool>,
    /// Whether the group is a knockout group.
    pub knockout: Option<bool>,
}

/// The text rendering mode set with `Tr`.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextMode {
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextMode {
    fn to_pdf(self) -> i32 {
        match self {
            TextMode::Fill => 0,
            TextMode::Stroke => 1,
            TextMode::FillStroke => 2,
            TextMode::Invisible => 3,
            TextMode::FillClip => 4,
            TextMode::StrokeClip => 5,
            TextMode::FillStrokeClip => 6,
            TextMode::Clip => 7,
        }
    }
}

/// A paintable XObject selectable with `Do`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum XObjectRef {
    /// A form XObject.
    Form(FormXObjectId),
    /// A transparency group.
    TransparencyGroup(TransparencyGroupId),
}

impl From<FormXObjectId> for XObjectRef {
    fn from(id: FormXObjectId) -> Self {
        XObjectRef::Form(id)
    }
}

impl From<TransparencyGroupId> for XObjectRef {
    fn from(id: TransparencyGroupId) -> Self {
        XObjectRef::TransparencyGroup(id)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DrawState {
    MarkedContent,
    SaveState,
    Text,
}

/// An in-progress content stream.
///
/// Created through [`Document::new_page_context`] and its siblings, mutated
/// through the operator methods, and finalized by handing it back to the
/// document (for example with [`Document::add_page`]).
#[derive(Debug)]
pub struct DrawContext {
    pub(crate) doc_id: u64,
    pub(crate) context_type: DrawContextType,
    pub(crate) commands: String,
    ind: String,
    dstate_stack: Vec<DrawState>,
    marked_depth: i32,
    pub(crate) bbox: Rect,
    pub(crate) resources: ResourceSet,
    pub(crate) used_widgets: BTreeSet<FormWidgetId>,
    pub(crate) used_annotations: BTreeSet<AnnotationId>,
    /// A vector because the order doubles as marked-content id order.
    pub(crate) used_structures: Vec<StructureItemId>,
    pub(crate) sub_navigations: Vec<SubPageNavigation>,
    pub(crate) transition: Option<Transition>,
    pub(crate) custom_props: PageProperties,
    pub(crate) transparency_props: Option<TransparencyGroupProperties>,
}

/// Scope-based q/Q pairing: the matching `Q` is emitted when the guard is
/// dropped. Derefs to the underlying context so drawing can continue inside
/// the saved state.
pub struct GstateGuard<'a> {
    ctx: &'a mut DrawContext,
}

impl Deref for GstateGuard<'_> {
    type Target = DrawContext;

    fn deref(&self) -> &DrawContext {
        self.ctx
    }
}

impl DerefMut for GstateGuard<'_> {
    fn deref_mut(&mut self) -> &mut DrawContext {
        self.ctx
    }
}

impl Drop for GstateGuard<'_> {
    fn drop(&mut self) {
        let _ = self.ctx.cmd_Q();
    }
}

#[allow(non_snake_case)]
impl DrawContext {
    pub(crate) fn new(doc_id: u64, context_type: DrawContextType, bbox: Rect) -> Self {
        DrawContext {
            doc_id,
            context_type,
            commands: String::new(),
            ind: String::new(),
            dstate_stack: Vec::new(),
            marked_depth: 0,
            bbox,
            resources: ResourceSet::new(),
            used_widgets: BTreeSet::new(),
            used_annotations: BTreeSet::new(),
            used_structures: Vec::new(),
            sub_navigations: Vec::new(),
            transition: None,
            custom_props: PageProperties::default(),
            transparency_props: None,
        }
    }

    fn op(&mut self, text: &str) {
        self.commands.push_str(&self.ind);
        self.commands.push_str(text);
        self.commands.push('\n');
    }

    fn indent(&mut self, dtype: DrawState) {
        self.dstate_stack.push(dtype);
        self.ind.push_str("  ");
    }

    fn dedent(&mut self, dtype: DrawState) -> Result<()> {
        match self.dstate_stack.last() {
            None => return Err(Error::DrawStateEndMismatch),
            Some(top) if *top != dtype => return Err(Error::DrawStateEndMismatch),
            _ => {}
        }
        if self.ind.len() < 2 {
            // The stack and the indentation can only go out of sync through
            // a bug in this type; emitting more operators would produce a
            // malformed stream.
            panic!("draw context indentation underflow");
        }
        self.dstate_stack.pop();
        self.ind.truncate(self.ind.len() - 2);
        Ok(())
    }

    fn check_marked_nesting(&self) -> Result<()> {
        if self.dstate_stack.contains(&DrawState::MarkedContent) {
            return Err(Error::NestedBMC);
        }
        Ok(())
    }

    /// The kind of content stream this context produces.
    pub fn draw_context_type(&self) -> DrawContextType {
        self.context_type
    }

    /// The width of the context's bounding box.
    pub fn get_w(&self) -> f32 {
        self.bbox.width()
    }

    /// The height of the context's bounding box.
    pub fn get_h(&self) -> f32 {
        self.bbox.height()
    }

    /// How many marked-content sequences are currently open.
    pub fn marked_content_depth(&self) -> i32 {
        self.marked_depth
    }

    /// Whether any save-state, text or marked-content block is still open.
    pub fn has_unclosed_state(&self) -> bool {
        !self.dstate_stack.is_empty()
    }

    pub(crate) fn command_stream(&self) -> &str {
        &self.commands
    }

    /// Save the graphics state and return a guard that restores it when
    /// dropped.
    pub fn push_gstate(&mut self) -> GstateGuard<'_> {
        self.cmd_q();
        GstateGuard { ctx: self }
    }

    /// Close a subpath and fill and stroke it using the nonzero winding rule.
    pub fn cmd_b(&mut self) {
        self.op("b");
    }

    /// Fill and stroke the path using the nonzero winding rule.
    pub fn cmd_B(&mut self) {
        self.op("B");
    }

    /// Close a subpath and fill and stroke it using the even-odd rule.
    pub fn cmd_bstar(&mut self) {
        self.op("b*");
    }

    /// Fill and stroke the path using the even-odd rule.
    pub fn cmd_Bstar(&mut self) {
        self.op("B*");
    }

    /// Begin a marked-content sequence with an inline property dictionary.
    pub fn cmd_BDC(&mut self, tag: &str, properties: &str) -> Result<()> {
        if tag.starts_with('/') {
            return Err(Error::SlashStart);
        }
        self.check_marked_nesting()?;
        self.op(&format!("/{tag} {properties} BDC"));
        self.indent(DrawState::MarkedContent);
        self.marked_depth += 1;
        Ok(())
    }

    /// Begin a marked-content sequence for a structure item, assigning the
    /// next marked-content id of this context.
    pub fn cmd_BDC_struct(&mut self, doc: &Document, sid: StructureItemId) -> Result<()> {
        doc.check_same_document(self.doc_id)?;
        let tag = doc.structure_item_tag(sid)?;
        self.check_marked_nesting()?;
        let mcid = self.used_structures.len();
        self.op(&format!("/{tag} << /MCID {mcid} >> BDC"));
        self.indent(DrawState::MarkedContent);
        self.marked_depth += 1;
        self.used_structures.push(sid);
        Ok(())
    }

    /// Begin a marked-content sequence gated on an optional-content group.
    pub fn cmd_BDC_ocg(&mut self, id: OptionalContentGroupId) -> Result<()> {
        self.check_marked_nesting()?;
        let name = self.resources.ocgs.remap_with_name(id);
        self.op(&format!("/OC /{name} BDC"));
        self.indent(DrawState::MarkedContent);
        self.marked_depth += 1;
        Ok(())
    }

    /// Begin a marked-content sequence.
    pub fn cmd_BMC(&mut self, tag: &str) -> Result<()> {
        if tag.starts_with('/') {
            return Err(Error::SlashStart);
        }
        self.check_marked_nesting()?;
        self.op(&format!("/{tag} BMC"));
        self.indent(DrawState::MarkedContent);
        self.marked_depth += 1;
        Ok(())
    }

    /// Begin a text object.
    pub fn cmd_BT(&mut self) {
        self.op("BT");
        self.indent(DrawState::Text);
    }

    /// Append a cubic Bézier segment with two control points.
    pub fn cmd_c(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        self.op(&format!("{x1} {y1} {x2} {y2} {x3} {y3} c"));
    }

    /// Concatenate a matrix to the current transformation matrix.
    pub fn cmd_cm(&mut self, m1: f32, m2: f32, m3: f32, m4: f32, m5: f32, m6: f32) {
        self.op(&format!("{m1} {m2} {m3} {m4} {m5} {m6} cm"));
    }

    /// Set the stroking colorspace by resource name.
    pub fn cmd_CS(&mut self, cspace_name: &str) {
        self.op(&format!("/{cspace_name} CS"));
    }

    /// Set the non-stroking colorspace by resource name.
    pub fn cmd_cs(&mut self, cspace_name: &str) {
        self.op(&format!("/{cspace_name} cs"));
    }

    /// Set the dash pattern.
    pub fn cmd_d(&mut self, dash_array: &[f32], phase: f32) {
        let mut line = String::from("[ ");
        for d in dash_array {
            let _ = write!(line, "{d} ");
        }
        let _ = write!(line, "] {phase} d");
        self.op(&line);
    }

    /// Paint a form XObject or transparency group.
    pub fn cmd_Do(&mut self, xobject: impl Into<XObjectRef>) {
        let name = match xobject.into() {
            XObjectRef::Form(id) => self.resources.form_xobjects.remap_with_name(id),
            XObjectRef::TransparencyGroup(id) => {
                self.resources.transparency_groups.remap_with_name(id)
            }
        };
        self.op(&format!("/{name} Do"));
    }

    /// End the innermost marked-content sequence.
    pub fn cmd_EMC(&mut self) -> Result<()> {
        self.dedent(DrawState::MarkedContent)?;
        self.op("EMC");
        self.marked_depth -= 1;
        Ok(())
    }

    /// End the current text object.
    pub fn cmd_ET(&mut self) -> Result<()> {
        self.dedent(DrawState::Text)?;
        self.op("ET");
        Ok(())
    }

    /// Fill the path using the nonzero winding rule.
    pub fn cmd_f(&mut self) {
        self.op("f");
    }

    /// Fill the path using the even-odd rule.
    pub fn cmd_fstar(&mut self) {
        self.op("f*");
    }

    /// Set the stroking gray level.
    pub fn cmd_G(&mut self, gray: f32) -> Result<()> {
        check_unit(gray)?;
        self.op(&format!("{gray} G"));
        Ok(())
    }

    /// Set the non-stroking gray level.
    pub fn cmd_g(&mut self, gray: f32) -> Result<()> {
        check_unit(gray)?;
        self.op(&format!("{gray} g"));
        Ok(())
    }

    /// Select an extended graphics state.
    pub fn cmd_gs(&mut self, id: GraphicsStateId) {
        let name = self.resources.gstates.remap_with_name(id);
        self.op(&format!("/{name} gs"));
    }

    /// Close the current subpath.
    pub fn cmd_h(&mut self) {
        self.op("h");
    }

    /// Set the flatness tolerance.
    pub fn cmd_i(&mut self, flatness: f32) {
        self.op(&format!("{flatness} i"));
    }

    /// Set the line join style.
    pub fn cmd_j(&mut self, join_style: LineJoin) {
        self.op(&format!("{} j", join_style.to_pdf()));
    }

    /// Set the line cap style.
    pub fn cmd_J(&mut self, cap_style: LineCap) {
        self.op(&format!("{} J", cap_style.to_pdf()));
    }

    /// Set the stroking CMYK color.
    pub fn cmd_K(&mut self, c: f32, m: f32, y: f32, k: f32) -> Result<()> {
        check_units(&[c, m, y, k])?;
        self.op(&format!("{c} {m} {y} {k} K"));
        Ok(())
    }

    /// Set the non-stroking CMYK color.
    pub fn cmd_k(&mut self, c: f32, m: f32, y: f32, k: f32) -> Result<()> {
        check_units(&[c, m, y, k])?;
        self.op(&format!("{c} {m} {y} {k} k"));
        Ok(())
    }

    /// Append a straight segment.
    pub fn cmd_l(&mut self, x: f32, y: f32) {
        self.op(&format!("{x} {y} l"));
    }

    /// Begin a new subpath.
    pub fn cmd_m(&mut self, x: f32, y: f32) {
        self.op(&format!("{x} {y} m"));
    }

    /// Set the miter limit.
    pub fn cmd_M(&mut self, miterlimit: f32) {
        self.op(&format!("{miterlimit} M"));
    }

    /// End the path without filling or stroking it.
    pub fn cmd_n(&mut self) {
        self.op("n");
    }

    /// Save the graphics state.
    pub fn cmd_q(&mut self) {
        self.op("q");
        self.indent(DrawState::SaveState);
    }

    /// Restore the graphics state.
    pub fn cmd_Q(&mut self) -> Result<()> {
        self.dedent(DrawState::SaveState)?;
        self.op("Q");
        Ok(())
    }

    /// Append a rectangle to the path.
    pub fn cmd_re(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.op(&format!("{x} {y} {w} {h} re"));
    }

    /// Set the stroking RGB color.
    pub fn cmd_RG(&mut self, r: f32, g: f32, b: f32) -> Result<()> {
        check_units(&[r, g, b])?;
        self.op(&format!("{r} {g} {b} RG"));
        Ok(())
    }

    /// Set the non-stroking RGB color.
    pub fn cmd_rg(&mut self, r: f32, g: f32, b: f32) -> Result<()> {
        check_units(&[r, g, b])?;
        self.op(&format!("{r} {g} {b} rg"));
        Ok(())
    }

    /// Set the rendering intent.
    pub fn cmd_ri(&mut self, ri: RenderingIntent) {
        self.op(&format!("/{} ri", ri.name()));
    }

    /// Close and stroke the path.
    pub fn cmd_s(&mut self) {
        self.op("s");
    }

    /// Stroke the path.
    pub fn cmd_S(&mut self) {
        self.op("S");
    }

    /// Set stroking color components in the current colorspace.
    pub fn cmd_SCN(&mut self, values: &[f32]) -> Result<()> {
        check_units(values)?;
        let mut line = String::new();
        for v in values {
            let _ = write!(line, "{v} ");
        }
        line.push_str("SCN");
        self.op(&line);
        Ok(())
    }

    /// Set non-stroking color components in the current colorspace.
    pub fn cmd_scn(&mut self, values: &[f32]) -> Result<()> {
        check_units(values)?;
        let mut line = String::new();
        for v in values {
            let _ = write!(line, "{v} ");
        }
        line.push_str("scn");
        self.op(&line);
        Ok(())
    }

    /// Paint the given shading over the clip region.
    pub fn cmd_sh(&mut self, shid: ShadingId) {
        let name = self.resources.shadings.remap_with_name(shid);
        self.op(&format!("/{name} sh"));
    }

    /// Set the text rendering mode.
    pub fn cmd_Tr(&mut self, mode: TextMode) {
        self.op(&format!("{} Tr", mode.to_pdf()));
    }

    /// Append a cubic Bézier segment whose first control point is the
    /// current point.
    pub fn cmd_v(&mut self, x2: f32, y2: f32, x3: f32, y3: f32) {
        self.op(&format!("{x2} {y2} {x3} {y3} v"));
    }

    /// Set the line width.
    pub fn cmd_w(&mut self, w: f32) {
        self.op(&format!("{w} w"));
    }

    /// Intersect the clip region with the path, nonzero winding rule.
    pub fn cmd_W(&mut self) {
        self.op("W");
    }

    /// Intersect the clip region with the path, even-odd rule.
    pub fn cmd_Wstar(&mut self) {
        self.op("W*");
    }

    /// Append a cubic Bézier segment whose second control point is the
    /// final point.
    pub fn cmd_y(&mut self, x1: f32, y1: f32, x3: f32, y3: f32) {
        self.op(&format!("{x1} {y1} {x3} {y3} y"));
    }
}

/// Color selection and higher-level drawing.
impl DrawContext {
    /// Set the stroking color.
    pub fn set_stroke_color(&mut self, c: &Color) -> Result<()> {
        self.set_color(c, true)
    }

    /// Set the non-stroking color.
    pub fn set_nonstroke_color(&mut self, c: &Color) -> Result<()> {
        self.set_color(c, false)
    }

    /// Set the stroking or non-stroking color, dispatching on the color
    /// family and registering any referenced colorspace.
    pub fn set_color(&mut self, c: &Color, stroke: bool) -> Result<()> {
        match c {
            Color::Rgb(rgb) => {
                if stroke {
                    self.cmd_RG(rgb.r, rgb.g, rgb.b)
                } else {
                    self.cmd_rg(rgb.r, rgb.g, rgb.b)
                }
            }
            Color::Gray(gray) => {
                if stroke {
                    self.cmd_G(gray.v)
                } else {
                    self.cmd_g(gray.v)
                }
            }
            Color::Cmyk(cmyk) => {
                if stroke {
                    self.cmd_K(cmyk.c, cmyk.m, cmyk.y, cmyk.k)
                } else {
                    self.cmd_k(cmyk.c, cmyk.m, cmyk.y, cmyk.k)
                }
            }
            Color::Icc(icc) => {
                check_units(&icc.values)?;
                let name = self
                    .resources
                    .colorspaces
                    .remap_with_name(ColorspaceRef::Icc(icc.id));
                if stroke {
                    self.cmd_CS(&name);
                    self.cmd_SCN(&icc.values)
                } else {
                    self.cmd_cs(&name);
                    self.cmd_scn(&icc.values)
                }
            }
            Color::Lab(lab) => {
                let name = self
                    .resources
                    .colorspaces
                    .remap_with_name(ColorspaceRef::Lab(lab.id));
                let values = format!("{} {} {}", lab.l, lab.a, lab.b);
                if stroke {
                    self.cmd_CS(&name);
                    self.op(&format!("{values} SCN"));
                } else {
                    self.cmd_cs(&name);
                    self.op(&format!("{values} scn"));
                }
                Ok(())
            }
            Color::Separation(sep) => {
                check_unit(sep.value)?;
                let name = self
                    .resources
                    .colorspaces
                    .remap_with_name(ColorspaceRef::Separation(sep.id));
                if stroke {
                    self.cmd_CS(&name);
                    self.cmd_SCN(&[sep.value])
                } else {
                    self.cmd_cs(&name);
                    self.cmd_scn(&[sep.value])
                }
            }
            Color::Pattern(pid) => {
                let name = self.resources.patterns.remap_with_name(*pid);
                if stroke {
                    self.cmd_CS("Pattern");
                    self.op(&format!("/{name} SCN"));
                } else {
                    self.cmd_cs("Pattern");
                    self.op(&format!("/{name} scn"));
                }
                Ok(())
            }
        }
    }

    /// Set the stroking color to full coverage of the `All` separation,
    /// which marks every colorant of a CMYK document.
    pub fn set_all_stroke_color(&mut self) {
        let name = self
            .resources
            .colorspaces
            .remap_with_name(ColorspaceRef::All);
        self.cmd_CS(&name);
        self.op("1 SCN");
    }

    /// Paint an image at the current transformation.
    pub fn draw_image(&mut self, image: ImageId) {
        let name = self.resources.images.remap_with_name(image);
        self.op(&format!("/{name} Do"));
    }

    /// Concatenate a scaling matrix.
    pub fn scale(&mut self, xscale: f32, yscale: f32) {
        self.cmd_cm(xscale, 0.0, 0.0, yscale, 0.0, 0.0);
    }

    /// Concatenate a translation matrix.
    pub fn translate(&mut self, xtran: f32, ytran: f32) {
        self.cmd_cm(1.0, 0.0, 0.0, 1.0, xtran, ytran);
    }

    /// Concatenate a rotation matrix. The angle is in radians.
    pub fn rotate(&mut self, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        self.cmd_cm(cos, sin, -sin, cos, 0.0, 0.0);
    }

    /// Append a circle of radius one around the origin to the path.
    pub fn draw_unit_circle(&mut self) {
        // Kappa, the distance of a Bézier control point approximating a
        // quarter circle.
        const C: f32 = 0.552285;
        self.cmd_m(1.0, 0.0);
        self.cmd_c(1.0, C, C, 1.0, 0.0, 1.0);
        self.cmd_c(-C, 1.0, -1.0, C, -1.0, 0.0);
        self.cmd_c(-1.0, -C, -C, -1.0, 0.0, -1.0);
        self.cmd_c(C, -1.0, 1.0, -C, 1.0, 0.0);
        self.cmd_h();
    }

    /// Append the unit square at the origin to the path.
    pub fn draw_unit_box(&mut self) {
        self.cmd_re(0.0, 0.0, 1.0, 1.0);
    }

    /// Attach a form widget to the page this context becomes.
    pub fn add_form_widget(&mut self, widget: FormWidgetId) -> Result<()> {
        if self.context_type != DrawContextType::Page {
            return Err(Error::InvalidDrawContextType);
        }
        self.used_widgets.insert(widget);
        Ok(())
    }

    /// Attach an annotation to the page this context becomes.
    pub fn annotate(&mut self, annotation: AnnotationId) -> Result<()> {
        if self.context_type != DrawContextType::Page {
            return Err(Error::InvalidDrawContextType);
        }
        self.used_annotations.insert(annotation);
        Ok(())
    }

    /// Set the transition used when this page is displayed.
    pub fn set_transition(&mut self, tr: Transition) -> Result<()> {
        if self.context_type != DrawContextType::Page {
            return Err(Error::InvalidDrawContextType);
        }
        self.transition = Some(tr);
        Ok(())
    }

    /// Set up slide-style sub-page navigation: each step reveals the next
    /// optional-content group, with an optional transition between steps.
    pub fn add_simple_navigation(
        &mut self,
        ocgs: &[OptionalContentGroupId],
        tr: Option<Transition>,
    ) -> Result<()> {
        if self.context_type != DrawContextType::Page {
            return Err(Error::InvalidDrawContextType);
        }
        for id in ocgs {
            self.sub_navigations.push(SubPageNavigation {
                id: *id,
                transition: tr.clone(),
            });
        }
        Ok(())
    }

    /// Override page properties for the page this context becomes.
    pub fn set_custom_page_properties(&mut self, new_props: PageProperties) -> Result<()> {
        if self.context_type != DrawContextType::Page {
            return Err(Error::InvalidDrawContextType);
        }
        self.custom_props = new_props;
        Ok(())
    }

    /// Set the transparency group properties of this context.
    pub fn set_transparency_properties(
        &mut self,
        props: TransparencyGroupProperties,
    ) -> Result<()> {
        if self.context_type != DrawContextType::TransparencyGroup {
            return Err(Error::InvalidDrawContextType);
        }
        self.transparency_props = Some(props);
        Ok(())
    }
}

/// A show-string run plus the `TJ` adjustments interleaved with it.
#[derive(Debug)]
enum TjItem {
    Show(Vec<u8>),
    Adjust(f32),
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    out.push('<');
    for b in bytes {
        let _ = write!(out, "{b:02X}");
    }
    out.push('>');
    out
}

/// Text runs.
impl DrawContext {
    fn flush_run(&mut self, items: &mut Vec<TjItem>) {
        if items.is_empty() {
            return;
        }
        let has_adjustments = items.iter().any(|i| matches!(i, TjItem::Adjust(_)));
        if !has_adjustments {
            // A single show string is enough.
            let mut bytes = Vec::new();
            for item in items.drain(..) {
                if let TjItem::Show(b) = item {
                    bytes.extend_from_slice(&b);
                }
            }
            self.op(&format!("{} Tj", hex_string(&bytes)));
            return;
        }
        let mut line = String::from("[ ");
        for item in items.drain(..) {
            match item {
                TjItem::Show(b) => {
                    let _ = write!(line, "{} ", hex_string(&b));
                }
                TjItem::Adjust(a) => {
                    let _ = write!(line, "{a} ");
                }
            }
        }
        line.push_str("] TJ");
        self.op(&line);
    }

    /// Render a text string at the given position. The glyphs are resolved
    /// into the font's subsets and shown with one `Tj` per subset run.
    pub fn render_text(
        &mut self,
        doc: &mut Document,
        text: &str,
        fid: FontId,
        pointsize: f32,
        x: f32,
        y: f32,
    ) -> Result<()> {
        doc.check_same_document(self.doc_id)?;
        // Resolve every glyph first so the command buffer stays untouched
        // when a codepoint is missing.
        let mut resolved = Vec::with_capacity(text.chars().count());
        for c in text.chars() {
            resolved.push(doc.get_subset_glyph(fid, c as u32)?);
        }

        self.cmd_BT();
        let mut cur_subset = None;
        let mut pending: Vec<u8> = Vec::new();
        for glyph in resolved {
            if cur_subset != Some(glyph.subset) {
                if !pending.is_empty() {
                    let bytes = std::mem::take(&mut pending);
                    self.op(&format!("{} Tj", hex_string(&bytes)));
                }
                let name = self
                    .resources
                    .subset_fonts
                    .remap_with_name((fid, glyph.subset));
                self.op(&format!("/{name} {pointsize} Tf"));
                if cur_subset.is_none() {
                    self.op(&format!("{x} {y} Td"));
                }
                cur_subset = Some(glyph.subset);
            }
            pending.push(glyph.glyph_id as u8);
        }
        if !pending.is_empty() {
            let bytes = std::mem::take(&mut pending);
            self.op(&format!("{} Tj", hex_string(&bytes)));
        }
        self.cmd_ET()
    }

    /// Render explicitly positioned glyphs. Gaps relative to the natural
    /// advance widths become numeric adjustments inside `TJ` arrays;
    /// vertical movement starts a new line with `Td`.
    pub fn render_glyphs(
        &mut self,
        doc: &mut Document,
        glyphs: &[PdfGlyph],
        fid: FontId,
        pointsize: f32,
    ) -> Result<()> {
        doc.check_same_document(self.doc_id)?;
        if glyphs.is_empty() {
            return Ok(());
        }
        let mut resolved = Vec::with_capacity(glyphs.len());
        for glyph in glyphs {
            resolved.push(doc.get_subset_glyph(fid, glyph.codepoint)?);
        }

        self.cmd_BT();
        let mut cur_subset = None;
        let mut items: Vec<TjItem> = Vec::new();
        let mut origin = (glyphs[0].x, glyphs[0].y);
        let mut pen = origin;
        for (i, glyph) in glyphs.iter().enumerate() {
            let slot = resolved[i];
            if cur_subset != Some(slot.subset) {
                self.flush_run(&mut items);
                let name = self
                    .resources
                    .subset_fonts
                    .remap_with_name((fid, slot.subset));
                self.op(&format!("/{name} {pointsize} Tf"));
                if cur_subset.is_none() {
                    self.op(&format!("{} {} Td", origin.0, origin.1));
                }
                cur_subset = Some(slot.subset);
            }
            if i > 0 {
                if !approx_eq!(f32, glyph.y, pen.1, epsilon = 0.001) {
                    self.flush_run(&mut items);
                    self.op(&format!(
                        "{} {} Td",
                        glyph.x - origin.0,
                        glyph.y - origin.1
                    ));
                    origin = (glyph.x, glyph.y);
                    pen = origin;
                } else {
                    let delta = glyph.x - pen.0;
                    if !approx_eq!(f32, delta, 0.0, epsilon = 0.001) {
                        items.push(TjItem::Adjust(-delta / pointsize * 1000.0));
                        pen.0 = glyph.x;
                    }
                }
            }
            match items.last_mut() {
                Some(TjItem::Show(bytes)) => bytes.push(slot.glyph_id as u8),
                _ => items.push(TjItem::Show(vec![slot.glyph_id as u8])),
            }
            pen.0 += doc.glyph_advance(fid, pointsize, glyph.codepoint).unwrap_or(0.0);
        }
        self.flush_run(&mut items);
        self.cmd_ET()
    }

    /// Render text in one of the builtin fonts. The text must be encodable
    /// as a PDF literal string.
    pub fn render_pdfdoc_text_builtin(
        &mut self,
        doc: &mut Document,
        pdfdoc_encoded_text: &str,
        font_id: BuiltinFont,
        pointsize: f32,
        x: f32,
        y: f32,
    ) -> Result<()> {
        doc.check_same_document(self.doc_id)?;
        let bid = doc.get_builtin_font_id(font_id);
        let name = self.resources.builtin_fonts.remap_with_name(bid);
        self.cmd_BT();
        self.op(&format!("/{name} {pointsize} Tf"));
        self.op(&format!("{x} {y} Td"));
        self.op(&format!(
            "{} Tj",
            crate::util::pdf_string_literal(pdfdoc_encoded_text)
        ));
        self.cmd_ET()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_ctx() -> DrawContext {
        DrawContext::new(
            0,
            DrawContextType::Page,
            Rect::from_xywh(0.0, 0.0, 200.0, 100.0).unwrap(),
        )
    }

    #[test]
    fn red_rectangle_stream() {
        let mut ctx = page_ctx();
        {
            let mut state = ctx.push_gstate();
            state.set_nonstroke_color(&Color::rgb(1.0, 0.0, 0.0)).unwrap();
            state.cmd_re(10.0, 10.0, 50.0, 50.0);
            state.cmd_f();
        }
        assert_eq!(
            ctx.command_stream(),
            "q\n  1 0 0 rg\n  10 10 50 50 re\n  f\nQ\n"
        );
        assert!(ctx.resources.subset_fonts.is_empty());
        assert!(ctx.resources.images.is_empty());
    }

    #[test]
    fn empty_gstate_guard_brackets_nothing() {
        let mut ctx = page_ctx();
        drop(ctx.push_gstate());
        assert_eq!(ctx.command_stream(), "q\nQ\n");
        assert!(!ctx.has_unclosed_state());
    }

    #[test]
    fn nesting_is_balanced_after_use() {
        let mut ctx = page_ctx();
        ctx.cmd_q();
        ctx.cmd_BT();
        ctx.cmd_Tr(TextMode::Stroke);
        ctx.cmd_ET().unwrap();
        ctx.cmd_Q().unwrap();
        let stream = ctx.command_stream();
        assert_eq!(stream.matches('q').count(), stream.matches('Q').count());
        assert_eq!(stream.matches("BT").count(), stream.matches("ET").count());
        assert!(!ctx.has_unclosed_state());
    }

    #[test]
    fn mismatched_end_operators_are_rejected() {
        let mut ctx = page_ctx();
        assert_eq!(ctx.cmd_Q(), Err(Error::DrawStateEndMismatch));
        ctx.cmd_q();
        assert_eq!(ctx.cmd_ET(), Err(Error::DrawStateEndMismatch));
        ctx.cmd_Q().unwrap();
    }

    #[test]
    fn marked_content_may_not_nest() {
        let mut ctx = page_ctx();
        ctx.cmd_BMC("Artifact").unwrap();
        assert_eq!(ctx.cmd_BMC("Span"), Err(Error::NestedBMC));
        assert_eq!(ctx.marked_content_depth(), 1);
        ctx.cmd_EMC().unwrap();
        assert_eq!(ctx.marked_content_depth(), 0);
        // A second sequence is fine once the first is closed.
        ctx.cmd_BMC("Span").unwrap();
        ctx.cmd_EMC().unwrap();
    }

    #[test]
    fn gray_component_range() {
        let mut ctx = page_ctx();
        assert_eq!(ctx.cmd_G(-0.01), Err(Error::ColorOutOfRange));
        assert_eq!(ctx.cmd_G(1.01), Err(Error::ColorOutOfRange));
        ctx.cmd_G(0.0).unwrap();
        ctx.cmd_G(1.0).unwrap();
        assert_eq!(ctx.command_stream(), "0 G\n1 G\n");
    }

    #[test]
    fn transform_helpers_emit_verbatim() {
        let mut ctx = page_ctx();
        ctx.translate(5.0, 7.0);
        ctx.translate(-5.0, -7.0);
        ctx.scale(1.0, 1.0);
        assert_eq!(
            ctx.command_stream(),
            "1 0 0 1 5 7 cm\n1 0 0 1 -5 -7 cm\n1 0 0 1 0 0 cm\n"
        );
    }

    #[test]
    fn indentation_follows_state_depth() {
        let mut ctx = page_ctx();
        ctx.cmd_q();
        ctx.cmd_q();
        ctx.cmd_w(2.0);
        ctx.cmd_Q().unwrap();
        ctx.cmd_Q().unwrap();
        assert_eq!(ctx.command_stream(), "q\n  q\n    2 w\n  Q\nQ\n");
    }

    #[test]
    fn pattern_color_selects_pattern_space() {
        let mut ctx = page_ctx();
        ctx.set_nonstroke_color(&Color::Pattern(crate::document::PatternId(12)))
            .unwrap();
        assert_eq!(ctx.command_stream(), "/Pattern cs\n/Pat0 scn\n");
    }

    #[test]
    fn non_page_contexts_reject_page_features() {
        let mut ctx = DrawContext::new(
            0,
            DrawContextType::FormXObject,
            Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap(),
        );
        assert_eq!(
            ctx.annotate(AnnotationId(0)),
            Err(Error::InvalidDrawContextType)
        );
        assert_eq!(
            ctx.set_transition(Transition::new(
                crate::interchange::navigation::TransitionStyle::Wipe
            )),
            Err(Error::InvalidDrawContextType)
        );
    }
}
