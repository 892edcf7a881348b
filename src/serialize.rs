//! Serializing the finished document.
//!
//! Finalization happens in three steps: font subsets are padded, the
//! catalog (and everything only it references: name dictionary, outlines,
//! structure trees) is appended so that the catalog becomes the last
//! object, and finally every object is written in id order, resolving the
//! delayed variants against the now-complete document state. The output is
//! assembled fully in memory; nothing is emitted for a document that
//! failed to finalize.

use std::fmt::Write as _;

use subsetter::GlyphRemapper;

use crate::document::{Document, PageOffsets};
use crate::error::{Error, Result};
use crate::interactive::annotation::AnnotationKind;
use crate::interchange::outline::OUTLINE_ROOT;
use crate::interchange::tagging::StructItemKind;
use crate::object::{
    DelayedCheckboxWidget, DelayedPage, DeflateStreamObject, FullObject, PdfObject,
};
use crate::text::font::Font;
use crate::util::{flate_compress, hash128, pdf_meta_string, pdf_string_literal};

impl Document {
    /// Finalize the document and return the serialized PDF file.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.pad_subset_fonts();
        self.create_catalog()?;
        write_document(&self)
    }

    fn create_catalog(&mut self) -> Result<()> {
        let mut name = String::new();
        let mut outline = String::new();
        let mut structure = String::new();

        if !self.embedded_files.is_empty() {
            let names = self.create_name_dict();
            name = format!("  /Names {} 0 R\n", names);
        }
        if !self.outlines.is_empty() {
            let outlines = self.create_outlines()?;
            outline = format!("  /Outlines {} 0 R\n", outlines);
        }
        if !self.structure_items.is_empty() {
            let treeid = self.create_structure_parent_tree();
            self.structure_parent_tree_object = Some(treeid);
            self.create_structure_root_dict()?;
            structure = format!(
                "  /StructTreeRoot {} 0 R\n",
                self.structure_root_object.ok_or(Error::Unreachable)?
            );
        }

        let mut buf = format!("<<\n  /Type /Catalog\n  /Pages {} 0 R\n", self.pages_object);
        buf.push_str(&outline);
        buf.push_str(&name);
        buf.push_str(&structure);
        if !self.settings.lang.is_empty() {
            let _ = writeln!(buf, "  /Lang {}", pdf_string_literal(&self.settings.lang));
        }
        if self.settings.is_tagged {
            buf.push_str("  /MarkInfo << /Marked true >>\n");
        }
        if let Some(oi) = self.output_intent_object {
            let _ = writeln!(buf, "  /OutputIntents [ {} 0 R ]", oi);
        }
        if !self.form_use.is_empty() {
            buf.push_str("  /AcroForm <<\n    /Fields [\n");
            for widget in &self.form_widgets {
                let _ = writeln!(buf, "      {} 0 R", widget);
            }
            buf.push_str("    ]\n    /NeedAppearances true\n  >>\n");
        }
        if !self.ocg_objects.is_empty() {
            buf.push_str("  /OCProperties <<\n    /OCGs [\n");
            for ocg in &self.ocg_objects {
                let _ = writeln!(buf, "      {} 0 R", ocg);
            }
            buf.push_str("    ]\n    /D << /BaseState /ON >>\n  >>\n");
        }
        buf.push_str(">>\n");
        self.add_object(PdfObject::full(buf));
        Ok(())
    }

    fn create_name_dict(&mut self) -> usize {
        let mut buf = format!(
            "<<\n/EmbeddedFiles <<\n  /Limits [ (embobj{:06}) (embobj{:06}) ]\n  /Names [\n",
            0,
            self.embedded_files.len() - 1,
        );
        for (i, file) in self.embedded_files.iter().enumerate() {
            let _ = writeln!(buf, "    (embobj{:06}) {} 0 R", i, file.filespec_obj);
        }
        buf.push_str("  ]\n>>\n>>\n");
        self.add_object(PdfObject::full(buf))
    }

    /// Write all outline items followed by the outlines root. Object
    /// numbers are computed up front, so the append order must match.
    fn create_outlines(&mut self) -> Result<usize> {
        let first_obj_num = self.objects.len();
        let outlines_obj_num = first_obj_num + self.outlines.items.len();
        let mut item_bufs = Vec::with_capacity(self.outlines.items.len());
        for (cur_id, cur_obj) in self.outlines.items.iter().enumerate() {
            let cur_id = cur_id as i32;
            let titlestr = pdf_meta_string(&cur_obj.title);
            let parent_id = self.outlines.parent[&cur_id];
            let siblings = &self.outlines.children[&parent_id];
            let dest_page = self
                .pages
                .get(cur_obj.dest.0)
                .ok_or(Error::IndexOutOfBounds)?;
            let mut oitem = format!(
                "<<\n  /Title {}\n  /Dest [ {} 0 R /XYZ null null null]\n",
                titlestr, dest_page.page_obj_num,
            );
            if siblings.len() > 1 {
                let loc = siblings
                    .iter()
                    .position(|id| *id == cur_id)
                    .ok_or(Error::Unreachable)?;
                if loc > 0 {
                    let _ = writeln!(oitem, "  /Prev {} 0 R", first_obj_num + siblings[loc - 1] as usize);
                }
                if loc + 1 < siblings.len() {
                    let _ = writeln!(oitem, "  /Next {} 0 R", first_obj_num + siblings[loc + 1] as usize);
                }
            }
            if let Some(children) = self.outlines.children.get(&cur_id) {
                let _ = writeln!(oitem, "  /First {} 0 R", first_obj_num + children[0] as usize);
                let _ = writeln!(
                    oitem,
                    "  /Last {} 0 R",
                    first_obj_num + children[children.len() - 1] as usize
                );
                let _ = writeln!(oitem, "  /Count {}", -(children.len() as i32));
            }
            let parent_obj = if parent_id >= 0 {
                first_obj_num + parent_id as usize
            } else {
                outlines_obj_num
            };
            let _ = writeln!(oitem, "  /Parent {} 0 R\n>>", parent_obj);
            item_bufs.push(oitem);
        }
        for oitem in item_bufs {
            self.add_object(PdfObject::full(oitem));
        }
        let top_level = &self.outlines.children[&OUTLINE_ROOT];
        let buf = format!(
            "<<\n  /Type /Outlines\n  /First {} 0 R\n  /Last {} 0 R\n  /Count {}\n>>\n",
            first_obj_num + top_level[0] as usize,
            first_obj_num + top_level[top_level.len() - 1] as usize,
            top_level.len(),
        );
        debug_assert_eq!(outlines_obj_num, self.objects.len());
        Ok(self.add_object(PdfObject::full(buf)))
    }

    fn create_structure_parent_tree(&mut self) -> usize {
        let mut buf = String::from("<< /Nums [\n");
        for (i, entry) in self.structure_parent_tree_items.iter().enumerate() {
            let _ = writeln!(buf, "  {} [", i);
            for sitem in entry {
                let _ = writeln!(buf, "    {} 0 R", self.structure_items[sitem.0].obj_id);
            }
            buf.push_str("  ]\n");
        }
        buf.push_str("] >>\n");
        self.add_object(PdfObject::full(buf))
    }

    fn create_structure_root_dict(&mut self) -> Result<()> {
        let parent_tree = self
            .structure_parent_tree_object
            .ok_or(Error::Unreachable)?;
        // The item added first without a parent is the root.
        let root = self
            .structure_items
            .iter()
            .position(|item| item.parent.is_none())
            .ok_or(Error::Unreachable)?;
        let mut buf = format!(
            "<<\n  /Type /StructTreeRoot\n  /K [ {} 0 R ]\n  /ParentTree {} 0 R\n  \
             /ParentTreeNextKey {}\n",
            self.structure_items[root].obj_id,
            parent_tree,
            self.structure_parent_tree_items.len(),
        );
        if !self.rolemap.is_empty() {
            buf.push_str("  /RoleMap <<\n");
            for entry in &self.rolemap {
                let _ = writeln!(buf, "    /{} /{}", entry.name, entry.builtin.name());
            }
            buf.push_str("  >>\n");
        }
        buf.push_str(">>\n");
        self.structure_root_object = Some(self.add_object(PdfObject::full(buf)));
        Ok(())
    }
}

fn push(buf: &mut Vec<u8>, text: &str) {
    buf.extend_from_slice(text.as_bytes());
}

fn write_document(doc: &Document) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(doc.objects.len().saturating_sub(1));
    for (num, object) in doc.objects.iter().enumerate().skip(1) {
        offsets.push(buf.len());
        push(&mut buf, &format!("{} 0 obj\n", num));
        write_object_body(doc, object, &mut buf)?;
        push(&mut buf, "endobj\n");
    }

    let xref_offset = buf.len();
    push(&mut buf, &format!("xref\n0 {}\n", doc.objects.len()));
    push(&mut buf, "0000000000 65535 f \n");
    for offset in &offsets {
        push(&mut buf, &format!("{:010} 00000 n \n", offset));
    }
    push(
        &mut buf,
        &format!(
            "trailer\n<<\n  /Size {}\n  /Root {} 0 R\n  /Info {} 0 R\n>>\nstartxref\n{}\n%%EOF\n",
            doc.objects.len(),
            doc.objects.len() - 1,
            crate::document::INFO_OBJECT,
            xref_offset,
        ),
    );
    Ok(buf)
}

fn write_stream(buf: &mut Vec<u8>, bytes: &[u8]) {
    push(buf, "stream\n");
    buf.extend_from_slice(bytes);
    push(buf, "\nendstream\n");
}

fn write_object_body(doc: &Document, object: &PdfObject, buf: &mut Vec<u8>) -> Result<()> {
    match object {
        PdfObject::DummyIndexZero => Err(Error::Unreachable),
        PdfObject::Full(FullObject { dictionary, stream }) => {
            push(buf, dictionary);
            if let Some(stream) = stream {
                write_stream(buf, stream);
            }
            Ok(())
        }
        PdfObject::DeflateStream(DeflateStreamObject {
            unclosed_dictionary,
            stream,
        }) => {
            let compressed = flate_compress(stream);
            push(buf, unclosed_dictionary);
            push(
                buf,
                &format!(
                    "  /Length {}\n  /Filter /FlateDecode\n>>\n",
                    compressed.len()
                ),
            );
            write_stream(buf, &compressed);
            Ok(())
        }
        PdfObject::DelayedPage(page) => {
            push(buf, &build_page_dict(doc, page)?);
            Ok(())
        }
        PdfObject::DelayedPages => {
            let mut dict = String::from("<<\n  /Type /Pages\n  /Kids [\n");
            for PageOffsets { page_obj_num, .. } in &doc.pages {
                let _ = writeln!(dict, "    {} 0 R", page_obj_num);
            }
            let _ = writeln!(dict, "  ]\n  /Count {}", doc.pages.len());
            let _ = writeln!(dict, "  /Group {} 0 R\n>>", doc.page_group_object);
            push(buf, &dict);
            Ok(())
        }
        PdfObject::DelayedSubsetFontData { fid, subset } => {
            let font = &doc.fonts[fid.0];
            let program = subset_font_program(&font.font, font.subsets.subset(*subset))?;
            let compressed = flate_compress(&program);
            push(
                buf,
                &format!(
                    "<<\n  /Length {}\n  /Length1 {}\n  /Filter /FlateDecode\n>>\n",
                    compressed.len(),
                    program.len(),
                ),
            );
            write_stream(buf, &compressed);
            Ok(())
        }
        PdfObject::DelayedSubsetFontDescriptor {
            fid,
            subfont_data_obj,
            subset,
        } => {
            push(buf, &build_font_descriptor(doc, fid.0, *subset, *subfont_data_obj));
            Ok(())
        }
        PdfObject::DelayedSubsetCMap { fid, subset } => {
            let cmap = build_to_unicode_cmap(doc.fonts[fid.0].subsets.subset(*subset));
            push(buf, &format!("<<\n  /Length {}\n>>\n", cmap.len()));
            write_stream(buf, cmap.as_bytes());
            Ok(())
        }
        PdfObject::DelayedSubsetFont {
            fid,
            subfont_descriptor_obj,
            subfont_cmap_obj,
            subset,
        } => {
            push(
                buf,
                &build_subset_font_dict(
                    doc,
                    fid.0,
                    *subset,
                    *subfont_descriptor_obj,
                    *subfont_cmap_obj,
                ),
            );
            Ok(())
        }
        PdfObject::DelayedAnnotation { id, annotation } => {
            let mut dict = String::from("<<\n  /Type /Annot\n");
            match &annotation.kind {
                AnnotationKind::Text { content } => {
                    dict.push_str("  /Subtype /Text\n");
                    let _ = writeln!(dict, "  /Contents {}", pdf_meta_string(content));
                }
                AnnotationKind::Link { uri } => {
                    dict.push_str("  /Subtype /Link\n");
                    let _ = writeln!(
                        dict,
                        "  /A <<\n    /S /URI\n    /URI {}\n  >>",
                        pdf_string_literal(uri)
                    );
                }
                AnnotationKind::FileAttachment { file } => {
                    dict.push_str("  /Subtype /FileAttachment\n");
                    let _ = writeln!(
                        dict,
                        "  /FS {} 0 R",
                        doc.embedded_files[file.0].filespec_obj
                    );
                }
            }
            let rect = annotation.rect.ok_or(Error::AnnotationMissingRect)?;
            let _ = writeln!(
                dict,
                "  /Rect [ {} {} {} {} ]",
                rect.left(),
                rect.top(),
                rect.right(),
                rect.bottom(),
            );
            if let Some(page_obj) = doc.annotation_use.get(id) {
                let _ = writeln!(dict, "  /P {} 0 R", page_obj);
            }
            dict.push_str(">>\n");
            push(buf, &dict);
            Ok(())
        }
        PdfObject::DelayedCheckboxWidget(widget) => {
            push(buf, &build_checkbox_widget_dict(doc, widget));
            Ok(())
        }
        PdfObject::DelayedStructItem { id } => {
            let item = &doc.structure_items[id.0];
            let tag = match item.kind {
                StructItemKind::Builtin(stype) => stype.name().to_string(),
                StructItemKind::Role(role) => doc.rolemap[role.0].name.clone(),
            };
            let mut dict = format!("<<\n  /Type /StructElem\n  /S /{}\n", tag);
            let parent_obj = match item.parent {
                Some(parent) => doc.structure_items[parent.0].obj_id,
                None => doc.structure_root_object.ok_or(Error::Unreachable)?,
            };
            let _ = writeln!(dict, "  /P {} 0 R", parent_obj);
            let usage = doc.structure_use.get(id);
            let children: Vec<usize> = doc
                .structure_items
                .iter()
                .filter(|other| other.parent == Some(*id))
                .map(|other| other.obj_id)
                .collect();
            if usage.is_some() || !children.is_empty() {
                dict.push_str("  /K [\n");
                if let Some(usage) = usage {
                    let _ = writeln!(dict, "    {}", usage.mcid);
                }
                for child in children {
                    let _ = writeln!(dict, "    {} 0 R", child);
                }
                dict.push_str("  ]\n");
            }
            if let Some(usage) = usage {
                let _ = writeln!(
                    dict,
                    "  /Pg {} 0 R",
                    doc.pages[usage.page_num].page_obj_num
                );
            }
            dict.push_str(">>\n");
            push(buf, &dict);
            Ok(())
        }
    }
}

fn build_page_dict(doc: &Document, page: &DelayedPage) -> Result<String> {
    let offsets = &doc.pages[page.page_num];
    let mut dict = format!(
        "<<\n  /Type /Page\n  /Parent {} 0 R\n",
        doc.pages_object
    );
    let mb = page.mediabox;
    let _ = writeln!(
        dict,
        "  /MediaBox [{} {} {} {}]",
        mb.left(),
        mb.top(),
        mb.right(),
        mb.bottom(),
    );
    let boxes = [
        ("CropBox", page.custom_props.crop_box),
        ("BleedBox", page.custom_props.bleed_box),
        ("TrimBox", page.custom_props.trim_box),
        ("ArtBox", page.custom_props.art_box),
    ];
    for (name, value) in boxes {
        if let Some(rect) = value {
            let _ = writeln!(
                dict,
                "  /{} [{} {} {} {}]",
                name,
                rect.left(),
                rect.top(),
                rect.right(),
                rect.bottom(),
            );
        }
    }
    let _ = writeln!(dict, "  /Contents {} 0 R", offsets.commands_num);
    let _ = writeln!(dict, "  /Resources {} 0 R", offsets.resource_num);
    if !(page.used_form_widgets.is_empty() && page.used_annotations.is_empty()) {
        dict.push_str("  /Annots [\n");
        for widget in &page.used_form_widgets {
            let _ = writeln!(dict, "    {} 0 R", doc.form_widgets[widget.0]);
        }
        for annotation in &page.used_annotations {
            let _ = writeln!(dict, "    {} 0 R", doc.annotations[annotation.0]);
        }
        dict.push_str("  ]\n");
    }
    if let Some(structparents) = page.structparents {
        let _ = writeln!(dict, "  /StructParents {}", structparents);
    }
    if let Some(tr) = &page.transition {
        dict.push_str("  /Trans <<\n");
        tr.write_dict_entries(&mut dict, "    ");
        dict.push_str("  >>\n");
    }
    if let Some(subnav) = page.subnav_root {
        let _ = writeln!(dict, "  /PresSteps {} 0 R", subnav);
    }
    dict.push_str(">>\n");
    Ok(dict)
}

fn build_checkbox_widget_dict(doc: &Document, widget: &DelayedCheckboxWidget) -> String {
    let mut dict = String::from("<<\n  /Type /Annot\n  /Subtype /Widget\n");
    let _ = writeln!(
        dict,
        "  /Rect [ {} {} {} {} ]",
        widget.rect.left(),
        widget.rect.top(),
        widget.rect.right(),
        widget.rect.bottom(),
    );
    dict.push_str("  /FT /Btn\n");
    let _ = writeln!(dict, "  /T {}", pdf_string_literal(&widget.partial_name));
    dict.push_str("  /V /Off\n  /AS /Off\n");
    let _ = writeln!(
        dict,
        "  /AP <<\n    /N <<\n      /Yes {} 0 R\n      /Off {} 0 R\n    >>\n  >>",
        doc.form_xobjects[widget.on_state.0],
        doc.form_xobjects[widget.off_state.0],
    );
    if let Some(page_obj) = doc.form_use.get(&widget.id) {
        let _ = writeln!(dict, "  /P {} 0 R", page_obj);
    }
    dict.push_str(">>\n");
    dict
}

/// Derive the six-letter tag marking a subset font's name.
fn subset_tag(fid: usize, subset: usize, codepoints: &[u32]) -> String {
    const BASE: u128 = 26;
    const SUBSET_TAG_LEN: usize = 6;
    let mut hash = hash128(&(fid, subset, codepoints));
    let mut letters = [b'A'; SUBSET_TAG_LEN];
    for l in letters.iter_mut() {
        *l = b'A' + (hash % BASE) as u8;
        hash /= BASE;
    }
    std::str::from_utf8(&letters)
        .expect("tag letters are ASCII")
        .to_string()
}

fn base_font_name(doc: &Document, fid: usize, subset: usize) -> String {
    let font = &doc.fonts[fid];
    let trimmed: String = font
        .font
        .info()
        .postscript_name
        .as_deref()
        .unwrap_or("Font")
        .chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .take(96)
        .collect();
    let name = if trimmed.is_empty() {
        "Font".to_string()
    } else {
        trimmed
    };
    let tag = subset_tag(fid, subset, font.subsets.subset(subset));
    format!("{}+{}", tag, name)
}

fn build_font_descriptor(doc: &Document, fid: usize, subset: usize, data_obj: usize) -> String {
    const FIXED_PITCH: u32 = 1 << 0;
    const SERIF: u32 = 1 << 1;
    const SYMBOLIC: u32 = 1 << 2;
    const ITALIC: u32 = 1 << 6;
    const SMALL_CAP: u32 = 1 << 17;

    let info = doc.fonts[fid].font.info();
    let to_pdf_units = |v: f32| v / info.units_per_em as f32 * 1000.0;

    let mut flags = SYMBOLIC | SMALL_CAP;
    if info.is_monospaced {
        flags |= FIXED_PITCH;
    }
    if info
        .postscript_name
        .as_deref()
        .is_some_and(|n| n.contains("Serif"))
    {
        flags |= SERIF;
    }
    if info.italic_angle != 0.0 {
        flags |= ITALIC;
    }

    let bbox = info.global_bbox;
    let ascent = to_pdf_units(info.ascent);
    let descent = to_pdf_units(info.descent);
    let cap_height = info.cap_height.map(to_pdf_units).unwrap_or(ascent);
    let stem_v = 10.0 + 0.244 * (info.weight - 50.0);

    format!(
        "<<\n  /Type /FontDescriptor\n  /FontName /{}\n  /Flags {}\n  \
         /FontBBox [ {} {} {} {} ]\n  /ItalicAngle {}\n  /Ascent {}\n  /Descent {}\n  \
         /CapHeight {}\n  /StemV {}\n  /FontFile2 {} 0 R\n>>\n",
        base_font_name(doc, fid, subset),
        flags,
        to_pdf_units(bbox.left()),
        to_pdf_units(bbox.top()),
        to_pdf_units(bbox.right()),
        to_pdf_units(bbox.bottom()),
        info.italic_angle,
        ascent,
        descent,
        cap_height,
        stem_v,
        data_obj,
    )
}

fn build_subset_font_dict(
    doc: &Document,
    fid: usize,
    subset: usize,
    descriptor_obj: usize,
    cmap_obj: usize,
) -> String {
    let font = &doc.fonts[fid];
    let codepoints = font.subsets.subset(subset);
    let upem = font.font.units_per_em();
    let mut widths = String::new();
    for cp in codepoints {
        let advance = font
            .font
            .glyph_index(*cp)
            .and_then(|gid| font.font.advance_width(gid))
            .unwrap_or(0.0);
        let _ = write!(widths, "{} ", advance / upem * 1000.0);
    }
    format!(
        "<<\n  /Type /Font\n  /Subtype /TrueType\n  /BaseFont /{}\n  /FirstChar 0\n  \
         /LastChar {}\n  /Widths [ {}]\n  /FontDescriptor {} 0 R\n  /ToUnicode {} 0 R\n>>\n",
        base_font_name(doc, fid, subset),
        codepoints.len().saturating_sub(1),
        widths,
        descriptor_obj,
        cmap_obj,
    )
}

/// Build the ToUnicode CMap mapping subset byte codes back to text.
fn build_to_unicode_cmap(codepoints: &[u32]) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo <<\n  /Registry (Adobe)\n  /Ordering (UCS)\n  /Supplement 0\n>> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<00> <FF>\nendcodespacerange\n",
    );
    let mut code = 0usize;
    for chunk in codepoints.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for cp in chunk {
            let mut target = String::new();
            if let Some(c) = char::from_u32(*cp) {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(target, "{:04X}", unit);
                }
            } else {
                target.push_str("FFFD");
            }
            let _ = writeln!(cmap, "<{:02X}> <{}>", code, target);
            code += 1;
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

fn subset_font_program(font: &Font, codepoints: &[u32]) -> Result<Vec<u8>> {
    let mut remapper = GlyphRemapper::new();
    for cp in codepoints {
        let gid = font
            .glyph_index(*cp)
            .map(|g| g.to_u32())
            .unwrap_or(0);
        let gid = u16::try_from(gid).map_err(|_| Error::UnsupportedFormat)?;
        remapper.remap(gid);
    }
    subsetter::subset(font.data(), font.index(), &remapper)
        .map_err(|_| Error::UnsupportedFormat)
}

#[cfg(test)]
mod tests {
    use crate::document::{Document, IntentSubtype, OptionalContentGroup, SerializeSettings};
    use crate::graphics::color::{Color, Colorspace};
    use crate::graphics::ext_g_state::GraphicsState;
    use crate::graphics::shading::{FunctionType2, ShadingType2};
    use crate::interactive::annotation::Annotation;
    use crate::interchange::tagging::StructureType;
    use crate::text::BuiltinFont;
    use crate::geom::Rect;

    fn uncompressed_settings() -> SerializeSettings {
        SerializeSettings {
            compress_streams: false,
            ..Default::default()
        }
    }

    fn text_of(pdf: &[u8]) -> String {
        String::from_utf8_lossy(pdf).into_owned()
    }

    #[test]
    fn empty_single_page_document() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let ctx = doc.new_page_context(200.0, 100.0);
        doc.add_page(ctx).unwrap();
        let pdf = doc.finish().unwrap();
        let s = text_of(&pdf);

        assert_eq!(&pdf[..9], b"%PDF-1.7\n");
        assert_eq!(pdf[9], b'%');
        assert!(pdf[10..14].iter().all(|b| *b >= 0x80));
        assert!(s.ends_with("%%EOF\n"));

        assert_eq!(s.matches("/MediaBox [0 0 200 100]").count(), 1);
        assert_eq!(s.matches("/Type /Page\n").count(), 1);
        assert!(s.contains("/Count 1"));

        // One xref entry per object plus the free entry.
        let object_count = s.matches(" 0 obj\n").count();
        let xref_pos = s.find("\nxref\n").unwrap() + 1;
        let subsection = s[xref_pos + 5..].lines().next().unwrap();
        let size: usize = subsection.strip_prefix("0 ").unwrap().parse().unwrap();
        assert_eq!(size, object_count + 1);
        assert_eq!(s.matches(" 00000 n \n").count(), object_count);
        assert_eq!(s.matches("0000000000 65535 f \n").count(), 1);

        // startxref points at the xref table.
        let sx = s.rfind("startxref\n").unwrap();
        let offset: usize = s[sx + 10..].lines().next().unwrap().parse().unwrap();
        assert_eq!(&pdf[offset..offset + 4], b"xref");

        // The catalog is the last object and the trailer's /Root.
        let root = object_count;
        assert!(s.contains(&format!("/Root {} 0 R", root)));
        assert!(s.contains(&format!("{} 0 obj\n<<\n  /Type /Catalog", root)));
        assert!(s.contains("/Info 1 0 R"));
    }

    #[test]
    fn red_rectangle_page_stream_is_uncompressed() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let mut ctx = doc.new_page_context(200.0, 200.0);
        {
            let mut state = ctx.push_gstate();
            state.set_nonstroke_color(&Color::rgb(1.0, 0.0, 0.0)).unwrap();
            state.cmd_re(10.0, 10.0, 50.0, 50.0);
            state.cmd_f();
        }
        doc.add_page(ctx).unwrap();
        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("q\n  1 0 0 rg\n  10 10 50 50 re\n  f\nQ\n"));
        assert!(!s.contains("/Font"));
        assert!(!s.contains("/XObject"));
    }

    #[test]
    fn compressed_page_streams_declare_the_filter() {
        let mut doc = Document::new();
        let mut ctx = doc.new_page_context(100.0, 100.0);
        ctx.cmd_re(0.0, 0.0, 10.0, 10.0);
        ctx.cmd_f();
        doc.add_page(ctx).unwrap();
        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/Filter /FlateDecode"));
        assert!(!s.contains("10 10 re"));
    }

    #[test]
    fn pdfx_cmyk_document() {
        let settings = SerializeSettings {
            output_colorspace: Colorspace::DeviceCmyk,
            subtype: Some(IntentSubtype::PdfX),
            intent_condition_identifier: "FOGRA39".to_string(),
            cmyk_profile: Some(vec![0u8; 128]),
            compress_streams: false,
            ..Default::default()
        };
        let mut doc = Document::new_with(settings).unwrap();
        let ctx = doc.new_page_context(100.0, 100.0);
        doc.add_page(ctx).unwrap();
        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/GTS_PDFXVersion (PDF/X-3:2003)"));
        assert!(s.contains("/Type /OutputIntent"));
        assert!(s.contains("/S /GTS_PDFX"));
        assert!(s.contains("/OutputConditionIdentifier (FOGRA39)"));
        assert!(s.contains("/OutputIntents [ "));
        assert!(s.contains("/S /Transparency\n  /CS /DeviceCMYK"));
        assert!(s.contains("/Group "));
    }

    #[test]
    fn tagged_structure_tree() {
        let settings = SerializeSettings {
            is_tagged: true,
            compress_streams: false,
            ..Default::default()
        };
        let mut doc = Document::new_with(settings).unwrap();
        let root = doc.add_structure_item(StructureType::Document, None).unwrap();
        let body = doc.add_structure_item(StructureType::Sect, Some(root)).unwrap();
        let para = doc.add_structure_item(StructureType::P, Some(body)).unwrap();

        let mut ctx = doc.new_page_context(100.0, 100.0);
        ctx.cmd_BDC_struct(&doc, para).unwrap();
        ctx.cmd_re(0.0, 0.0, 10.0, 10.0);
        ctx.cmd_f();
        ctx.cmd_EMC().unwrap();
        doc.add_page(ctx).unwrap();

        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/P << /MCID 0 >> BDC"));
        assert!(s.contains("/StructTreeRoot"));
        assert!(s.contains("/MarkInfo << /Marked true >>"));
        assert!(s.contains("/StructParents 0"));
        assert!(s.contains("/ParentTreeNextKey 1"));
        assert!(s.contains("/S /Document"));
        assert!(s.contains("/S /Sect"));
        assert!(s.contains("/S /P\n"));
        // The parent tree entry for index 0 references the paragraph item.
        assert!(s.contains("<< /Nums [\n  0 ["));
    }

    #[test]
    fn outline_tree_wiring() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let first = doc.add_page(doc.new_page_context(100.0, 100.0)).unwrap();
        let second = doc.add_page(doc.new_page_context(100.0, 100.0)).unwrap();
        let one = doc.add_outline("One", first, None).unwrap();
        doc.add_outline("Two", second, None).unwrap();
        doc.add_outline("One.A", first, Some(one)).unwrap();

        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/Type /Outlines"));
        assert!(s.contains("/Count 2"));
        assert!(s.contains("/Count -1"));
        assert!(s.contains("/Title (One)"));
        assert!(s.contains("/Title (One.A)"));
        assert!(s.contains("/Prev "));
        assert!(s.contains("/Next "));
        assert!(s.contains("/XYZ null null null"));
    }

    #[test]
    fn builtin_font_text_run() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let mut ctx = doc.new_page_context(200.0, 200.0);
        ctx.render_pdfdoc_text_builtin(&mut doc, "Hello", BuiltinFont::Helvetica, 12.0, 72.0, 700.0)
            .unwrap();
        doc.add_page(ctx).unwrap();
        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("BT\n  /BF0 12 Tf\n  72 700 Td\n  (Hello) Tj\nET\n"));
        assert!(s.contains("/BaseFont /Helvetica"));
        assert!(s.contains("/Subtype /Type1"));
        assert!(s.contains("/Font <<\n    /BF0 "));
    }

    #[test]
    fn optional_content_navigation_chain() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let a = doc.add_optional_content_group(&OptionalContentGroup::new("step 1".to_string()));
        let b = doc.add_optional_content_group(&OptionalContentGroup::new("step 2".to_string()));

        let mut ctx = doc.new_page_context(100.0, 100.0);
        ctx.cmd_BDC_ocg(a).unwrap();
        ctx.cmd_re(0.0, 0.0, 10.0, 10.0);
        ctx.cmd_f();
        ctx.cmd_EMC().unwrap();
        ctx.add_simple_navigation(&[a, b], None).unwrap();
        doc.add_page(ctx).unwrap();

        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/OC /oc0 BDC"));
        assert!(s.contains("/Properties <<\n    /oc0 "));
        assert!(s.contains("/OCProperties"));
        assert!(s.contains("/BaseState /ON"));
        assert!(s.contains("/PresSteps "));
        // Root node, one node per group, plus the terminal node.
        assert_eq!(s.matches("/Type /NavNode").count(), 4);
        assert!(s.contains("/S /SetOCGState"));
    }

    #[test]
    fn embedded_file_and_attachment() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let file = doc.embed_file("notes.txt", b"hello there").unwrap();
        let annotation = Annotation::new_file_attachment_annotation(file)
            .with_rect(Rect::from_xywh(10.0, 10.0, 20.0, 20.0).unwrap());
        let aid = doc.create_annotation(annotation).unwrap();
        let mut ctx = doc.new_page_context(100.0, 100.0);
        ctx.annotate(aid).unwrap();
        doc.add_page(ctx).unwrap();

        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/Type /EmbeddedFile"));
        assert!(s.contains("/Type /Filespec"));
        assert!(s.contains("/F (notes.txt)"));
        assert!(s.contains("/EmbeddedFiles"));
        assert!(s.contains("(embobj000000)"));
        assert!(s.contains("/Subtype /FileAttachment"));
        assert!(s.contains("/Annots [\n"));
        // The annotation points back at its page.
        assert!(s.contains("/P "));
    }

    #[test]
    fn shading_and_gstate_resources() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let function = doc
            .add_function(&FunctionType2 {
                domain: [0.0, 1.0],
                c0: Color::rgb(1.0, 0.0, 0.0),
                c1: Color::rgb(0.0, 0.0, 1.0),
                n: 1.0,
            })
            .unwrap();
        let shading = doc
            .add_shading(ShadingType2 {
                colorspace: Colorspace::DeviceRgb,
                x0: 0.0,
                y0: 0.0,
                x1: 100.0,
                y1: 0.0,
                function,
                extend0: true,
                extend1: true,
            })
            .unwrap();
        let gs = doc.add_graphics_state(&GraphicsState {
            fill_alpha: Some(0.5),
            ..Default::default()
        });

        let mut ctx = doc.new_page_context(100.0, 100.0);
        ctx.cmd_gs(gs);
        ctx.cmd_sh(shading);
        doc.add_page(ctx).unwrap();

        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/GS0 gs\n/Sh0 sh\n"));
        assert!(s.contains("/ShadingType 2"));
        assert!(s.contains("/FunctionType 2"));
        assert!(s.contains("/Shading <<\n    /Sh0 "));
        assert!(s.contains("/ExtGState <<\n    /GS0 "));
        assert!(s.contains("/ca 0.500000"));
    }

    #[test]
    fn checkbox_widget_round_trip() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let mut on = doc.new_form_xobject_context(10.0, 10.0);
        on.cmd_re(0.0, 0.0, 10.0, 10.0);
        on.cmd_f();
        let on = doc.add_form_xobject(on).unwrap();
        let off = doc.new_form_xobject_context(10.0, 10.0);
        let off = doc.add_form_xobject(off).unwrap();
        let widget = doc
            .create_form_checkbox(
                Rect::from_xywh(10.0, 10.0, 12.0, 12.0).unwrap(),
                on,
                off,
                "accept",
            )
            .unwrap();

        let mut ctx = doc.new_page_context(100.0, 100.0);
        ctx.add_form_widget(widget).unwrap();
        doc.add_page(ctx).unwrap();

        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/Subtype /Widget"));
        assert!(s.contains("/FT /Btn"));
        assert!(s.contains("/T (accept)"));
        assert!(s.contains("/AcroForm"));
        assert!(s.contains("/NeedAppearances true"));
        assert!(s.contains("/Subtype /Form"));
    }

    #[test]
    fn transparency_group_object() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let mut group = doc.new_transparency_group_context(50.0, 50.0);
        group
            .set_transparency_properties(crate::content::TransparencyGroupProperties {
                colorspace: Some(Colorspace::DeviceRgb),
                isolated: Some(true),
                knockout: None,
            })
            .unwrap();
        group.cmd_re(0.0, 0.0, 25.0, 25.0);
        group.cmd_f();
        let tg = doc.add_transparency_group(group).unwrap();

        let mut ctx = doc.new_page_context(100.0, 100.0);
        ctx.cmd_Do(tg);
        doc.add_page(ctx).unwrap();

        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/TG0 Do"));
        assert!(s.contains("/Group <<\n    /S /Transparency\n    /CS /DeviceRGB\n    /I true"));
        assert!(s.contains("/XObject <<\n    /TG0 "));
    }

    #[test]
    fn tiling_pattern_object() {
        let mut doc = Document::new_with(uncompressed_settings()).unwrap();
        let mut cell = doc.new_color_pattern_context(4.0, 4.0);
        cell.set_nonstroke_color(&Color::rgb(0.0, 1.0, 0.0)).unwrap();
        cell.cmd_re(0.0, 0.0, 2.0, 2.0);
        cell.cmd_f();
        let pattern = doc.add_pattern(cell).unwrap();

        let mut ctx = doc.new_page_context(100.0, 100.0);
        ctx.set_nonstroke_color(&Color::Pattern(pattern)).unwrap();
        ctx.cmd_re(0.0, 0.0, 100.0, 100.0);
        ctx.cmd_f();
        doc.add_page(ctx).unwrap();

        let s = text_of(&doc.finish().unwrap());
        assert!(s.contains("/PatternType 1"));
        assert!(s.contains("/XStep 4.000000"));
        assert!(s.contains("/Pattern cs\n/Pat0 scn\n"));
        assert!(s.contains("/Pattern <<\n    /Pat0 "));
    }
}
