//! A parsed font face.
//!
//! The face is validated once when loaded; afterwards the crate only needs
//! the cached metrics plus codepoint and advance lookups, for which the face
//! is re-read on demand.

use skrifa::instance::{LocationRef, Size};
use skrifa::raw::types::NameId;
use skrifa::raw::TableProvider;
use skrifa::{FontRef, GlyphId, MetadataProvider};

use crate::error::{Error, Result};
use crate::geom::Rect;
use crate::Data;

#[derive(Debug)]
pub(crate) struct Font {
    data: Data,
    index: u32,
    info: FontInfo,
}

/// Metrics extracted from the face at load time.
#[derive(Debug)]
pub(crate) struct FontInfo {
    pub(crate) units_per_em: u16,
    pub(crate) ascent: f32,
    pub(crate) descent: f32,
    pub(crate) cap_height: Option<f32>,
    pub(crate) italic_angle: f32,
    pub(crate) weight: f32,
    pub(crate) is_monospaced: bool,
    pub(crate) global_bbox: Rect,
    pub(crate) postscript_name: Option<String>,
}

impl FontInfo {
    fn new(data: &[u8], index: u32) -> Result<Self> {
        let font_ref = FontRef::from_index(data, index).map_err(|_| Error::FreeTypeError)?;

        // Only TrueType outlines can be embedded as subset programs.
        if font_ref.glyf().is_err() {
            return Err(Error::UnsupportedFormat);
        }

        let metrics = font_ref.metrics(Size::unscaled(), LocationRef::default());
        let os_2 = font_ref.os2().ok();
        let ascent = os_2
            .as_ref()
            .map(|s| s.s_typo_ascender() as f32)
            .unwrap_or(metrics.ascent);
        let descent = os_2
            .as_ref()
            .map(|s| s.s_typo_descender() as f32)
            .unwrap_or(metrics.descent);
        let units_per_em = metrics.units_per_em;

        let global_bbox = metrics
            .bounds
            .and_then(|b| Rect::from_ltrb(b.x_min, b.y_min, b.x_max, b.y_max))
            .unwrap_or(
                Rect::from_xywh(0.0, 0.0, units_per_em as f32, units_per_em as f32)
                    .ok_or(Error::FreeTypeError)?,
            );

        let postscript_name = font_ref.name().ok().and_then(|name| {
            name.name_record().iter().find_map(|n| {
                if n.name_id.get() == NameId::POSTSCRIPT_NAME {
                    if let Ok(string) = n.string(name.string_data()) {
                        return Some(string.to_string());
                    }
                }

                None
            })
        });

        Ok(FontInfo {
            units_per_em,
            ascent,
            descent,
            cap_height: metrics.cap_height,
            italic_angle: metrics.italic_angle,
            weight: font_ref.attributes().weight.value(),
            is_monospaced: metrics.is_monospace,
            global_bbox,
            postscript_name,
        })
    }
}

impl Font {
    pub(crate) fn new(data: Data, index: u32) -> Result<Self> {
        let info = FontInfo::new(data.as_ref(), index)?;
        Ok(Font { data, index, info })
    }

    pub(crate) fn info(&self) -> &FontInfo {
        &self.info
    }

    pub(crate) fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub(crate) fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn units_per_em(&self) -> f32 {
        self.info.units_per_em as f32
    }

    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(self.data.as_ref(), self.index).ok()
    }

    /// The glyph for a codepoint, if the face maps it.
    pub(crate) fn glyph_index(&self, codepoint: u32) -> Option<GlyphId> {
        let font_ref = self.font_ref()?;
        font_ref.charmap().map(codepoint)
    }

    /// The advance width of a glyph in font units.
    pub(crate) fn advance_width(&self, glyph_id: GlyphId) -> Option<f32> {
        let font_ref = self.font_ref()?;
        font_ref
            .glyph_metrics(Size::unscaled(), LocationRef::default())
            .advance_width(glyph_id)
    }
}
