//! Extended graphics state dictionaries.

use std::fmt::Write;

use crate::util::fmt_fixed;

/// A line cap style.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineCap {
    /// Squared off at the endpoint.
    Butt,
    /// A semicircle around the endpoint.
    Round,
    /// A square that extends past the endpoint.
    Square,
}

impl LineCap {
    pub(crate) fn to_pdf(self) -> i32 {
        match self {
            LineCap::Butt => 0,
            LineCap::Round => 1,
            LineCap::Square => 2,
        }
    }
}

/// A line join style.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineJoin {
    /// Outer edges extended until they meet.
    Miter,
    /// A circular arc around the join point.
    Round,
    /// The corner is cut off.
    Bevel,
}

impl LineJoin {
    pub(crate) fn to_pdf(self) -> i32 {
        match self {
            LineJoin::Miter => 0,
            LineJoin::Round => 1,
            LineJoin::Bevel => 2,
        }
    }
}

/// A rendering intent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderingIntent {
    /// Colors are scaled relative to the white points.
    RelativeColorimetric,
    /// Colors are reproduced exactly where possible.
    AbsoluteColorimetric,
    /// Saturation is preserved at the expense of accuracy.
    Saturation,
    /// Pleasing reproduction for photographic content.
    Perceptual,
}

impl RenderingIntent {
    pub(crate) fn name(self) -> &'static str {
        match self {
            RenderingIntent::RelativeColorimetric => "RelativeColorimetric",
            RenderingIntent::AbsoluteColorimetric => "AbsoluteColorimetric",
            RenderingIntent::Saturation => "Saturation",
            RenderingIntent::Perceptual => "Perceptual",
        }
    }
}

/// A blend mode.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub(crate) fn name(self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "ColorDodge",
            BlendMode::ColorBurn => "ColorBurn",
            BlendMode::HardLight => "HardLight",
            BlendMode::SoftLight => "SoftLight",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
        }
    }
}

/// An extended graphics state parameter bundle.
///
/// Every field is optional; only set fields are written to the dictionary,
/// everything else keeps its PDF default. Select a registered state in a
/// content stream with the `gs` operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphicsState {
    /// The line width.
    pub line_width: Option<f32>,
    /// The line cap style.
    pub line_cap: Option<LineCap>,
    /// The line join style.
    pub line_join: Option<LineJoin>,
    /// The miter limit.
    pub miter_limit: Option<f32>,
    /// The rendering intent.
    pub rendering_intent: Option<RenderingIntent>,
    /// Stroking overprint.
    pub stroke_overprint: Option<bool>,
    /// Non-stroking overprint.
    pub fill_overprint: Option<bool>,
    /// The overprint mode.
    pub overprint_mode: Option<i32>,
    /// The flatness tolerance.
    pub flatness: Option<f32>,
    /// The smoothness tolerance.
    pub smoothness: Option<f32>,
    /// The blend mode.
    pub blend_mode: Option<BlendMode>,
    /// The stroking alpha constant.
    pub stroke_alpha: Option<f32>,
    /// The non-stroking alpha constant.
    pub fill_alpha: Option<f32>,
    /// Whether the alpha is interpreted as shape rather than opacity.
    pub alpha_is_shape: Option<bool>,
    /// The text knockout flag.
    pub text_knockout: Option<bool>,
}

impl GraphicsState {
    pub(crate) fn to_dict(&self) -> String {
        let mut buf = String::from("<<\n  /Type /ExtGState\n");
        if let Some(lw) = self.line_width {
            let _ = writeln!(buf, "  /LW {}", fmt_fixed(lw));
        }
        if let Some(lc) = self.line_cap {
            let _ = writeln!(buf, "  /LC {}", lc.to_pdf());
        }
        if let Some(lj) = self.line_join {
            let _ = writeln!(buf, "  /LJ {}", lj.to_pdf());
        }
        if let Some(ml) = self.miter_limit {
            let _ = writeln!(buf, "  /ML {}", fmt_fixed(ml));
        }
        if let Some(ri) = self.rendering_intent {
            let _ = writeln!(buf, "  /RenderingIntent /{}", ri.name());
        }
        if let Some(op) = self.stroke_overprint {
            let _ = writeln!(buf, "  /OP {op}");
        }
        if let Some(op) = self.fill_overprint {
            let _ = writeln!(buf, "  /op {op}");
        }
        if let Some(opm) = self.overprint_mode {
            let _ = writeln!(buf, "  /OPM {opm}");
        }
        if let Some(fl) = self.flatness {
            let _ = writeln!(buf, "  /FL {}", fmt_fixed(fl));
        }
        if let Some(sm) = self.smoothness {
            let _ = writeln!(buf, "  /SM {}", fmt_fixed(sm));
        }
        if let Some(bm) = self.blend_mode {
            let _ = writeln!(buf, "  /BM /{}", bm.name());
        }
        if let Some(ca) = self.stroke_alpha {
            let _ = writeln!(buf, "  /CA {}", fmt_fixed(ca));
        }
        if let Some(ca) = self.fill_alpha {
            let _ = writeln!(buf, "  /ca {}", fmt_fixed(ca));
        }
        if let Some(ais) = self.alpha_is_shape {
            let _ = writeln!(buf, "  /AIS {ais}");
        }
        if let Some(tk) = self.text_knockout {
            let _ = writeln!(buf, "  /TK {tk}");
        }
        buf.push_str(">>\n");
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_set_fields_are_written() {
        let gs = GraphicsState {
            fill_alpha: Some(0.5),
            blend_mode: Some(BlendMode::Multiply),
            ..Default::default()
        };
        let dict = gs.to_dict();
        assert_eq!(dict, "<<\n  /Type /ExtGState\n  /BM /Multiply\n  /ca 0.500000\n>>\n");
    }
}
