//! Shadings and the interpolation functions backing them.
//!
//! Axial and radial shadings are plain dictionaries referencing a type 2
//! function. Free-form Gouraud shadings and Coons patch meshes carry a
//! binary vertex stream: per vertex one flag byte, two 32-bit big-endian
//! coordinates expressed as fractions of the declared bounding box, and one
//! 16-bit big-endian value per color channel.

use std::fmt::Write;

use crate::document::FunctionId;
use crate::error::{Error, Result};
use crate::geom::Point;
use crate::graphics::color::{check_unit, Color, Colorspace};
use crate::util::fmt_fixed;

/// An exponential interpolation function between two colors.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType2 {
    /// The input domain of the function.
    pub domain: [f32; 2],
    /// The color at the start of the domain.
    pub c0: Color,
    /// The color at the end of the domain.
    pub c1: Color,
    /// The interpolation exponent.
    pub n: f32,
}

impl FunctionType2 {
    pub(crate) fn to_dict(&self) -> Result<String> {
        let (c0, c1) = match (self.c0.device_components(), self.c1.device_components()) {
            (Some(c0), Some(c1)) => (c0, c1),
            _ => return Err(Error::UnsupportedFormat),
        };
        if c0.len() != c1.len() {
            return Err(Error::ColorspaceMismatch);
        }

        let mut buf = format!("<<\n  /FunctionType 2\n  /N {}\n", self.n);
        buf.push_str("  /Domain [ ");
        for d in self.domain {
            let _ = write!(buf, "{d} ");
        }
        buf.push_str("]\n");
        buf.push_str("  /C0 [ ");
        for c in &c0 {
            let _ = write!(buf, "{c} ");
        }
        buf.push_str("]\n");
        buf.push_str("  /C1 [ ");
        for c in &c1 {
            let _ = write!(buf, "{c} ");
        }
        buf.push_str("]\n>>\n");
        Ok(buf)
    }
}

/// An axial (type 2) shading.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingType2 {
    /// The colorspace of the shading.
    pub colorspace: Colorspace,
    /// The x coordinate of the starting point.
    pub x0: f32,
    /// The y coordinate of the starting point.
    pub y0: f32,
    /// The x coordinate of the ending point.
    pub x1: f32,
    /// The y coordinate of the ending point.
    pub y1: f32,
    /// The function mapping the axis to colors.
    pub function: FunctionId,
    /// Whether to extend beyond the starting point.
    pub extend0: bool,
    /// Whether to extend beyond the ending point.
    pub extend1: bool,
}

impl ShadingType2 {
    pub(crate) fn to_dict(&self) -> String {
        format!(
            "<<\n  /ShadingType 2\n  /ColorSpace {}\n  /Coords [ {} {} {} {} ]\n  \
             /Function {} 0 R\n  /Extend [ {} {} ]\n>>\n",
            self.colorspace.name(),
            fmt_fixed(self.x0),
            fmt_fixed(self.y0),
            fmt_fixed(self.x1),
            fmt_fixed(self.y1),
            self.function.0,
            self.extend0,
            self.extend1,
        )
    }
}

/// A radial (type 3) shading.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingType3 {
    /// The colorspace of the shading.
    pub colorspace: Colorspace,
    /// The x coordinate of the starting circle.
    pub x0: f32,
    /// The y coordinate of the starting circle.
    pub y0: f32,
    /// The radius of the starting circle.
    pub r0: f32,
    /// The x coordinate of the ending circle.
    pub x1: f32,
    /// The y coordinate of the ending circle.
    pub y1: f32,
    /// The radius of the ending circle.
    pub r1: f32,
    /// The function mapping the axis to colors.
    pub function: FunctionId,
    /// Whether to extend beyond the starting circle.
    pub extend0: bool,
    /// Whether to extend beyond the ending circle.
    pub extend1: bool,
}

impl ShadingType3 {
    pub(crate) fn to_dict(&self) -> String {
        format!(
            "<<\n  /ShadingType 3\n  /ColorSpace {}\n  /Coords [ {} {} {} {} {} {} ]\n  \
             /Function {} 0 R\n  /Extend [ {} {} ]\n>>\n",
            self.colorspace.name(),
            fmt_fixed(self.x0),
            fmt_fixed(self.y0),
            fmt_fixed(self.r0),
            fmt_fixed(self.x1),
            fmt_fixed(self.y1),
            fmt_fixed(self.r1),
            self.function.0,
            self.extend0,
            self.extend1,
        )
    }
}

/// A colored vertex of a free-form shading.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingPoint {
    /// The vertex location.
    pub p: Point,
    /// The vertex color. Must match the colorspace of the shading.
    pub c: Color,
}

/// One vertex record of a type 4 shading, with its edge flag.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexElement {
    /// The edge flag, `0..=2`.
    pub flag: u8,
    /// The vertex.
    pub sp: ShadingPoint,
}

/// A free-form Gouraud triangle mesh (type 4) shading.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingType4 {
    /// The colorspace of the shading.
    pub colorspace: Colorspace,
    /// The vertex records.
    pub elements: Vec<VertexElement>,
    /// The smallest x coordinate of the mesh.
    pub minx: f32,
    /// The smallest y coordinate of the mesh.
    pub miny: f32,
    /// The largest x coordinate of the mesh.
    pub maxx: f32,
    /// The largest y coordinate of the mesh.
    pub maxy: f32,
}

/// A full Coons patch with 12 control points and 4 corner colors.
#[derive(Debug, Clone, PartialEq)]
pub struct FullCoonsPatch {
    /// The control points of the patch boundary.
    pub p: [Point; 12],
    /// The corner colors. Must match the colorspace of the shading.
    pub c: [Color; 4],
}

/// A continuation patch sharing an edge with the previous one.
///
/// Continuation patches are part of the mesh format but not implemented;
/// shadings containing one are rejected with [`Error::UnsupportedFormat`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationCoonsPatch {
    /// The edge flag, `1..=3`.
    pub flag: u8,
    /// The eight new control points.
    pub p: [Point; 8],
    /// The two new corner colors.
    pub c: [Color; 2],
}

/// One patch of a type 6 shading.
#[derive(Debug, Clone, PartialEq)]
pub enum CoonsPatch {
    /// A standalone patch.
    Full(FullCoonsPatch),
    /// A patch continuing the previous one.
    Continuation(ContinuationCoonsPatch),
}

/// A Coons patch mesh (type 6) shading.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingType6 {
    /// The colorspace of the shading.
    pub colorspace: Colorspace,
    /// The patches.
    pub elements: Vec<CoonsPatch>,
    /// The smallest x coordinate of the mesh.
    pub minx: f32,
    /// The smallest y coordinate of the mesh.
    pub miny: f32,
    /// The largest x coordinate of the mesh.
    pub maxx: f32,
    /// The largest y coordinate of the mesh.
    pub maxy: f32,
}

/// Any shading accepted by [`Document::add_shading`].
///
/// [`Document::add_shading`]: crate::document::Document::add_shading
#[derive(Debug, Clone, PartialEq)]
pub enum Shading {
    /// An axial shading.
    Axial(ShadingType2),
    /// A radial shading.
    Radial(ShadingType3),
    /// A free-form Gouraud triangle mesh.
    FreeForm(ShadingType4),
    /// A Coons patch mesh.
    Coons(ShadingType6),
}

impl From<ShadingType2> for Shading {
    fn from(s: ShadingType2) -> Self {
        Shading::Axial(s)
    }
}

impl From<ShadingType3> for Shading {
    fn from(s: ShadingType3) -> Self {
        Shading::Radial(s)
    }
}

impl From<ShadingType4> for Shading {
    fn from(s: ShadingType4) -> Self {
        Shading::FreeForm(s)
    }
}

impl From<ShadingType6> for Shading {
    fn from(s: ShadingType6) -> Self {
        Shading::Coons(s)
    }
}

fn append_fixed_u32(buf: &mut Vec<u8>, v: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&v) {
        return Err(Error::ColorOutOfRange);
    }
    let scaled = (u32::MAX as f64 * v) as u32;
    buf.extend_from_slice(&scaled.to_be_bytes());
    Ok(())
}

fn append_fixed_u16(buf: &mut Vec<u8>, v: f32) -> Result<()> {
    check_unit(v)?;
    let scaled = (u16::MAX as f32 * v) as u16;
    buf.extend_from_slice(&scaled.to_be_bytes());
    Ok(())
}

fn append_point(buf: &mut Vec<u8>, p: Point, shade_bounds: (f32, f32, f32, f32)) -> Result<()> {
    let (minx, miny, maxx, maxy) = shade_bounds;
    let xratio = (p.x as f64 - minx as f64) / (maxx as f64 - minx as f64);
    let yratio = (p.y as f64 - miny as f64) / (maxy as f64 - miny as f64);
    append_fixed_u32(buf, xratio)?;
    append_fixed_u32(buf, yratio)
}

fn append_color(buf: &mut Vec<u8>, c: &Color, cs: Colorspace) -> Result<()> {
    if !c.matches(cs) {
        return Err(Error::ColorspaceMismatch);
    }
    // Device colors always have components here.
    let components = c.device_components().ok_or(Error::Unreachable)?;
    for component in components {
        append_fixed_u16(buf, component)?;
    }
    Ok(())
}

pub(crate) fn serialize_shade4(shade: &ShadingType4) -> Result<Vec<u8>> {
    let bounds = (shade.minx, shade.miny, shade.maxx, shade.maxy);
    let mut buf = Vec::new();
    for e in &shade.elements {
        debug_assert!(e.flag < 3);
        buf.push(e.flag);
        append_point(&mut buf, e.sp.p, bounds)?;
        append_color(&mut buf, &e.sp.c, shade.colorspace)?;
    }
    Ok(buf)
}

pub(crate) fn serialize_shade6(shade: &ShadingType6) -> Result<Vec<u8>> {
    let bounds = (shade.minx, shade.miny, shade.maxx, shade.maxy);
    let mut buf = Vec::new();
    for patch in &shade.elements {
        let full = match patch {
            CoonsPatch::Full(full) => full,
            CoonsPatch::Continuation(_) => return Err(Error::UnsupportedFormat),
        };
        buf.push(0);
        for p in &full.p {
            append_point(&mut buf, *p, bounds)?;
        }
        for c in &full.c {
            append_color(&mut buf, c, shade.colorspace)?;
        }
    }
    Ok(buf)
}

fn decode_array(cs: Colorspace, minx: f32, miny: f32, maxx: f32, maxy: f32) -> String {
    let mut buf = format!(
        "  /Decode [\n    {} {}\n    {} {}\n",
        fmt_fixed(minx),
        fmt_fixed(maxx),
        fmt_fixed(miny),
        fmt_fixed(maxy),
    );
    for _ in 0..cs.num_channels() {
        buf.push_str("    0 1\n");
    }
    buf.push_str("  ]\n");
    buf
}

pub(crate) fn mesh_shading_dict(
    shading_type: i32,
    cs: Colorspace,
    stream_len: usize,
    minx: f32,
    miny: f32,
    maxx: f32,
    maxy: f32,
) -> String {
    format!(
        "<<\n  /ShadingType {}\n  /ColorSpace {}\n  /BitsPerCoordinate 32\n  \
         /BitsPerComponent 16\n  /BitsPerFlag 8\n  /Length {}\n{}>>\n",
        shading_type,
        cs.name(),
        stream_len,
        decode_array(cs, minx, miny, maxx, maxy),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_shade(elements: Vec<VertexElement>) -> ShadingType4 {
        ShadingType4 {
            colorspace: Colorspace::DeviceRgb,
            elements,
            minx: 0.0,
            miny: 0.0,
            maxx: 10.0,
            maxy: 10.0,
        }
    }

    #[test]
    fn shade4_vertex_bytes() {
        let shade = rgb_shade(vec![VertexElement {
            flag: 0,
            sp: ShadingPoint {
                p: Point::from_xy(0.0, 10.0),
                c: Color::rgb(1.0, 0.0, 0.0),
            },
        }]);
        let bytes = serialize_shade4(&shade).unwrap();
        // Flag, x ratio 0, y ratio 1, then r/g/b as 16-bit values.
        assert_eq!(
            bytes,
            vec![0, 0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]
        );
    }

    #[test]
    fn shade4_rejects_wrong_colorspace() {
        let shade = rgb_shade(vec![VertexElement {
            flag: 0,
            sp: ShadingPoint {
                p: Point::from_xy(5.0, 5.0),
                c: Color::gray(0.5),
            },
        }]);
        assert_eq!(serialize_shade4(&shade), Err(Error::ColorspaceMismatch));
    }

    #[test]
    fn shade6_rejects_continuation_patches() {
        let shade = ShadingType6 {
            colorspace: Colorspace::DeviceGray,
            elements: vec![CoonsPatch::Continuation(ContinuationCoonsPatch {
                flag: 1,
                p: [Point::from_xy(0.0, 0.0); 8],
                c: [Color::gray(0.0), Color::gray(1.0)],
            })],
            minx: 0.0,
            miny: 0.0,
            maxx: 1.0,
            maxy: 1.0,
        };
        assert_eq!(serialize_shade6(&shade), Err(Error::UnsupportedFormat));
    }

    #[test]
    fn function_colorspace_mismatch() {
        let func = FunctionType2 {
            domain: [0.0, 1.0],
            c0: Color::rgb(0.0, 0.0, 0.0),
            c1: Color::gray(1.0),
            n: 1.0,
        };
        assert_eq!(func.to_dict(), Err(Error::ColorspaceMismatch));
    }
}
