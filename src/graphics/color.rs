//! Colors and colorspaces.
//!
//! A [`Color`] is a tagged value over every colorspace family the crate can
//! emit. Device colors carry their components directly, the other variants
//! reference a colorspace object registered on the document.

use crate::document::{IccColorSpaceId, LabId, PatternId, SeparationId};
use crate::error::{Error, Result};

/// A device colorspace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Colorspace {
    /// Device RGB with three components.
    DeviceRgb,
    /// Device gray with a single component.
    DeviceGray,
    /// Device CMYK with four components.
    DeviceCmyk,
}

impl Colorspace {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Colorspace::DeviceRgb => "/DeviceRGB",
            Colorspace::DeviceGray => "/DeviceGray",
            Colorspace::DeviceCmyk => "/DeviceCMYK",
        }
    }

    pub(crate) fn num_channels(&self) -> i32 {
        match self {
            Colorspace::DeviceRgb => 3,
            Colorspace::DeviceGray => 1,
            Colorspace::DeviceCmyk => 4,
        }
    }
}

/// An RGB color with components in `0..=1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DeviceRgbColor {
    /// The red component.
    pub r: f32,
    /// The green component.
    pub g: f32,
    /// The blue component.
    pub b: f32,
}

/// A grayscale color with a component in `0..=1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DeviceGrayColor {
    /// The gray component.
    pub v: f32,
}

/// A CMYK color with components in `0..=1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DeviceCmykColor {
    /// The cyan component.
    pub c: f32,
    /// The magenta component.
    pub m: f32,
    /// The yellow component.
    pub y: f32,
    /// The black component.
    pub k: f32,
}

/// A color in an ICC-based colorspace, with one value per profile channel.
#[derive(Debug, Clone, PartialEq)]
pub struct IccColor {
    /// The ICC colorspace the values are expressed in.
    pub id: IccColorSpaceId,
    /// The channel values, in `0..=1`.
    pub values: Vec<f32>,
}

/// A color in a CIE L*a*b* colorspace.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabColor {
    /// The Lab colorspace the values are expressed in.
    pub id: LabId,
    /// Lightness, in `0..=100`.
    pub l: f32,
    /// The a* component.
    pub a: f32,
    /// The b* component.
    pub b: f32,
}

/// A tint of a separation colorant.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SeparationColor {
    /// The separation the tint applies to.
    pub id: SeparationId,
    /// The tint value, in `0..=1`.
    pub value: f32,
}

/// Any color this crate can write into a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// A device RGB color.
    Rgb(DeviceRgbColor),
    /// A device gray color.
    Gray(DeviceGrayColor),
    /// A device CMYK color.
    Cmyk(DeviceCmykColor),
    /// A color in an ICC-based colorspace.
    Icc(IccColor),
    /// A color in a Lab colorspace.
    Lab(LabColor),
    /// A separation tint.
    Separation(SeparationColor),
    /// A pattern fill.
    Pattern(PatternId),
}

impl Color {
    /// A device RGB color.
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color::Rgb(DeviceRgbColor { r, g, b })
    }

    /// A device gray color.
    pub fn gray(v: f32) -> Self {
        Color::Gray(DeviceGrayColor { v })
    }

    /// A device CMYK color.
    pub fn cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        Color::Cmyk(DeviceCmykColor { c, m, y, k })
    }

    /// The device components of the color, if it is a device color.
    pub(crate) fn device_components(&self) -> Option<Vec<f32>> {
        match self {
            Color::Rgb(c) => Some(vec![c.r, c.g, c.b]),
            Color::Gray(c) => Some(vec![c.v]),
            Color::Cmyk(c) => Some(vec![c.c, c.m, c.y, c.k]),
            _ => None,
        }
    }

    /// Whether the color belongs to the given device colorspace.
    pub(crate) fn matches(&self, cs: Colorspace) -> bool {
        matches!(
            (self, cs),
            (Color::Rgb(_), Colorspace::DeviceRgb)
                | (Color::Gray(_), Colorspace::DeviceGray)
                | (Color::Cmyk(_), Colorspace::DeviceCmyk)
        )
    }
}

impl From<DeviceRgbColor> for Color {
    fn from(c: DeviceRgbColor) -> Self {
        Color::Rgb(c)
    }
}

impl From<DeviceGrayColor> for Color {
    fn from(c: DeviceGrayColor) -> Self {
        Color::Gray(c)
    }
}

impl From<DeviceCmykColor> for Color {
    fn from(c: DeviceCmykColor) -> Self {
        Color::Cmyk(c)
    }
}

/// Fail with `ColorOutOfRange` unless the value lies in `0..=1`.
pub(crate) fn check_unit(v: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&v) {
        return Err(Error::ColorOutOfRange);
    }
    Ok(())
}

pub(crate) fn check_units(values: &[f32]) -> Result<()> {
    for v in values {
        check_unit(*v)?;
    }
    Ok(())
}

/// The parameters of a Lab colorspace.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabColorSpace {
    /// The white point X coordinate.
    pub xw: f32,
    /// The white point Y coordinate.
    pub yw: f32,
    /// The white point Z coordinate.
    pub zw: f32,
    /// The lower bound of the a* range.
    pub amin: f32,
    /// The upper bound of the a* range.
    pub amax: f32,
    /// The lower bound of the b* range.
    pub bmin: f32,
    /// The upper bound of the b* range.
    pub bmax: f32,
}
