//! Raster image descriptions.
//!
//! Decoding is outside the scope of this crate; images arrive here as
//! already-decoded pixel data plus metadata, or as raw JPEG file bytes that
//! are passed through behind a `/DCTDecode` filter.

use crate::document::IccColorSpaceId;
use crate::graphics::color::Colorspace;

/// How a viewer should scale the image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ImageInterpolation {
    /// Leave the choice to the viewer.
    #[default]
    Auto,
    /// Do not smooth the image.
    Pixelated,
    /// Smooth the image.
    Smooth,
}

/// Properties of decoded raster data.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    /// The width in pixels.
    pub width: u32,
    /// The height in pixels.
    pub height: u32,
    /// Bits per color component.
    pub pixel_depth: i32,
    /// Bits per alpha sample, if an alpha channel is present.
    pub alpha_depth: i32,
    /// The scaling behavior.
    pub interpolation: ImageInterpolation,
    /// The colorspace of the pixel data.
    pub colorspace: Colorspace,
}

/// A decoded raster image.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// The image properties.
    pub metadata: ImageMetadata,
    /// The pixel data, row major, tightly packed.
    pub pixels: Vec<u8>,
    /// The alpha samples, empty if the image is opaque.
    pub alpha: Vec<u8>,
    /// An ICC profile describing the pixel data, empty if none.
    pub icc_profile: Vec<u8>,
}

/// An undecoded JPEG file for pass-through embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct JpgImage {
    /// The width in pixels.
    pub width: u32,
    /// The height in pixels.
    pub height: u32,
    /// The raw file contents.
    pub data: Vec<u8>,
}

/// The colorspace an image object is tagged with.
#[derive(Debug, Copy, Clone)]
pub(crate) enum ImageColorspace {
    Device(Colorspace),
    Icc(IccColorSpaceId),
}

#[derive(Debug, Clone)]
pub(crate) struct ImageInfo {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) obj: usize,
}
