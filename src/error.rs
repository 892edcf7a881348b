//! Error handling.
//!
//! Every fallible operation in this crate reports one of the reasons below.
//! Errors are surfaced to the caller unchanged; nothing is caught internally,
//! and no output is produced for a document that failed to finalize.

use std::fmt;

/// A result produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The reason an operation failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// A color component lies outside the `0..=1` range.
    ColorOutOfRange,
    /// A color does not match the colorspace it is used with.
    ColorspaceMismatch,
    /// The document configuration requires an output ICC profile,
    /// but none was provided.
    OutputProfileMissing,
    /// An output intent subtype was requested without an output
    /// condition identifier.
    MissingIntentIdentifier,
    /// The annotation or form widget has already been attached to a page.
    AnnotationReuse,
    /// The structure item has already been used on a page.
    StructureReuse,
    /// The role name has already been registered in the role map.
    RoleAlreadyDefined,
    /// A name that must not start with a slash does.
    SlashStart,
    /// Marked content blocks may not nest within a single context.
    NestedBMC,
    /// An end operator does not match the innermost open draw state.
    DrawStateEndMismatch,
    /// A context was finalized while marked content was still open.
    UnclosedMarkedContent,
    /// The draw context has the wrong kind for this operation.
    InvalidDrawContextType,
    /// The object belongs to a different document.
    IncorrectDocumentForObject,
    /// The font has no glyph for the requested codepoint.
    MissingGlyph,
    /// The data has a format this crate does not support.
    UnsupportedFormat,
    /// The font data could not be parsed.
    FreeTypeError,
    /// An image has a zero or negative dimension.
    InvalidImageSize,
    /// An image carries no pixel data.
    MissingPixels,
    /// An image may be a mask or carry an alpha channel, not both.
    MaskAndAlpha,
    /// A CMYK operation was requested without a CMYK output profile.
    NoCmykProfile,
    /// The annotation is missing its rectangle.
    AnnotationMissingRect,
    /// An id is out of range for the registry it indexes.
    IndexOutOfBounds,
    /// An internal state that should be impossible was reached.
    Unreachable,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::ColorOutOfRange => "color component out of range",
            Error::ColorspaceMismatch => "color does not match the colorspace",
            Error::OutputProfileMissing => "output ICC profile missing",
            Error::MissingIntentIdentifier => "output intent condition identifier missing",
            Error::AnnotationReuse => "annotation already attached to a page",
            Error::StructureReuse => "structure item already used on a page",
            Error::RoleAlreadyDefined => "role already defined in role map",
            Error::SlashStart => "name must not start with a slash",
            Error::NestedBMC => "marked content blocks may not nest",
            Error::DrawStateEndMismatch => "mismatched draw state end",
            Error::UnclosedMarkedContent => "marked content left open",
            Error::InvalidDrawContextType => "wrong draw context type",
            Error::IncorrectDocumentForObject => "object belongs to a different document",
            Error::MissingGlyph => "font has no glyph for codepoint",
            Error::UnsupportedFormat => "unsupported data format",
            Error::FreeTypeError => "font data could not be parsed",
            Error::InvalidImageSize => "invalid image size",
            Error::MissingPixels => "image has no pixel data",
            Error::MaskAndAlpha => "image cannot be both mask and alpha-carrying",
            Error::NoCmykProfile => "no CMYK output profile available",
            Error::AnnotationMissingRect => "annotation is missing its rectangle",
            Error::IndexOutOfBounds => "id out of range",
            Error::Unreachable => "internal error",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}
