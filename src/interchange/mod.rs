//! Interchange features: outlines, tagging, embedded files and navigation.

pub(crate) mod embed;
pub mod navigation;
pub(crate) mod outline;
pub mod tagging;
